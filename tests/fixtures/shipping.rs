fn tally_shipments(shipments: &[Shipment]) -> Digest {
    let mut sum = 0u32;
    let mut held = Vec::new();
    for shipment in shipments {
        sum += shipment.weight * shipment.count;
        if shipment.weight > 100 {
            held.push(shipment.code);
        }
        match shipment.state {
            State::Ready => sum += 1,
            State::Done => sum -= 1,
            _ => {}
        }
    }
    Digest {
        sum,
        held_count: held.len() as u32,
        mean: sum / shipments.len().max(1) as u32,
    }
}
