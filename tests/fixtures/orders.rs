fn summarize_orders(orders: &[Order]) -> Summary {
    let mut total = 0u32;
    let mut flagged = Vec::new();
    for order in orders {
        total += order.amount * order.quantity;
        if order.amount > 100 {
            flagged.push(order.id);
        }
        match order.status {
            Status::Open => total += 1,
            Status::Closed => total -= 1,
            _ => {}
        }
    }
    Summary {
        total,
        flagged_count: flagged.len() as u32,
        average: total / orders.len().max(1) as u32,
    }
}
