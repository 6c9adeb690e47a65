//! Output formatters for similarity reports.

use std::io::Write;

use serde::Serialize;

use crate::core::Result;
use crate::report::SimilarityReport;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default)]
pub enum Format {
    Json,
    #[default]
    Text,
}

impl Format {
    /// Write any serializable payload (reports, file listings).
    pub fn write_value<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, data)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write a similarity report in the selected format.
    pub fn write_report<W: Write>(&self, report: &SimilarityReport, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => self.write_value(report, writer),
            Format::Text => write_text(report, writer),
        }
    }
}

fn write_text<W: Write>(report: &SimilarityReport, writer: &mut W) -> Result<()> {
    let s = &report.summary;
    writeln!(
        writer,
        "Analyzed {} files ({} lines) in {} ms",
        s.files_analyzed, s.total_lines, s.analysis_time_ms
    )?;
    if s.files_skipped > 0 {
        writeln!(writer, "Skipped {} unreadable files", s.files_skipped)?;
    }
    writeln!(
        writer,
        "Clone pairs: {}   Estimated duplication: {}",
        s.clone_pairs_found, s.estimated_duplication
    )?;

    if !report.metrics.by_type.is_empty() {
        let counts: Vec<String> = report
            .metrics
            .by_type
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        writeln!(writer, "By type: {}", counts.join(", "))?;
    }

    for clone in &report.clones {
        writeln!(writer)?;
        writeln!(
            writer,
            "#{} [{}] similarity {:.3}",
            clone.id, clone.clone_type, clone.similarity
        )?;
        for loc in &clone.locations {
            writeln!(
                writer,
                "  {}:{}-{}",
                loc.file, loc.start_line, loc.end_line
            )?;
        }
        writeln!(writer, "  {}", clone.recommendation)?;
    }

    if !report.hotspots.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Hotspots:")?;
        for h in &report.hotspots {
            writeln!(
                writer,
                "  {:.1}%  {} ({} clones, {}/{} lines)",
                h.duplication_score * 100.0,
                h.file,
                h.clone_count,
                h.duplicated_lines,
                h.total_lines
            )?;
        }
    }

    Ok(())
}
