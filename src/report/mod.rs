//! Similarity report assembly.
//!
//! Pure data assembly over the matcher's output: no matching logic lives
//! here. A report is created fresh per request and never mutated after it
//! is returned. Every text field is valid UTF-8 by construction (file
//! content is decoded lossily at load), so serialization cannot fail on
//! malformed input.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{FileId, SourceFile};
use crate::engine::{CloneRegion, CloneType};
use crate::lexer::Token;

/// Lines shown in a snippet preview.
const SNIPPET_LINES: usize = 3;

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub summary: Summary,
    pub clones: Vec<ClonePair>,
    pub hotspots: Vec<Hotspot>,
    pub metrics: Metrics,
    pub timing: Timing,
    pub performance: Performance,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub total_lines: usize,
    pub clone_pairs_found: usize,
    /// Whole-corpus duplication estimate, e.g. "12.5%".
    pub estimated_duplication: String,
    pub analysis_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonePair {
    pub id: usize,
    #[serde(rename = "type")]
    pub clone_type: CloneType,
    pub similarity: f64,
    pub locations: Vec<Location>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub snippet_preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub file: String,
    pub duplication_score: f64,
    pub clone_count: usize,
    pub duplicated_lines: usize,
    pub total_lines: usize,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub by_type: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timing {
    pub tokenize_ms: u64,
    pub hash_ms: u64,
    pub match_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Performance {
    pub loc_per_second: f64,
    pub tokens_per_second: f64,
    pub files_per_second: f64,
    pub total_tokens: usize,
    pub thread_count: usize,
    pub parallel_enabled: bool,
}

/// Wall-clock phase durations measured by the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub tokenize: Duration,
    pub hash: Duration,
    pub matching: Duration,
    pub total: Duration,
}

/// Assemble the report for one analysis run.
pub fn build_report(
    files: &[SourceFile],
    streams: &[&[Token]],
    regions: &[CloneRegion],
    files_skipped: usize,
    timings: &PhaseTimings,
    thread_count: usize,
) -> SimilarityReport {
    let clones: Vec<ClonePair> = regions
        .iter()
        .enumerate()
        .map(|(i, region)| to_clone_pair(i + 1, region, files, streams))
        .collect();

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_language: BTreeMap<String, usize> = BTreeMap::new();
    for region in regions {
        *by_type.entry(region.clone_type.as_str().to_string()).or_default() += 1;
        for file in [region.file_a, region.file_b] {
            let lang = files[file as usize].language.display_name();
            *by_language.entry(lang.to_string()).or_default() += 1;
        }
    }

    let hotspots = build_hotspots(files, streams, regions);
    let duplicated_total: usize = hotspots.iter().map(|h| h.duplicated_lines).sum();
    let total_lines: usize = files.iter().map(SourceFile::total_lines).sum();
    let total_tokens: usize = streams.iter().map(|s| s.len()).sum();

    let percent = if total_lines > 0 {
        duplicated_total as f64 / total_lines as f64 * 100.0
    } else {
        0.0
    };

    SimilarityReport {
        summary: Summary {
            files_analyzed: files.len(),
            files_skipped,
            total_lines,
            clone_pairs_found: regions.len(),
            estimated_duplication: format!("{percent:.1}%"),
            analysis_time_ms: timings.total.as_millis() as u64,
        },
        clones,
        hotspots,
        metrics: Metrics {
            by_type,
            by_language,
        },
        timing: Timing {
            tokenize_ms: timings.tokenize.as_millis() as u64,
            hash_ms: timings.hash.as_millis() as u64,
            match_ms: timings.matching.as_millis() as u64,
            total_ms: timings.total.as_millis() as u64,
        },
        performance: Performance {
            loc_per_second: rate(total_lines, timings.total),
            tokens_per_second: rate(total_tokens, timings.tokenize),
            files_per_second: rate(files.len(), timings.total),
            total_tokens,
            thread_count,
            parallel_enabled: thread_count > 1,
        },
    }
}

fn rate(count: usize, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn to_clone_pair(
    id: usize,
    region: &CloneRegion,
    files: &[SourceFile],
    streams: &[&[Token]],
) -> ClonePair {
    let location = |file: FileId, start: u32, end: u32| {
        let stream = streams[file as usize];
        let source = &files[file as usize];
        let start_line = stream[start as usize].line;
        let end_line = stream[end as usize - 1].line;
        Location {
            file: source.path.to_string_lossy().into_owned(),
            start_line,
            end_line,
            snippet_preview: source.snippet(start_line, end_line, SNIPPET_LINES),
        }
    };

    ClonePair {
        id,
        clone_type: region.clone_type,
        similarity: (region.similarity * 1000.0).round() / 1000.0,
        locations: vec![
            location(region.file_a, region.start_a, region.end_a),
            location(region.file_b, region.start_b, region.end_b),
        ],
        recommendation: clone_recommendation(region.clone_type).to_string(),
    }
}

fn clone_recommendation(clone_type: CloneType) -> &'static str {
    match clone_type {
        CloneType::Type1 => "Identical code; extract into a shared function or module.",
        CloneType::Type2 => {
            "Same structure with renamed identifiers; consider a shared parameterized helper."
        }
        CloneType::Type3 => {
            "Near-duplicate with small edits; align the variants and factor out the common core."
        }
    }
}

fn hotspot_recommendation(score: f64) -> &'static str {
    if score >= 0.5 {
        "Over half of this file participates in clones; prioritize refactoring."
    } else if score >= 0.2 {
        "Significant duplication; schedule a cleanup pass."
    } else {
        "Minor duplication; monitor."
    }
}

fn build_hotspots(
    files: &[SourceFile],
    streams: &[&[Token]],
    regions: &[CloneRegion],
) -> Vec<Hotspot> {
    // Per file: line intervals touched by clones, plus touch count.
    let mut intervals: HashMap<FileId, Vec<(u32, u32)>> = HashMap::new();
    let mut counts: HashMap<FileId, usize> = HashMap::new();

    for region in regions {
        for (file, start, end) in [
            (region.file_a, region.start_a, region.end_a),
            (region.file_b, region.start_b, region.end_b),
        ] {
            let stream = streams[file as usize];
            let start_line = stream[start as usize].line;
            let end_line = stream[end as usize - 1].line;
            intervals.entry(file).or_default().push((start_line, end_line));
            *counts.entry(file).or_default() += 1;
        }
    }

    let mut hotspots: Vec<Hotspot> = intervals
        .into_iter()
        .map(|(file, mut ranges)| {
            let source = &files[file as usize];
            let total = source.total_lines();
            // Union, not sum: overlapping clones never double-count a line.
            let duplicated = union_line_count(&mut ranges).min(total);
            let score = if total > 0 {
                (duplicated as f64 / total as f64).clamp(0.0, 1.0)
            } else {
                0.0
            };
            Hotspot {
                file: source.path.to_string_lossy().into_owned(),
                duplication_score: (score * 1000.0).round() / 1000.0,
                clone_count: counts[&file],
                duplicated_lines: duplicated,
                total_lines: total,
                recommendation: hotspot_recommendation(score).to_string(),
            }
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.duplication_score
            .partial_cmp(&a.duplication_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.file.cmp(&b.file))
    });
    hotspots
}

/// Count distinct lines covered by a set of inclusive line intervals.
fn union_line_count(ranges: &mut [(u32, u32)]) -> usize {
    if ranges.is_empty() {
        return 0;
    }
    ranges.sort_unstable();
    let mut covered = 0usize;
    let (mut lo, mut hi) = ranges[0];
    for &(start, end) in ranges[1..].iter() {
        if start <= hi + 1 {
            hi = hi.max(end);
        } else {
            covered += (hi - lo + 1) as usize;
            (lo, hi) = (start, end);
        }
    }
    covered += (hi - lo + 1) as usize;
    covered
}

/// An empty report for a corpus with no matching files. Not an error.
pub fn empty_report(files_skipped: usize, timings: &PhaseTimings, thread_count: usize) -> SimilarityReport {
    build_report(&[], &[], &[], files_skipped, timings, thread_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use crate::lexer::for_language;

    #[test]
    fn test_union_line_count_overlap() {
        let mut ranges = vec![(1, 10), (5, 15), (20, 25)];
        assert_eq!(union_line_count(&mut ranges), 21);
    }

    #[test]
    fn test_union_line_count_adjacent() {
        let mut ranges = vec![(1, 5), (6, 10)];
        assert_eq!(union_line_count(&mut ranges), 10);
    }

    #[test]
    fn test_union_line_count_nested() {
        let mut ranges = vec![(1, 20), (5, 10), (7, 8)];
        assert_eq!(union_line_count(&mut ranges), 20);
    }

    #[test]
    fn test_empty_report_shape() {
        let report = empty_report(0, &PhaseTimings::default(), 4);
        assert_eq!(report.summary.files_analyzed, 0);
        assert_eq!(report.summary.clone_pairs_found, 0);
        assert_eq!(report.summary.estimated_duplication, "0.0%");
        assert!(report.clones.is_empty());
        assert!(report.hotspots.is_empty());
        assert_eq!(report.performance.files_per_second, 0.0);
    }

    #[test]
    fn test_hotspot_score_bounds() {
        let text = "fn a() {\n    let x = 1;\n}\n";
        let file = SourceFile::from_text(0, "a.rs", Language::Rust, text.to_string());
        let stream = for_language(Language::Rust).tokenize(text);
        let n = stream.len() as u32;

        // Two fully-overlapping regions over the whole file: union must not
        // exceed the file's line count and the score must stay <= 1.
        let region = CloneRegion {
            file_a: 0,
            start_a: 0,
            end_a: n,
            file_b: 0,
            start_b: 0,
            end_b: n,
            clone_type: CloneType::Type1,
            similarity: 1.0,
        };
        let streams = vec![stream.as_slice()];
        let hotspots = build_hotspots(
            std::slice::from_ref(&file),
            &streams,
            &[region, region],
        );
        assert_eq!(hotspots.len(), 1);
        let h = &hotspots[0];
        assert!(h.duplicated_lines <= h.total_lines);
        assert!((0.0..=1.0).contains(&h.duplication_score));
        assert_eq!(h.clone_count, 4);
    }

    #[test]
    fn test_report_serializes() {
        let report = empty_report(2, &PhaseTimings::default(), 1);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"files_skipped\":2"));
        assert!(json.contains("\"estimated_duplication\":\"0.0%\""));
        assert!(!json.contains("parallel_enabled\":true"));
    }
}
