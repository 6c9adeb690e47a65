//! Match finding, clone extension, and classification.
//!
//! Collision buckets from the read-only index seed candidate pairs. Each
//! candidate is verified token-by-token (hash equality is only a hint),
//! extended greedily in both directions, deduplicated to its maximal
//! region, optionally gap-merged into Type-3 regions, and classified.
//!
//! Buckets are independent, so seeding runs in parallel over bucket
//! partitions; dedup, gap merging, and classification happen in one final
//! serial pass so the reported set never depends on bucket iteration order
//! or thread count.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::FileId;
use crate::lexer::Token;

use super::index::{HashIndex, Occurrence};

/// Clone classification by degree of modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloneType {
    /// Identical code, identifiers included.
    #[serde(rename = "type-1")]
    Type1,
    /// Identical structure, renamed identifiers or changed literals.
    #[serde(rename = "type-2")]
    Type2,
    /// Near-duplicate: exact runs bridged across small token gaps.
    #[serde(rename = "type-3")]
    Type3,
}

impl CloneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type1 => "type-1",
            Self::Type2 => "type-2",
            Self::Type3 => "type-3",
        }
    }
}

impl std::fmt::Display for CloneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matching thresholds.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Sliding-window width in tokens.
    pub window: usize,
    /// Noise floor: regions spanning fewer tokens are dropped.
    pub min_tokens: usize,
    /// Maximum unmatched tokens bridged per side when gap-merging.
    pub max_gap: usize,
    /// Minimum similarity for an accepted Type-3 merge.
    pub min_similarity: f64,
    /// Whether Type-3 detection is enabled.
    pub type3: bool,
}

/// A classified clone region, in token coordinates. Location order is
/// canonical: (file_a, start_a) <= (file_b, start_b).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloneRegion {
    pub file_a: FileId,
    pub start_a: u32,
    pub end_a: u32,
    pub file_b: FileId,
    pub start_b: u32,
    pub end_b: u32,
    pub clone_type: CloneType,
    pub similarity: f64,
}

/// A maximal exactly-matched run, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Run {
    file_a: FileId,
    start_a: u32,
    end_a: u32,
    file_b: FileId,
    start_b: u32,
    end_b: u32,
}

impl Run {
    fn len(&self) -> u32 {
        self.end_a - self.start_a
    }
}

/// A region under gap-merge construction.
#[derive(Debug, Clone, Copy)]
struct Region {
    start_a: u32,
    end_a: u32,
    start_b: u32,
    end_b: u32,
    /// Exactly matched token count.
    matched: u32,
    /// Accumulated bridged tokens (larger side per junction).
    gap: u32,
}

impl From<Run> for Region {
    fn from(run: Run) -> Self {
        Self {
            start_a: run.start_a,
            end_a: run.end_a,
            start_b: run.start_b,
            end_b: run.end_b,
            matched: run.len(),
            gap: 0,
        }
    }
}

impl Region {
    fn similarity(&self) -> f64 {
        self.matched as f64 / (self.matched + self.gap) as f64
    }

    fn span(&self) -> u32 {
        (self.end_a - self.start_a).max(self.end_b - self.start_b)
    }
}

/// Find all clone regions in the corpus.
pub fn find_clones(
    index: &HashIndex,
    streams: &[&[Token]],
    options: &MatchOptions,
) -> Vec<CloneRegion> {
    let buckets = index.collision_buckets();

    // Seed and extend per bucket; buckets are read-only and independent.
    let raw: Vec<Run> = buckets
        .par_iter()
        .flat_map_iter(|bucket| seed_bucket(bucket, streams, options.window))
        .collect();

    // Multiple seed windows on the same diagonal extend to the same maximal
    // run; collapse them.
    let unique: HashSet<Run> = raw.into_iter().collect();

    // Group per file pair for containment dedup and gap merging.
    let mut groups: HashMap<(FileId, FileId), Vec<Run>> = HashMap::new();
    for run in unique {
        groups.entry((run.file_a, run.file_b)).or_default().push(run);
    }

    let mut clones = Vec::new();
    for ((file_a, file_b), mut runs) in groups {
        drop_contained(&mut runs);
        runs.sort_by_key(|r| (r.start_a, r.start_b));

        for region in merge_regions(&runs, options, file_a == file_b) {
            if (region.span() as usize) < options.min_tokens {
                continue;
            }
            clones.push(classify(
                file_a,
                file_b,
                &region,
                streams[file_a as usize],
                streams[file_b as usize],
            ));
        }
    }

    // Deterministic output order regardless of hash-map iteration.
    clones.sort_by(|x, y| {
        (x.file_a, x.start_a, x.file_b, x.start_b, x.end_a, x.end_b).cmp(&(
            y.file_a, y.start_a, y.file_b, y.start_b, y.end_a, y.end_b,
        ))
    });
    clones
}

/// Seed candidate pairs from one bucket and extend each to its maximal run.
fn seed_bucket(bucket: &[Occurrence], streams: &[&[Token]], window: usize) -> Vec<Run> {
    let mut out = Vec::new();
    for i in 0..bucket.len() {
        for j in (i + 1)..bucket.len() {
            let (mut a, mut b) = (bucket[i], bucket[j]);
            if (b.file, b.start) < (a.file, a.start) {
                std::mem::swap(&mut a, &mut b);
            }

            // Trivial self-shift: same file, overlapping windows.
            if a.file == b.file && b.start < a.start + window as u32 {
                continue;
            }

            let sa = streams[a.file as usize];
            let sb = streams[b.file as usize];

            // Hash equality is a candidate, not proof.
            if !windows_equal(sa, a.start as usize, sb, b.start as usize, window) {
                continue;
            }

            out.push(extend(sa, sb, a, b, window));
        }
    }
    out
}

fn windows_equal(sa: &[Token], a: usize, sb: &[Token], b: usize, window: usize) -> bool {
    (0..window).all(|k| sa[a + k].matches(&sb[b + k]))
}

/// Grow a verified seed backward then forward while normalized tokens stay
/// equal, stopping at file boundaries; same-file regions stay disjoint.
fn extend(sa: &[Token], sb: &[Token], a: Occurrence, b: Occurrence, window: usize) -> Run {
    let same_file = a.file == b.file;
    let mut start_a = a.start as usize;
    let mut start_b = b.start as usize;
    let mut end_a = start_a + window;
    let mut end_b = start_b + window;

    while start_a > 0 && start_b > 0 {
        if same_file && start_b <= end_a {
            break;
        }
        if !sa[start_a - 1].matches(&sb[start_b - 1]) {
            break;
        }
        start_a -= 1;
        start_b -= 1;
    }

    while end_a < sa.len() && end_b < sb.len() {
        if same_file && end_a >= start_b {
            break;
        }
        if !sa[end_a].matches(&sb[end_b]) {
            break;
        }
        end_a += 1;
        end_b += 1;
    }

    Run {
        file_a: a.file,
        start_a: start_a as u32,
        end_a: end_a as u32,
        file_b: b.file,
        start_b: start_b as u32,
        end_b: end_b as u32,
    }
}

/// Drop runs whose both ranges are contained in another run of the same
/// file pair.
fn drop_contained(runs: &mut Vec<Run>) {
    if runs.len() < 2 {
        return;
    }
    let snapshot = runs.clone();
    runs.retain(|r| {
        !snapshot.iter().any(|o| {
            o != r
                && o.start_a <= r.start_a
                && o.end_a >= r.end_a
                && o.start_b <= r.start_b
                && o.end_b >= r.end_b
        })
    });
}

/// Merge exact runs into regions, bridging gaps when Type-3 is enabled.
///
/// Policy: one left-to-right pass per file pair. Among admissible next runs
/// (gap <= max_gap on both sides, post-merge similarity >= min_similarity)
/// the one maximizing post-merge similarity wins; ties go to the larger
/// merged span. Chains keep growing while the running similarity holds.
fn merge_regions(runs: &[Run], options: &MatchOptions, same_file: bool) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut used = vec![false; runs.len()];

    for i in 0..runs.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut region = Region::from(runs[i]);

        if options.type3 {
            loop {
                let mut best: Option<(usize, u32, f64, u32)> = None;
                for (j, run) in runs.iter().enumerate().skip(i + 1) {
                    if used[j] {
                        continue;
                    }
                    if run.start_a > region.end_a + options.max_gap as u32 {
                        // Runs are sorted by start_a; later ones are out of
                        // reach too.
                        break;
                    }
                    // Adjacent runs can claim the same ambiguous junction
                    // token on extension (both sides continue with, say, an
                    // identifier); trim the candidate's front so it starts
                    // past the region on both sides.
                    // A same-file merge must keep the two locations
                    // disjoint.
                    if same_file && run.end_a > region.start_b {
                        continue;
                    }
                    let overlap_a = region.end_a.saturating_sub(run.start_a);
                    let overlap_b = region.end_b.saturating_sub(run.start_b);
                    let trim = overlap_a.max(overlap_b);
                    if trim >= run.len() {
                        continue;
                    }
                    let gap_a = run.start_a + trim - region.end_a;
                    let gap_b = run.start_b + trim - region.end_b;
                    if gap_a as usize > options.max_gap || gap_b as usize > options.max_gap {
                        continue;
                    }

                    let matched = region.matched + run.len() - trim;
                    let gap = region.gap + gap_a.max(gap_b);
                    let similarity = matched as f64 / (matched + gap) as f64;
                    if similarity < options.min_similarity {
                        continue;
                    }
                    let span = (run.end_a - region.start_a).max(run.end_b - region.start_b);
                    let better = match best {
                        None => true,
                        Some((_, _, s, p)) => similarity > s || (similarity == s && span > p),
                    };
                    if better {
                        best = Some((j, trim, similarity, span));
                    }
                }

                let Some((j, trim, _, _)) = best else { break };
                let run = runs[j];
                region.gap += (run.start_a + trim - region.end_a)
                    .max(run.start_b + trim - region.end_b);
                region.matched += run.len() - trim;
                region.end_a = run.end_a;
                region.end_b = run.end_b;
                used[j] = true;
            }
        }

        regions.push(region);
    }

    regions
}

/// Classify a finished region against the original lexemes.
fn classify(
    file_a: FileId,
    file_b: FileId,
    region: &Region,
    sa: &[Token],
    sb: &[Token],
) -> CloneRegion {
    let (clone_type, similarity) = if region.gap > 0 {
        (CloneType::Type3, region.similarity())
    } else {
        let len = (region.end_a - region.start_a) as usize;
        let equal = (0..len)
            .filter(|&k| {
                sa[region.start_a as usize + k].text == sb[region.start_b as usize + k].text
            })
            .count();
        if equal == len {
            (CloneType::Type1, 1.0)
        } else {
            (CloneType::Type2, equal as f64 / len as f64)
        }
    };

    CloneRegion {
        file_a,
        start_a: region.start_a,
        end_a: region.end_a,
        file_b,
        start_b: region.start_b,
        end_b: region.end_b,
        clone_type,
        similarity,
    }
}
