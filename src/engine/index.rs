//! Inverted index from window hash to occurrences across the corpus.
//!
//! The index is never mutated concurrently. Workers produce per-file window
//! lists; `HashIndex::merge` folds them in on one thread, in file-id order,
//! and the result is read-only for the rest of the request. This trades a
//! small serial merge (linear in total windows, cheap next to tokenization)
//! for a lock-free hot path. Do not "fix" this with per-bucket locks; the
//! serial merge is the design.

use std::collections::HashMap;

use crate::core::FileId;

use super::rolling::WindowHash;

/// One window occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub file: FileId,
    pub start: u32,
}

/// Read-only inverted index, built once per analysis run.
#[derive(Debug, Default)]
pub struct HashIndex {
    buckets: HashMap<u64, Vec<Occurrence>>,
}

impl HashIndex {
    /// Merge per-file partial window lists into one index. Callers pass the
    /// partials in file-id order so bucket contents are deterministic
    /// regardless of how many workers produced them.
    pub fn merge(partials: &[Vec<WindowHash>]) -> Self {
        let total: usize = partials.iter().map(Vec::len).sum();
        let mut buckets: HashMap<u64, Vec<Occurrence>> = HashMap::with_capacity(total / 2 + 1);
        for partial in partials {
            for wh in partial {
                buckets.entry(wh.hash).or_default().push(Occurrence {
                    file: wh.file,
                    start: wh.start,
                });
            }
        }
        Self { buckets }
    }

    /// All occurrences recorded for a hash.
    pub fn lookup(&self, hash: u64) -> &[Occurrence] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buckets with at least two occurrences — the only ones that can seed
    /// a clone. Collected into a Vec so match-finding can partition them
    /// across workers.
    pub fn collision_buckets(&self) -> Vec<&[Occurrence]> {
        self.buckets
            .values()
            .filter(|b| b.len() >= 2)
            .map(Vec::as_slice)
            .collect()
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
