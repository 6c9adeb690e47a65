//! Pipeline orchestration: cache-or-tokenize, hash, merge, match, report.
//!
//! Tokenization and hashing fan out across a fixed-size worker pool, one
//! task per file, each producing a private partial result. The index merge
//! is deliberately single-threaded (see `index.rs`); match finding runs
//! over the merged, read-only index. Narrow operations (compare, hotspots,
//! per-file clones, file listing) are views over this same pipeline — they
//! never reimplement any matching.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::core::{Error, FileSet, Result, SourceFile};
use crate::lexer::{self, Token};
use crate::report::{self, PhaseTimings, SimilarityReport};

use super::cache::{TokenCache, DEFAULT_CAPACITY};
use super::index::HashIndex;
use super::matcher::{self, CloneRegion, MatchOptions};
use super::rolling::{self, DEFAULT_WINDOW};

/// Analysis options, one set per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    /// Sliding-window width in tokens.
    pub window_size: usize,
    /// Noise floor in tokens for reported regions.
    pub min_tokens: usize,
    /// Maximum bridged gap per side for Type-3 merges.
    pub max_gap: usize,
    /// Minimum accepted Type-3 similarity.
    pub min_similarity: f64,
    /// Whether Type-3 detection runs.
    pub type3: bool,
    /// Worker threads; 0 means available hardware parallelism.
    pub threads: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW,
            min_tokens: 30,
            max_gap: 5,
            min_similarity: 0.7,
            type3: true,
            threads: 0,
        }
    }
}

impl Options {
    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            window: self.window_size,
            min_tokens: self.min_tokens,
            max_gap: self.max_gap,
            min_similarity: self.min_similarity,
            type3: self.type3,
        }
    }
}

struct PipelineOutput {
    sources: Vec<SourceFile>,
    streams: Vec<Arc<Vec<Token>>>,
    regions: Vec<CloneRegion>,
    files_skipped: usize,
    timings: PhaseTimings,
    threads: usize,
}

/// The clone-detection engine. Owns the token cache; the cache's lifetime
/// is the engine's, which in server use spans many requests.
pub struct Engine {
    cache: TokenCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_cache(TokenCache::new(DEFAULT_CAPACITY))
    }

    pub fn with_cache(cache: TokenCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Analyze a corpus and return the full report.
    pub fn analyze(&self, files: &FileSet, options: &Options) -> Result<SimilarityReport> {
        let out = self.run(files, options)?;
        Ok(build(&out))
    }

    /// Compare exactly two files; only cross-file clone pairs are reported.
    pub fn compare_files(
        &self,
        file1: &Path,
        file2: &Path,
        options: &Options,
    ) -> Result<SimilarityReport> {
        for path in [file1, file2] {
            if !path.is_file() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        }
        let root = file1.parent().unwrap_or_else(|| Path::new("."));
        let set = FileSet::from_files(root, vec![file1.to_path_buf(), file2.to_path_buf()]);

        let mut out = self.run(&set, options)?;
        out.regions.retain(|r| r.file_a != r.file_b);
        Ok(build(&out))
    }

    /// Top-N duplication hotspots for a corpus.
    pub fn hotspots(
        &self,
        files: &FileSet,
        options: &Options,
        limit: usize,
    ) -> Result<SimilarityReport> {
        let mut report = self.analyze(files, options)?;
        report.hotspots.truncate(limit);
        Ok(report)
    }

    /// Clones touching one target file.
    pub fn file_clones(
        &self,
        files: &FileSet,
        target: &Path,
        options: &Options,
    ) -> Result<SimilarityReport> {
        let canonical = target.canonicalize().ok();
        let mut out = self.run(files, options)?;

        let matches_target = |id: u32| {
            let path = &out.sources[id as usize].path;
            canonical.as_ref().is_some_and(|c| path == c) || path.ends_with(target)
        };
        out.regions
            .retain(|r| matches_target(r.file_a) || matches_target(r.file_b));
        Ok(build(&out))
    }

    fn run(&self, files: &FileSet, options: &Options) -> Result<PipelineOutput> {
        let total_start = Instant::now();
        let threads = if options.threads == 0 {
            num_cpus::get()
        } else {
            options.threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::analysis(format!("worker pool: {e}")))?;

        pool.install(|| {
            let skipped = AtomicUsize::new(0);

            // Phase 1: load + tokenize, one task per file. Per-file errors
            // skip the file, never the run.
            let tokenize_start = Instant::now();
            let loaded: Vec<(SourceFile, Arc<Vec<Token>>)> = files
                .files()
                .par_iter()
                .filter_map(|path| match SourceFile::load(0, path) {
                    Ok(file) => {
                        let fingerprint = TokenCache::fingerprint(&file.text);
                        let stream = self.cache.get_or_tokenize(path, fingerprint, || {
                            lexer::for_language(file.language).tokenize(&file.text)
                        });
                        Some((file, stream))
                    }
                    Err(e) => {
                        tracing::warn!("skipping {}: {e}", path.display());
                        skipped.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                })
                .collect();

            // Ids are positions in sorted load order; par_iter preserves it.
            let mut sources = Vec::with_capacity(loaded.len());
            let mut streams = Vec::with_capacity(loaded.len());
            for (mut file, stream) in loaded {
                file.id = sources.len() as u32;
                sources.push(file);
                streams.push(stream);
            }
            let tokenize = tokenize_start.elapsed();
            tracing::info!(
                files = sources.len(),
                skipped = skipped.load(Ordering::Relaxed),
                elapsed_ms = tokenize.as_millis() as u64,
                "tokenized corpus"
            );

            // Phase 2: window hashes per file, then one serial merge.
            let hash_start = Instant::now();
            let partials: Vec<_> = streams
                .par_iter()
                .enumerate()
                .map(|(id, stream)| {
                    rolling::window_hashes(id as u32, &rolling::digests(stream), options.window_size)
                })
                .collect();
            let index = HashIndex::merge(&partials);
            let hash = hash_start.elapsed();
            tracing::debug!(
                buckets = index.len(),
                elapsed_ms = hash.as_millis() as u64,
                "index built"
            );

            // Phase 3: match over the now-immutable index.
            let match_start = Instant::now();
            let views: Vec<&[Token]> = streams.iter().map(|s| s.as_slice()).collect();
            let regions = matcher::find_clones(&index, &views, &options.match_options());
            let matching = match_start.elapsed();
            tracing::info!(
                clones = regions.len(),
                elapsed_ms = matching.as_millis() as u64,
                "matching complete"
            );

            Ok(PipelineOutput {
                sources,
                streams,
                regions,
                files_skipped: skipped.into_inner(),
                timings: PhaseTimings {
                    tokenize,
                    hash,
                    matching,
                    total: total_start.elapsed(),
                },
                threads,
            })
        })
    }
}

/// List the corpus without analyzing it.
pub fn file_tree(files: &FileSet) -> Vec<PathBuf> {
    files.iter().cloned().collect()
}

fn build(out: &PipelineOutput) -> SimilarityReport {
    let views: Vec<&[Token]> = out.streams.iter().map(|s| s.as_slice()).collect();
    report::build_report(
        &out.sources,
        &views,
        &out.regions,
        out.files_skipped,
        &out.timings,
        out.threads,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: &str = "fn process(items: Vec<u32>) -> u32 {\n    let mut total = 0;\n    for item in items {\n        total += item * 2;\n    }\n    total\n}\n";

    fn small_options() -> Options {
        Options {
            window_size: 5,
            min_tokens: 10,
            ..Options::default()
        }
    }

    fn corpus(files: &[(&str, &str)]) -> (tempfile::TempDir, FileSet) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let set = FileSet::from_path(dir.path()).unwrap();
        (dir, set)
    }

    #[test]
    fn test_analyze_finds_cross_file_clone() {
        let (_dir, set) = corpus(&[("a.rs", LEFT), ("b.rs", LEFT)]);
        let engine = Engine::new();
        let report = engine.analyze(&set, &small_options()).unwrap();

        assert_eq!(report.summary.files_analyzed, 2);
        assert_eq!(report.summary.clone_pairs_found, 1);
        assert_eq!(report.clones[0].locations.len(), 2);
        assert_eq!(report.metrics.by_type.get("type-1"), Some(&1));
        assert!(!report.hotspots.is_empty());
    }

    #[test]
    fn test_empty_corpus_is_not_an_error() {
        let (_dir, set) = corpus(&[]);
        let engine = Engine::new();
        let report = engine.analyze(&set, &Options::default()).unwrap();

        assert_eq!(report.summary.files_analyzed, 0);
        assert_eq!(report.summary.clone_pairs_found, 0);
        assert_eq!(report.summary.estimated_duplication, "0.0%");
        assert!(report.clones.is_empty());
        assert!(report.hotspots.is_empty());
    }

    #[test]
    fn test_unreadable_file_skipped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.rs"), LEFT).unwrap();
        let set = FileSet::from_files(
            dir.path(),
            vec![dir.path().join("ok.rs"), dir.path().join("missing.rs")],
        );

        let engine = Engine::new();
        let report = engine.analyze(&set, &small_options()).unwrap();
        assert_eq!(report.summary.files_analyzed, 1);
        assert_eq!(report.summary.files_skipped, 1);
    }

    #[test]
    fn test_thread_count_does_not_change_result_set() {
        let renamed = LEFT.replace("total", "acc");
        let (_dir, set) = corpus(&[
            ("a.rs", LEFT),
            ("b.rs", LEFT),
            ("c.rs", &renamed),
            ("d.go", "package main\nfunc main() {}\n"),
        ]);
        let engine = Engine::new();

        let keys = |threads: usize| {
            let options = Options {
                threads,
                ..small_options()
            };
            let report = engine.analyze(&set, &options).unwrap();
            report
                .clones
                .iter()
                .map(|c| {
                    (
                        c.clone_type,
                        c.locations[0].file.clone(),
                        c.locations[0].start_line,
                        c.locations[1].file.clone(),
                        c.locations[1].start_line,
                    )
                })
                .collect::<Vec<_>>()
        };

        let single = keys(1);
        assert!(!single.is_empty());
        for threads in [2, 4, 8] {
            assert_eq!(keys(threads), single, "threads={threads}");
        }
    }

    #[test]
    fn test_repeat_analysis_hits_cache() {
        let (_dir, set) = corpus(&[("a.rs", LEFT), ("b.rs", LEFT)]);
        let engine = Engine::new();

        engine.analyze(&set, &small_options()).unwrap();
        assert_eq!(engine.cache().len(), 2);
        let report = engine.analyze(&set, &small_options()).unwrap();
        assert_eq!(report.summary.clone_pairs_found, 1);
        assert_eq!(engine.cache().len(), 2);
    }

    #[test]
    fn test_compare_files_reports_only_cross_file_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.rs");
        let b = dir.path().join("b.rs");
        std::fs::write(&a, LEFT).unwrap();
        std::fs::write(&b, LEFT).unwrap();

        let engine = Engine::new();
        let report = engine
            .compare_files(&a, &b, &small_options())
            .unwrap();
        assert_eq!(report.summary.clone_pairs_found, 1);
        let locs = &report.clones[0].locations;
        assert_ne!(locs[0].file, locs[1].file);
    }

    #[test]
    fn test_compare_files_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.rs");
        std::fs::write(&a, LEFT).unwrap();

        let engine = Engine::new();
        let err = engine
            .compare_files(&a, &dir.path().join("nope.rs"), &Options::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_hotspots_respects_limit() {
        let renamed = LEFT.replace("process", "transform");
        let (_dir, set) = corpus(&[("a.rs", LEFT), ("b.rs", LEFT), ("c.rs", &renamed)]);
        let engine = Engine::new();
        let report = engine.hotspots(&set, &small_options(), 1).unwrap();
        assert_eq!(report.hotspots.len(), 1);
    }

    #[test]
    fn test_file_clones_filters_to_target() {
        let other = "fn unrelated() -> bool {\n    true\n}\n";
        let (dir, set) = corpus(&[("a.rs", LEFT), ("b.rs", LEFT), ("c.rs", other)]);
        let engine = Engine::new();

        let report = engine
            .file_clones(&set, &dir.path().join("a.rs"), &small_options())
            .unwrap();
        assert_eq!(report.summary.clone_pairs_found, 1);

        let report = engine
            .file_clones(&set, &dir.path().join("c.rs"), &small_options())
            .unwrap();
        assert_eq!(report.summary.clone_pairs_found, 0);
    }

    #[test]
    fn test_file_tree_lists_without_analysis() {
        let (_dir, set) = corpus(&[("a.rs", LEFT), ("b.go", "package main\n")]);
        let paths = file_tree(&set);
        assert_eq!(paths.len(), 2);
    }
}
