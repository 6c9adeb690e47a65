//! Doppel - token-based code clone detection.
//!
//! Doppel scans a corpus of source files, finds duplicated or
//! near-duplicated fragments, classifies each pair as a Type-1 (identical),
//! Type-2 (renamed), or Type-3 (gapped) clone, and can serve results over a
//! persistent local socket.
//!
//! # Supported Languages
//!
//! Go, Rust, Python, TypeScript, JavaScript, TSX/JSX, Java, C, C++, C#,
//! Ruby, PHP, Bash
//!
//! # Example
//!
//! ```no_run
//! use doppel::core::FileSet;
//! use doppel::engine::{Engine, Options};
//!
//! let files = FileSet::from_path(".").unwrap();
//! let engine = Engine::new();
//! let report = engine.analyze(&files, &Options::default()).unwrap();
//! println!("{} clone pairs", report.summary.clone_pairs_found);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod lexer;
pub mod output;
pub mod report;
pub mod server;

pub use engine::{Engine, Options};
pub use report::SimilarityReport;
