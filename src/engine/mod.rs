//! The clone-detection engine: rolling hashes, the inverted index, match
//! finding, the token cache, and the pipeline orchestrator.

mod cache;
mod index;
mod matcher;
mod pipeline;
mod rolling;

pub use cache::{TokenCache, DEFAULT_CAPACITY};
pub use index::{HashIndex, Occurrence};
pub use matcher::{find_clones, CloneRegion, CloneType, MatchOptions};
pub use pipeline::{file_tree, Engine, Options};
pub use rolling::{digest, digests, window_hashes, WindowHash, DEFAULT_WINDOW};
