//! Incremental rolling hash over normalized token streams.
//!
//! Each token's normalized value is digested to a u64 with xxh3; window
//! hashes are a polynomial rolling hash over those digests in wrapping u64
//! arithmetic. Sliding the window by one token is O(1): the leaving digest's
//! top-power contribution is subtracted, the hash is shifted by the base,
//! and the entering digest is added. Collisions are expected and tolerated;
//! the matcher verifies token equality before trusting any bucket.

use xxhash_rust::xxh3::xxh3_64;

use crate::core::FileId;
use crate::lexer::Token;

/// Default sliding-window width in tokens.
pub const DEFAULT_WINDOW: usize = 10;

/// Polynomial base. Any odd constant works with wrapping arithmetic; a large
/// prime keeps digest bits mixing across the window.
const BASE: u64 = 1_000_003;

/// One hashed window position within a file's token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHash {
    pub hash: u64,
    pub file: FileId,
    /// 0-based token index of the window start; the window covers
    /// `start .. start + window`.
    pub start: u32,
}

/// Digest a token's normalized value.
pub fn digest(token: &Token) -> u64 {
    xxh3_64(token.norm.as_bytes())
}

/// Digest a whole stream.
pub fn digests(tokens: &[Token]) -> Vec<u64> {
    tokens.iter().map(digest).collect()
}

/// Produce one `WindowHash` per valid window position. Streams shorter than
/// the window produce none.
pub fn window_hashes(file: FileId, digests: &[u64], window: usize) -> Vec<WindowHash> {
    if window == 0 || digests.len() < window {
        return Vec::new();
    }

    // Contribution multiplier of the window's leading digest.
    let top = BASE.wrapping_pow(window as u32 - 1);

    let mut out = Vec::with_capacity(digests.len() - window + 1);
    let mut hash = 0u64;
    for d in &digests[..window] {
        hash = hash.wrapping_mul(BASE).wrapping_add(*d);
    }
    out.push(WindowHash {
        hash,
        file,
        start: 0,
    });

    for i in window..digests.len() {
        hash = hash
            .wrapping_sub(digests[i - window].wrapping_mul(top))
            .wrapping_mul(BASE)
            .wrapping_add(digests[i]);
        out.push(WindowHash {
            hash,
            file,
            start: (i - window + 1) as u32,
        });
    }

    out
}
