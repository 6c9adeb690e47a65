//! LRU-bounded cache of tokenized file streams.
//!
//! Keyed by (path, content fingerprint), so an edited file misses and a
//! reverted file hits again. Tokenization is pure, which makes a hit
//! indistinguishable from a fresh tokenize; cache state affects throughput,
//! never results. The cache outlives individual requests — the server
//! constructs it once, empty, and hands it to the engine.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_64;

use crate::lexer::Token;

/// Default number of cached token streams.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    fingerprint: u64,
}

/// Shared token stream cache with strict LRU eviction.
pub struct TokenCache {
    inner: Mutex<LruCache<CacheKey, Arc<Vec<Token>>>>,
}

impl TokenCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fingerprint file content for cache keying.
    pub fn fingerprint(text: &str) -> u64 {
        xxh3_64(text.as_bytes())
    }

    /// Return the cached stream for (path, fingerprint), tokenizing on miss.
    pub fn get_or_tokenize(
        &self,
        path: &Path,
        fingerprint: u64,
        tokenize: impl FnOnce() -> Vec<Token>,
    ) -> Arc<Vec<Token>> {
        let key = CacheKey {
            path: path.to_path_buf(),
            fingerprint,
        };

        if let Some(stream) = self.inner.lock().get(&key) {
            return Arc::clone(stream);
        }

        // Tokenize outside the lock; the worst case is two workers
        // tokenizing the same file once each, which is correct either way.
        let stream = Arc::new(tokenize());
        self.inner.lock().put(key, Arc::clone(&stream));
        stream
    }

    /// Number of cached streams.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use crate::lexer::for_language;

    fn tokenize(text: &str) -> Vec<Token> {
        for_language(Language::Rust).tokenize(text)
    }

    #[test]
    fn test_hit_returns_same_stream() {
        let cache = TokenCache::new(4);
        let text = "fn main() {}";
        let fp = TokenCache::fingerprint(text);

        let first = cache.get_or_tokenize(Path::new("a.rs"), fp, || tokenize(text));
        let second = cache.get_or_tokenize(Path::new("a.rs"), fp, || panic!("must hit"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_content_misses() {
        let cache = TokenCache::new(4);
        let old = "fn main() {}";
        let new = "fn main() { run(); }";

        cache.get_or_tokenize(Path::new("a.rs"), TokenCache::fingerprint(old), || {
            tokenize(old)
        });
        let fresh = cache.get_or_tokenize(Path::new("a.rs"), TokenCache::fingerprint(new), || {
            tokenize(new)
        });
        assert_eq!(fresh.len(), tokenize(new).len());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache = TokenCache::new(2);
        let fp = TokenCache::fingerprint("x");
        cache.get_or_tokenize(Path::new("a.rs"), fp, || tokenize("a"));
        cache.get_or_tokenize(Path::new("b.rs"), fp, || tokenize("b"));

        // Touch a so b becomes least-recently-used.
        cache.get_or_tokenize(Path::new("a.rs"), fp, || panic!("must hit"));
        cache.get_or_tokenize(Path::new("c.rs"), fp, || tokenize("c"));

        assert_eq!(cache.len(), 2);
        // b was evicted; a survives.
        cache.get_or_tokenize(Path::new("a.rs"), fp, || panic!("a must survive"));
        let mut tokenized_b = false;
        cache.get_or_tokenize(Path::new("b.rs"), fp, || {
            tokenized_b = true;
            tokenize("b")
        });
        assert!(tokenized_b);
    }

    #[test]
    fn test_hit_equals_fresh_tokenize() {
        let cache = TokenCache::new(4);
        let text = "let x = compute(1, 2);";
        let fp = TokenCache::fingerprint(text);

        cache.get_or_tokenize(Path::new("a.rs"), fp, || tokenize(text));
        let cached = cache.get_or_tokenize(Path::new("a.rs"), fp, || unreachable!());
        assert_eq!(*cached, tokenize(text));
    }
}
