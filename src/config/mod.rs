//! Configuration loading and management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::engine::{Options, DEFAULT_CAPACITY, DEFAULT_WINDOW};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclude patterns (glob).
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
    /// Detection thresholds.
    pub engine: EngineConfig,
    /// Token cache sizing.
    pub cache: CacheConfig,
    /// Protocol server settings.
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config`
    /// flags.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load configuration from a directory, looking for `doppel.toml`.
    /// A missing file is not an error; defaults apply.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join("doppel.toml");
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Detection thresholds, mirrored into `engine::Options` per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sliding-window width in tokens.
    pub window_size: usize,
    /// Minimum tokens for a reported clone region.
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

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = Options::default();
        Self {
            window_size: DEFAULT_WINDOW,
            min_tokens: defaults.min_tokens,
            max_gap: defaults.max_gap,
            min_similarity: defaults.min_similarity,
            type3: defaults.type3,
            threads: defaults.threads,
        }
    }
}

impl EngineConfig {
    /// Convert to per-request engine options.
    pub fn to_options(&self) -> Options {
        Options {
            window_size: self.window_size,
            min_tokens: self.min_tokens,
            max_gap: self.max_gap,
            min_similarity: self.min_similarity,
            type3: self.type3,
            threads: self.threads,
        }
    }
}

/// Token cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached token streams.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Protocol server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Unix socket path the server binds.
    pub socket: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/tmp/doppel.sock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.window_size, 10);
        assert_eq!(config.engine.min_tokens, 30);
        assert_eq!(config.engine.max_gap, 5);
        assert!(config.engine.type3);
        assert_eq!(config.cache.capacity, 256);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/doppel.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("doppel.toml"),
            "exclude = [\"**/vendor/**\"]\n\n[engine]\nmin_tokens = 50\ntype3 = false\n",
        )
        .unwrap();

        let config = Config::load_default(dir.path()).unwrap();
        assert_eq!(config.exclude_patterns, vec!["**/vendor/**"]);
        assert_eq!(config.engine.min_tokens, 50);
        assert!(!config.engine.type3);
        // Untouched sections keep defaults.
        assert_eq!(config.engine.window_size, 10);
        assert_eq!(config.cache.capacity, 256);
    }

    #[test]
    fn test_load_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_default(dir.path()).unwrap();
        assert_eq!(config.engine.min_tokens, 30);
    }

    #[test]
    fn test_to_options_round_trip() {
        let mut config = EngineConfig::default();
        config.threads = 4;
        config.min_similarity = 0.8;
        let options = config.to_options();
        assert_eq!(options.threads, 4);
        assert_eq!(options.min_similarity, 0.8);
    }
}
