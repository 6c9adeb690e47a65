//! Source file representation.

use std::path::{Path, PathBuf};

use super::{Language, Result};

/// Identifier for a source file, stable within one analysis run.
pub type FileId = u32;

/// A source file with its content loaded and decoded.
///
/// Content is decoded lossily: malformed byte sequences become U+FFFD so
/// every downstream string (snippets, paths in reports) serializes cleanly.
/// Immutable after load.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Run-scoped identifier, assigned in sorted path order.
    pub id: FileId,
    /// Path to the file.
    pub path: PathBuf,
    /// Detected language.
    pub language: Language,
    /// Decoded file content.
    pub text: String,
}

impl SourceFile {
    /// Load a source file from disk.
    pub fn load(id: FileId, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let language = Language::detect(path).ok_or_else(|| super::Error::UnsupportedLanguage {
            path: path.to_path_buf(),
        })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::from_text(
            id,
            path,
            language,
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    /// Create from already-decoded text.
    pub fn from_text(
        id: FileId,
        path: impl Into<PathBuf>,
        language: Language,
        text: String,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            language,
            text,
        }
    }

    /// Count total lines.
    pub fn total_lines(&self) -> usize {
        self.text.lines().count()
    }

    /// Extract the source lines covering `start_line..=end_line` (1-based),
    /// capped at `max_lines` lines, for snippet previews.
    pub fn snippet(&self, start_line: u32, end_line: u32, max_lines: usize) -> String {
        let start = start_line.saturating_sub(1) as usize;
        let end = end_line as usize;
        self.text
            .lines()
            .skip(start)
            .take(end.saturating_sub(start).min(max_lines))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
