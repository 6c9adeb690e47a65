//! File set for collecting files to analyze.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::{Language, Result};

/// A set of source files to analyze, respecting .gitignore.
///
/// This is the walker boundary from the engine's point of view: it expands a
/// root directory into a concrete, already-filtered, sorted list of paths.
/// The engine itself never walks the filesystem.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Root directory.
    root: PathBuf,
    /// All files in the set.
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Collect all supported source files under `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_filtered(path, &[], &[])
    }

    /// Collect source files under `path`, keeping only the given extensions
    /// (all supported extensions when empty) and dropping paths matching any
    /// exclude glob.
    pub fn from_path_filtered(
        path: impl AsRef<Path>,
        extensions: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self> {
        let root = path.as_ref().canonicalize()?;

        let mut exclude = globset::GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = globset::Glob::new(pattern)
                .map_err(|e| super::Error::config(format!("bad exclude glob {pattern:?}: {e}")))?;
            exclude.add(glob);
        }
        let exclude = exclude
            .build()
            .map_err(|e| super::Error::config(e.to_string()))?;

        let walker = WalkBuilder::new(&root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if Language::detect(path).is_none() {
                continue;
            }
            if !extensions.is_empty() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    continue;
                }
            }
            if exclude.is_match(path) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        // Sort for deterministic file ids
        files.sort();

        Ok(Self { root, files })
    }

    /// Build a file set from an explicit list of paths (no walking).
    pub fn from_files(root: impl Into<PathBuf>, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self {
            root: root.into(),
            files,
        }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get all files in the set.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over files.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Get relative path from root.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_empty() {
        let temp = tempfile::tempdir().unwrap();
        let file_set = FileSet::from_path(temp.path()).unwrap();
        assert!(file_set.is_empty());
        assert_eq!(file_set.len(), 0);
    }

    #[test]
    fn test_file_set_with_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.go"), "package main").unwrap();
        std::fs::write(temp.path().join("lib.rs"), "fn main() {}").unwrap();
        std::fs::write(temp.path().join("README.md"), "# README").unwrap();

        let file_set = FileSet::from_path(temp.path()).unwrap();
        assert_eq!(file_set.len(), 2);
    }

    #[test]
    fn test_extension_filter() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.go"), "package main").unwrap();
        std::fs::write(temp.path().join("lib.rs"), "fn main() {}").unwrap();

        let file_set =
            FileSet::from_path_filtered(temp.path(), &["rs".to_string()], &[]).unwrap();
        assert_eq!(file_set.len(), 1);
        assert!(file_set.files()[0].ends_with("lib.rs"));
    }

    #[test]
    fn test_exclude_patterns() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("vendor")).unwrap();
        std::fs::write(temp.path().join("vendor/dep.rs"), "fn v() {}").unwrap();
        std::fs::write(temp.path().join("lib.rs"), "fn main() {}").unwrap();

        let file_set =
            FileSet::from_path_filtered(temp.path(), &[], &["**/vendor/**".to_string()]).unwrap();
        assert_eq!(file_set.len(), 1);
    }

    #[test]
    fn test_deterministic_order() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.rs"), "fn b() {}").unwrap();
        std::fs::write(temp.path().join("a.rs"), "fn a() {}").unwrap();
        std::fs::write(temp.path().join("c.rs"), "fn c() {}").unwrap();

        let file_set = FileSet::from_path(temp.path()).unwrap();
        let names: Vec<_> = file_set
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "c.rs"]);
    }
}
