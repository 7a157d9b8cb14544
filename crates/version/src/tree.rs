//! In-memory staging of manifest edits.
//!
//! Reads fall through to disk unless the path has a staged write. Nothing
//! reaches the filesystem until [`ManifestTree::flush`], so a run that fails
//! half-way leaves every manifest as it was.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A batched view of file edits rooted at the workspace.
#[derive(Debug)]
pub struct ManifestTree {
    root: PathBuf,
    staged: BTreeMap<PathBuf, String>,
}

impl ManifestTree {
    /// Create an empty tree for the workspace at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Whether `path` (workspace-relative) exists, either staged or on disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the existence check itself fails.
    pub async fn exists(&self, path: &Path) -> Result<bool> {
        if self.staged.contains_key(path) {
            return Ok(true);
        }
        Ok(tokio::fs::try_exists(self.absolute(path)).await?)
    }

    /// Read `path`, preferring a staged write over the disk contents.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file is not staged and cannot be read.
    pub async fn read(&self, path: &Path) -> Result<String> {
        if let Some(contents) = self.staged.get(path) {
            return Ok(contents.clone());
        }
        Ok(tokio::fs::read_to_string(self.absolute(path)).await?)
    }

    /// Stage new contents for `path`.
    pub fn write(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.staged.insert(path.into(), contents.into());
    }

    /// Workspace-relative paths with staged writes, in sorted order.
    #[must_use]
    pub fn changed_files(&self) -> Vec<PathBuf> {
        self.staged.keys().cloned().collect()
    }

    /// Normalize every staged file to end in exactly one newline.
    pub fn format_files(&mut self) {
        for contents in self.staged.values_mut() {
            let trimmed_len = contents.trim_end_matches(['\n', '\r']).len();
            contents.truncate(trimmed_len);
            contents.push('\n');
        }
    }

    /// Write all staged files to disk.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered. Files written before the
    /// failure stay written.
    pub async fn flush(&self) -> Result<()> {
        for (path, contents) in &self.staged {
            let absolute = self.absolute(path);
            debug!(path = %absolute.display(), "Writing staged file");
            tokio::fs::write(&absolute, contents).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_fall_through_to_disk() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.toml"), "on disk").unwrap();

        let tree = ManifestTree::new(temp.path());
        assert!(tree.exists(Path::new("a.toml")).await.unwrap());
        assert!(!tree.exists(Path::new("b.toml")).await.unwrap());
        assert_eq!(tree.read(Path::new("a.toml")).await.unwrap(), "on disk");
    }

    #[tokio::test]
    async fn test_staged_writes_shadow_disk_until_flush() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.toml");
        std::fs::write(&file, "old").unwrap();

        let mut tree = ManifestTree::new(temp.path());
        tree.write("a.toml", "new");
        assert_eq!(tree.read(Path::new("a.toml")).await.unwrap(), "new");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old");
        assert_eq!(tree.changed_files(), vec![PathBuf::from("a.toml")]);

        tree.flush().await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_format_files_normalizes_trailing_newline() {
        let mut tree = ManifestTree::new("/tmp");
        tree.write("a.toml", "x = 1");
        tree.write("b.toml", "y = 2\n\n\n");
        tree.format_files();
        assert_eq!(tree.staged.get(Path::new("a.toml")).unwrap(), "x = 1\n");
        assert_eq!(tree.staged.get(Path::new("b.toml")).unwrap(), "y = 2\n");
    }
}
