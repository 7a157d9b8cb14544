//! Commit analysis for per-package versioning.
//!
//! Maps commits to package roots through the files each commit touched, so
//! that an independently versioned package only sees its own history.

use crate::conventional::ConventionalCommit;
use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;

/// Filters commits down to those touching a set of package roots.
pub struct CommitAnalyzer<'a> {
    root: &'a Path,
}

impl<'a> CommitAnalyzer<'a> {
    /// Create a new commit analyzer for the repository at `root`.
    #[must_use]
    pub const fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Keep only the commits that changed a file under one of `package_roots`.
    ///
    /// Package roots may be absolute or relative to the repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if git operations fail when analyzing commits.
    pub async fn filter_touching(
        &self,
        commits: Vec<ConventionalCommit>,
        package_roots: &[PathBuf],
    ) -> Result<Vec<ConventionalCommit>> {
        let roots: Vec<PathBuf> = package_roots
            .iter()
            .map(|root| self.relative_root(root))
            .collect();

        let mut touching = Vec::new();
        for commit in commits {
            let changed = self.changed_files(&commit.hash).await?;
            if changed
                .iter()
                .any(|file| roots.iter().any(|root| file.starts_with(root)))
            {
                touching.push(commit);
            }
        }
        Ok(touching)
    }

    /// Normalize a package root to a repository-relative path without `.`
    /// components; the repository root itself becomes the empty path.
    fn relative_root(&self, root: &Path) -> PathBuf {
        let relative = if root.is_absolute() {
            root.strip_prefix(self.root).unwrap_or(root)
        } else {
            root
        };
        relative
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect()
    }

    /// Get the files changed in a specific commit.
    ///
    /// Uses `git diff-tree` to list files changed in the commit.
    /// For root commits (no parent), uses `--root` flag to show all added files.
    async fn changed_files(&self, commit_hash: &str) -> Result<Vec<PathBuf>> {
        let output = Command::new("git")
            .args([
                "diff-tree",
                "--no-commit-id",
                "--name-only",
                "-r",
                "--root",
                commit_hash,
            ])
            .current_dir(self.root)
            .output()
            .await
            .map_err(|e| Error::git(format!("Failed to run git diff-tree: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(format!(
                "git diff-tree failed for {commit_hash}: {stderr}"
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
