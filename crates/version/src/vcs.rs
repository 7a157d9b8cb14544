//! Version control access.
//!
//! The resolution engine only talks to git through [`VersionControl`], which
//! keeps tag lookup and history analysis swappable in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use pyrelease_version::vcs::{GitRepository, VersionControl};
//!
//! let repo = GitRepository::new(".");
//! let tags = repo.list_tags().await?;
//! ```

use crate::commit_analyzer::CommitAnalyzer;
use crate::conventional::{CommitParser, ConventionalCommit};
use crate::error::{Error, Result};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::process::Command;

/// Boxed future returned by [`VersionControl`] methods.
pub type VcsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Repository queries needed to resolve versions.
pub trait VersionControl: Send + Sync {
    /// Tags merged into HEAD, newest version first.
    fn list_tags(&self) -> VcsFuture<'_, Vec<String>>;

    /// Hash of the repository's first (root) commit, if any.
    fn first_commit(&self) -> VcsFuture<'_, Option<String>>;

    /// Conventional commits after `since` that touched a file under one of
    /// `package_roots`.
    fn commits_since<'a>(
        &'a self,
        since: &'a str,
        package_roots: &'a [PathBuf],
    ) -> VcsFuture<'a, Vec<ConventionalCommit>>;
}

/// [`VersionControl`] backed by a local git checkout.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Create a handle for the repository at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| Error::git(format!("Failed to run git {}: {e}", args.join(" "))))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitRepository {
    fn list_tags(&self) -> VcsFuture<'_, Vec<String>> {
        Box::pin(async move {
            let stdout = self
                .git(&["tag", "--sort", "-v:refname", "--merged"])
                .await?;
            Ok(stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect())
        })
    }

    fn first_commit(&self) -> VcsFuture<'_, Option<String>> {
        Box::pin(async move {
            // An unborn HEAD has no history to analyze.
            let Ok(stdout) = self.git(&["rev-list", "--max-parents=0", "HEAD"]).await else {
                return Ok(None);
            };
            // With several root commits (merged histories), the oldest is listed last.
            Ok(stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
                .map(str::to_string))
        })
    }

    fn commits_since<'a>(
        &'a self,
        since: &'a str,
        package_roots: &'a [PathBuf],
    ) -> VcsFuture<'a, Vec<ConventionalCommit>> {
        Box::pin(async move {
            let spec = format!("{since}^{{commit}}");
            let boundary = self.git(&["rev-parse", "--verify", spec.as_str()]).await?;
            let boundary = boundary.trim().to_string();

            let root = self.root.clone();
            let commits = tokio::task::spawn_blocking(move || {
                CommitParser::parse_since(&root, Some(boundary.as_str()))
            })
            .await
            .map_err(|e| Error::git(format!("Commit walk did not complete: {e}")))??;

            CommitAnalyzer::new(&self.root)
                .filter_touching(commits, package_roots)
                .await
        })
    }
}
