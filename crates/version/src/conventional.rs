//! Conventional commit parsing and analysis.
//!
//! This module uses the `git-conventional` crate to parse commit messages
//! following the Conventional Commits specification, and `gix` for git
//! repository access.

#![allow(clippy::default_trait_access)]

use crate::config::ConventionalCommitsConfig;
use crate::error::{Error, Result};
use crate::specifier::BumpKind;
use std::path::Path;

/// A parsed conventional commit.
#[derive(Debug, Clone)]
pub struct ConventionalCommit {
    /// The commit type (feat, fix, chore, etc.)
    pub commit_type: String,
    /// Optional scope
    pub scope: Option<String>,
    /// Whether this is a breaking change
    pub breaking: bool,
    /// The commit description (first line after type)
    pub description: String,
    /// The full commit hash
    pub hash: String,
}

impl ConventionalCommit {
    /// Parse a raw commit message, returning `None` if it is not conventional.
    #[must_use]
    pub fn parse(message: &str, hash: impl Into<String>) -> Option<Self> {
        let parsed = git_conventional::Commit::parse(message.trim()).ok()?;
        Some(Self {
            commit_type: parsed.type_().to_string(),
            scope: parsed.scope().map(|s| s.to_string()),
            breaking: parsed.breaking(),
            description: parsed.description().to_string(),
            hash: hash.into(),
        })
    }

    /// Determine the bump this commit calls for, if any.
    #[must_use]
    pub fn bump_kind(&self, config: &ConventionalCommitsConfig) -> Option<BumpKind> {
        if self.breaking {
            return Some(BumpKind::Major);
        }
        config.bump_for(&self.commit_type)
    }
}

/// Calculate the aggregate bump from a list of commits.
///
/// Returns the highest bump among all commits, or `None` when no commit
/// qualifies for a release.
#[must_use]
pub fn aggregate_bump(
    commits: &[ConventionalCommit],
    config: &ConventionalCommitsConfig,
) -> Option<BumpKind> {
    commits
        .iter()
        .filter_map(|commit| commit.bump_kind(config))
        .max_by_key(|kind| release_rank(*kind))
}

const fn release_rank(kind: BumpKind) -> u8 {
    match kind {
        BumpKind::Major => 3,
        BumpKind::Minor => 2,
        BumpKind::Patch => 1,
        BumpKind::Premajor | BumpKind::Preminor | BumpKind::Prepatch | BumpKind::Prerelease => 0,
    }
}

/// Parser for conventional commits from a git repository.
pub struct CommitParser;

impl CommitParser {
    /// Parse all conventional commits reachable from HEAD but not from the
    /// commit `since`.
    ///
    /// `since` is a full commit hash. Commits merged in after it are
    /// included even when they are older. When `None`, every commit is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened, `since` is not a
    /// valid hash, or commits cannot be read.
    pub fn parse_since(root: &Path, since: Option<&str>) -> Result<Vec<ConventionalCommit>> {
        let repo =
            gix::open(root).map_err(|e| Error::git(format!("Failed to open repository: {e}")))?;

        let head = repo
            .head_id()
            .map_err(|e| Error::git(format!("Failed to get HEAD: {e}")))?;

        let boundary_oid = since
            .map(|hash| {
                gix::ObjectId::from_hex(hash.as_bytes())
                    .map_err(|e| Error::git(format!("Invalid commit hash '{hash}': {e}")))
            })
            .transpose()?;

        // Everything reachable from the boundary is excluded, like `git log <since>..HEAD`.
        let walk = repo
            .rev_walk([head])
            .with_hidden(boundary_oid)
            .sorting(gix::revision::walk::Sorting::ByCommitTime(
                Default::default(),
            ))
            .all()
            .map_err(|e| Error::git(format!("Failed to create rev walk: {e}")))?;

        let mut commits = Vec::new();

        for info in walk {
            let info = info.map_err(|e| Error::git(format!("Failed to walk commits: {e}")))?;
            let oid = info.id;
            let commit = repo
                .find_commit(oid)
                .map_err(|e| Error::git(format!("Failed to find commit: {e}")))?;

            let message = commit.message_raw_sloppy().to_string();
            if let Some(parsed) = ConventionalCommit::parse(&message, oid.to_string()) {
                commits.push(parsed);
            }
        }

        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(commit_type: &str, breaking: bool) -> ConventionalCommit {
        ConventionalCommit {
            commit_type: commit_type.to_string(),
            scope: None,
            breaking,
            description: "change".to_string(),
            hash: "abc123".to_string(),
        }
    }

    #[test]
    fn test_parse_message() {
        let parsed = ConventionalCommit::parse("feat(api): add endpoint\n\nbody", "1").unwrap();
        assert_eq!(parsed.commit_type, "feat");
        assert_eq!(parsed.scope.as_deref(), Some("api"));
        assert_eq!(parsed.description, "add endpoint");
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_parse_breaking_marker() {
        let parsed = ConventionalCommit::parse("refactor!: drop python 3.9", "1").unwrap();
        assert!(parsed.breaking);
    }

    #[test]
    fn test_parse_non_conventional() {
        assert!(ConventionalCommit::parse("Merge branch 'main'", "1").is_none());
    }

    #[test]
    fn test_bump_kinds() {
        let config = ConventionalCommitsConfig::default();
        assert_eq!(commit("feat", false).bump_kind(&config), Some(BumpKind::Minor));
        assert_eq!(commit("fix", false).bump_kind(&config), Some(BumpKind::Patch));
        assert_eq!(commit("perf", false).bump_kind(&config), Some(BumpKind::Patch));
        assert_eq!(commit("chore", false).bump_kind(&config), None);
        assert_eq!(commit("chore", true).bump_kind(&config), Some(BumpKind::Major));
    }

    #[test]
    fn test_aggregate_bump() {
        let config = ConventionalCommitsConfig::default();
        let commits = vec![commit("fix", false), commit("feat", false), commit("docs", false)];
        assert_eq!(aggregate_bump(&commits, &config), Some(BumpKind::Minor));
    }

    #[test]
    fn test_aggregate_bump_nothing_releasable() {
        let config = ConventionalCommitsConfig::default();
        let commits = vec![commit("docs", false), commit("ci", false)];
        assert_eq!(aggregate_bump(&commits, &config), None);
        assert_eq!(aggregate_bump(&[], &config), None);
    }
}
