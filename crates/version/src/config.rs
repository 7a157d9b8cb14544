//! Release version configuration types.
//!
//! This module defines the Rust representations of the options a caller
//! passes to the version resolution engine. Keys are camelCase so the same
//! JSON used by the surrounding release tooling can be deserialized as-is.

use crate::error::{Error, Result};
use crate::specifier::{BumpKind, VersionSpecifier, validate_version_prefix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the release group used when the caller did not configure one.
pub const IMPLICIT_DEFAULT_RELEASE_GROUP: &str = "__default__";

/// Environment variable that forces dry-run mode when set to `true`.
pub const DRY_RUN_ENV: &str = "PYRELEASE_DRY_RUN";

/// How packages inside a release group relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectsRelationship {
    /// All packages share one specifier, resolved once per run.
    #[default]
    #[serde(alias = "grouped")]
    Fixed,

    /// Each package resolves its own current version and specifier.
    Independent,
}

impl fmt::Display for ProjectsRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Independent => write!(f, "independent"),
        }
    }
}

/// Release group policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseGroup {
    /// Group name, used in log lines and prompts.
    pub name: String,
    /// Whether packages are versioned together or independently.
    pub projects_relationship: ProjectsRelationship,
    /// Tag template with `{version}` and optionally `{projectName}`.
    pub release_tag_pattern: String,
}

impl Default for ReleaseGroup {
    fn default() -> Self {
        Self {
            name: IMPLICIT_DEFAULT_RELEASE_GROUP.to_string(),
            projects_relationship: ProjectsRelationship::Fixed,
            release_tag_pattern: "v{version}".to_string(),
        }
    }
}

impl ReleaseGroup {
    /// Whether this is the implicit group rather than one the user named.
    #[must_use]
    pub fn is_implicit_default(&self) -> bool {
        self.name == IMPLICIT_DEFAULT_RELEASE_GROUP
    }

    /// Whether packages are versioned independently.
    #[must_use]
    pub fn is_independent(&self) -> bool {
        self.projects_relationship == ProjectsRelationship::Independent
    }
}

/// Where the current version of a package comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurrentVersionResolver {
    /// `project.version` in the package's `pyproject.toml`.
    #[default]
    Disk,
    /// The latest git tag matching the release tag pattern.
    GitTag,
}

impl fmt::Display for CurrentVersionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disk => write!(f, "disk"),
            Self::GitTag => write!(f, "git-tag"),
        }
    }
}

/// Secondary source used when no matching git tag exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackCurrentVersionResolver {
    /// Fall back to the version on disk.
    Disk,
}

/// How the version specifier is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecifierSource {
    /// Ask the user.
    #[default]
    Prompt,
    /// Derive it from conventional commits since the last release.
    ConventionalCommits,
}

/// Mapping from conventional commit types to the bump they trigger.
///
/// Types mapped to `None` (or absent) do not trigger a release. Breaking
/// changes always trigger a major bump regardless of this table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionalCommitsConfig {
    /// Commit type to bump.
    pub types: BTreeMap<String, Option<BumpKind>>,
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        Self {
            types: BTreeMap::from([
                ("feat".to_string(), Some(BumpKind::Minor)),
                ("fix".to_string(), Some(BumpKind::Patch)),
                ("perf".to_string(), Some(BumpKind::Patch)),
            ]),
        }
    }
}

impl ConventionalCommitsConfig {
    /// The bump configured for `commit_type`.
    #[must_use]
    pub fn bump_for(&self, commit_type: &str) -> Option<BumpKind> {
        self.types.get(commit_type).copied().flatten()
    }
}

/// A package targeted by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name.
    pub name: String,
    /// Package root relative to the workspace root.
    pub root: PathBuf,
}

impl Package {
    /// Create a package.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// Whether side effects are suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DryRun {
    /// Write manifests.
    #[default]
    No,
    /// Resolve everything, write nothing.
    Yes,
}

impl DryRun {
    /// Combine the option value with the [`DRY_RUN_ENV`] environment variable.
    ///
    /// Either source enabling dry-run is enough.
    #[must_use]
    pub fn resolve(option: bool) -> Self {
        let from_env = std::env::var(DRY_RUN_ENV).is_ok_and(|value| value == "true");
        if option || from_env { Self::Yes } else { Self::No }
    }

    /// Whether dry-run mode is active.
    #[must_use]
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Options for a release version run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionOptions {
    /// Packages to version, in processing order.
    pub projects: Vec<Package>,
    /// The release group the packages belong to.
    pub release_group: ReleaseGroup,
    /// Explicit specifier overriding commit analysis and prompts.
    pub specifier: Option<String>,
    /// Where specifiers come from when none is given explicitly.
    pub specifier_source: SpecifierSource,
    /// Identifier for prerelease bumps (e.g. `beta`).
    pub preid: Option<String>,
    /// Template for the directory containing `pyproject.toml`.
    pub package_root: Option<String>,
    /// Where current versions come from.
    pub current_version_resolver: CurrentVersionResolver,
    /// Source used when the current version resolver finds nothing.
    pub fallback_current_version_resolver: Option<FallbackCurrentVersionResolver>,
    /// Treat this as the first release (implies a disk fallback).
    pub first_release: bool,
    /// Prefix for dependency ranges; validated only.
    pub version_prefix: Option<String>,
    /// Commit type to bump mapping for conventional commits.
    pub conventional_commits: ConventionalCommitsConfig,
    /// Resolve without writing.
    pub dry_run: bool,
}

impl VersionOptions {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the document does not match the schema.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                format!("Failed to read {}: {e}", path.display()),
                "Check that the options file exists and is readable",
            )
        })?;
        Self::from_json_str(&contents)
    }

    /// Validate option values and combinations.
    ///
    /// Returns the parsed explicit specifier, if one was given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid specifier, an invalid
    /// version prefix, or conventional commits without the git tag resolver.
    pub fn validate(&self) -> Result<Option<VersionSpecifier>> {
        let specifier = self
            .specifier
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<VersionSpecifier>)
            .transpose()?;

        if let Some(prefix) = &self.version_prefix {
            validate_version_prefix(prefix)?;
        }

        if specifier.is_none()
            && self.specifier_source == SpecifierSource::ConventionalCommits
            && self.current_version_resolver != CurrentVersionResolver::GitTag
        {
            return Err(Error::config(
                format!(
                    "Invalid currentVersionResolver \"{}\" provided for release group \"{}\". Must be \"git-tag\" when \"specifierSource\" is \"conventional-commits\"",
                    self.current_version_resolver, self.release_group.name
                ),
                "Set currentVersionResolver to \"git-tag\" or use the prompt specifier source",
            ));
        }

        Ok(specifier)
    }

    /// The effective fallback resolver; a first release always falls back
    /// to disk.
    #[must_use]
    pub fn effective_fallback(&self) -> Option<FallbackCurrentVersionResolver> {
        if self.first_release {
            Some(FallbackCurrentVersionResolver::Disk)
        } else {
            self.fallback_current_version_resolver
        }
    }

    /// Resolve the manifest directory of `package` from the `packageRoot`
    /// template.
    ///
    /// Supports `{projectRoot}`, `{projectName}` and `{workspaceRoot}`; the
    /// latter expands to the empty string so results stay workspace-relative.
    #[must_use]
    pub fn resolve_package_root(&self, package: &Package) -> PathBuf {
        let Some(template) = &self.package_root else {
            return package.root.clone();
        };
        let root = package.root.to_string_lossy();
        let interpolated = template
            .replace("{workspaceRoot}", "")
            .replace("{projectRoot}", &root)
            .replace("{projectName}", &package.name);
        let trimmed = interpolated.trim_start_matches('/');
        PathBuf::from(if trimmed.is_empty() { "." } else { trimmed })
    }
}
