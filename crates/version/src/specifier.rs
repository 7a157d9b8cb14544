//! Version specifiers: relative bump keywords or exact versions.

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefixes accepted for the `versionPrefix` option.
pub const VALID_VERSION_PREFIXES: [&str; 5] = ["auto", "", "~", "^", "="];

/// A relative semver bump keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    /// Increment the major component.
    Major,
    /// Increment the minor component.
    Minor,
    /// Increment the patch component.
    Patch,
    /// Increment major and start a prerelease.
    Premajor,
    /// Increment minor and start a prerelease.
    Preminor,
    /// Increment patch and start a prerelease.
    Prepatch,
    /// Continue the current prerelease, or start one on the next patch.
    Prerelease,
}

impl BumpKind {
    /// All keywords, in the order they are usually presented.
    pub const ALL: [Self; 7] = [
        Self::Major,
        Self::Premajor,
        Self::Minor,
        Self::Preminor,
        Self::Patch,
        Self::Prepatch,
        Self::Prerelease,
    ];

    /// The keyword as written in options and prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Premajor => "premajor",
            Self::Preminor => "preminor",
            Self::Prepatch => "prepatch",
            Self::Prerelease => "prerelease",
        }
    }

    /// Parse a keyword, returning `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The requested kind of version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    /// A relative bump applied to the current version.
    Bump(BumpKind),
    /// An exact target version.
    Exact(Version),
}

impl FromStr for VersionSpecifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(kind) = BumpKind::parse(trimmed) {
            return Ok(Self::Bump(kind));
        }
        let without_v = trimmed.strip_prefix('v').unwrap_or(trimmed);
        Version::parse(without_v)
            .map(Self::Exact)
            .map_err(|_| Error::invalid_specifier(s))
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bump(kind) => f.write_str(kind.as_str()),
            Self::Exact(version) => fmt::Display::fmt(version, f),
        }
    }
}

impl From<BumpKind> for VersionSpecifier {
    fn from(kind: BumpKind) -> Self {
        Self::Bump(kind)
    }
}

/// Check a `versionPrefix` option value.
///
/// # Errors
///
/// Returns [`Error::InvalidVersionPrefix`] when the prefix is not accepted.
pub fn validate_version_prefix(prefix: &str) -> Result<()> {
    if VALID_VERSION_PREFIXES.contains(&prefix) {
        return Ok(());
    }
    Err(Error::InvalidVersionPrefix {
        prefix: prefix.to_string(),
        valid: VALID_VERSION_PREFIXES
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Outcome of specifier resolution for a package or group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpecifierResolution {
    /// Nothing has been resolved yet.
    #[default]
    Unresolved,
    /// Resolution ran and found that no release is needed.
    NoChange,
    /// Resolution produced a specifier.
    Resolved(VersionSpecifier),
}

impl SpecifierResolution {
    /// The resolved specifier, if any.
    #[must_use]
    pub const fn specifier(&self) -> Option<&VersionSpecifier> {
        match self {
            Self::Resolved(spec) => Some(spec),
            Self::Unresolved | Self::NoChange => None,
        }
    }

    /// Whether resolution still has to run.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

impl From<Option<VersionSpecifier>> for SpecifierResolution {
    fn from(value: Option<VersionSpecifier>) -> Self {
        value.map_or(Self::NoChange, Self::Resolved)
    }
}
