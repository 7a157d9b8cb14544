//! Semantic version arithmetic.
//!
//! Bumps follow the increment rules of the npm `semver` package, which is
//! what Python release tooling in JavaScript-driven monorepos expects:
//! - a prerelease graduates to its release when the bump does not cross a
//!   component (`1.0.0-rc.1` bumped `major` is `1.0.0`)
//! - `pre*` bumps start a prerelease at `<preid>.0`
//! - `prerelease` continues the trailing numeric identifier

use crate::error::{Error, Result};
use crate::specifier::{BumpKind, VersionSpecifier};
use semver::{BuildMetadata, Prerelease, Version};

/// Parse a version string, tolerating a leading `v`.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the string is not valid semver.
pub fn parse_version(value: &str) -> Result<Version> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).map_err(|_| Error::invalid_version(value))
}

/// Derive the next version from `current`.
///
/// Exact specifiers are returned as-is; relative keywords are applied to
/// `current`, using `preid` for any prerelease identifier they introduce.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if `preid` produces an invalid
/// prerelease component.
pub fn derive_new_version(
    current: &Version,
    specifier: &VersionSpecifier,
    preid: Option<&str>,
) -> Result<Version> {
    match specifier {
        VersionSpecifier::Exact(version) => Ok(version.clone()),
        VersionSpecifier::Bump(kind) => bump(current, *kind, preid),
    }
}

/// Adjust a bump detected from commit history for the current version.
///
/// A prerelease current version always continues as a prerelease. Leaving a
/// prerelease requires an explicit specifier from the caller.
#[must_use]
pub fn continue_prerelease(current: &Version, detected: BumpKind) -> BumpKind {
    if current.pre.is_empty() {
        detected
    } else {
        BumpKind::Prerelease
    }
}

fn bump(current: &Version, kind: BumpKind, preid: Option<&str>) -> Result<Version> {
    let mut next = current.clone();
    next.build = BuildMetadata::EMPTY;

    match kind {
        BumpKind::Major => {
            if next.minor != 0 || next.patch != 0 || next.pre.is_empty() {
                next.major = increment(current, next.major)?;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpKind::Minor => {
            if next.patch != 0 || next.pre.is_empty() {
                next.minor = increment(current, next.minor)?;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpKind::Patch => {
            if next.pre.is_empty() {
                next.patch = increment(current, next.patch)?;
            }
            next.pre = Prerelease::EMPTY;
        }
        BumpKind::Premajor => {
            next.major = increment(current, next.major)?;
            next.minor = 0;
            next.patch = 0;
            next.pre = next_prerelease(&Prerelease::EMPTY, preid)?;
        }
        BumpKind::Preminor => {
            next.minor = increment(current, next.minor)?;
            next.patch = 0;
            next.pre = next_prerelease(&Prerelease::EMPTY, preid)?;
        }
        BumpKind::Prepatch => {
            next.patch = increment(current, next.patch)?;
            next.pre = next_prerelease(&Prerelease::EMPTY, preid)?;
        }
        BumpKind::Prerelease => {
            if next.pre.is_empty() {
                next.patch = increment(current, next.patch)?;
            }
            next.pre = next_prerelease(&next.pre, preid)?;
        }
    }

    Ok(next)
}

fn increment(current: &Version, component: u64) -> Result<u64> {
    component
        .checked_add(1)
        .ok_or_else(|| Error::invalid_version(current.to_string()))
}

fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

fn next_prerelease(current: &Prerelease, preid: Option<&str>) -> Result<Prerelease> {
    let mut identifiers: Vec<String> = if current.is_empty() {
        Vec::new()
    } else {
        current.as_str().split('.').map(str::to_string).collect()
    };

    if identifiers.is_empty() {
        identifiers.push("0".to_string());
    } else if let Some(last_numeric) = identifiers.iter_mut().rev().find(|id| is_numeric(id)) {
        let value: u64 = last_numeric
            .parse()
            .map_err(|_| Error::invalid_version(current.as_str()))?;
        let bumped = value
            .checked_add(1)
            .ok_or_else(|| Error::invalid_version(current.as_str()))?;
        *last_numeric = bumped.to_string();
    } else {
        identifiers.push("0".to_string());
    }

    if let Some(id) = preid.filter(|id| !id.is_empty()) {
        let keeps_counter = identifiers.first().is_some_and(|first| first == id)
            && identifiers.get(1).is_some_and(|second| is_numeric(second));
        if !keeps_counter {
            identifiers = vec![id.to_string(), "0".to_string()];
        }
    }

    let joined = identifiers.join(".");
    Prerelease::new(&joined).map_err(|_| Error::invalid_version(joined))
}
