//! Current version resolution.
//!
//! A package's baseline version comes either from its manifest or from the
//! latest release tag, optionally falling back to the manifest when no tag
//! exists yet.

use crate::config::{CurrentVersionResolver, FallbackCurrentVersionResolver};
use crate::error::{Error, Result};
use crate::tag::{TagMatch, TagPattern, latest_tag_for_pattern};
use crate::vcs::VersionControl;
use crate::version::parse_version;
use semver::Version;
use std::path::Path;
use tracing::info;

/// A resolved baseline version and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentVersion {
    /// The baseline version.
    pub version: Version,
    /// The tag it was read from, when resolved from git.
    pub tag_match: Option<TagMatch>,
    /// Whether the disk fallback supplied the version.
    pub used_fallback: bool,
}

/// Inputs for resolving one package's current version.
pub struct CurrentVersionRequest<'a> {
    /// Package name.
    pub package: &'a str,
    /// Manifest path, for error messages.
    pub manifest_path: &'a Path,
    /// `project.version` from the manifest, if present.
    pub disk_version: Option<&'a str>,
    /// Configured strategy.
    pub resolver: CurrentVersionResolver,
    /// Configured fallback.
    pub fallback: Option<FallbackCurrentVersionResolver>,
    /// The group's release tag pattern.
    pub tag_pattern: &'a TagPattern,
}

impl CurrentVersionRequest<'_> {
    fn disk_version(&self) -> Result<Version> {
        let raw = self.disk_version.ok_or_else(|| {
            Error::field_missing(self.package, "project.version", self.manifest_path)
        })?;
        parse_version(raw)
    }
}

/// Resolve the current version of a package.
///
/// # Errors
///
/// Returns [`Error::ManifestFieldMissing`] when the disk version is needed
/// but absent, and [`Error::NoMatchingTag`] when the tag lookup finds nothing
/// and no fallback is configured.
pub async fn resolve_current_version(
    request: &CurrentVersionRequest<'_>,
    vcs: &dyn VersionControl,
) -> Result<CurrentVersion> {
    match request.resolver {
        CurrentVersionResolver::Disk => {
            let version = request.disk_version()?;
            info!(
                package = request.package,
                %version,
                path = %request.manifest_path.display(),
                "Resolved the current version from disk"
            );
            Ok(CurrentVersion {
                version,
                tag_match: None,
                used_fallback: false,
            })
        }
        CurrentVersionResolver::GitTag => {
            let found = latest_tag_for_pattern(vcs, request.tag_pattern, request.package).await?;
            match (found, request.fallback) {
                (Some(tag_match), _) => {
                    let version = parse_version(&tag_match.extracted_version)?;
                    info!(
                        package = request.package,
                        %version,
                        tag = %tag_match.tag,
                        "Resolved the current version from git tag"
                    );
                    Ok(CurrentVersion {
                        version,
                        tag_match: Some(tag_match),
                        used_fallback: false,
                    })
                }
                (None, Some(FallbackCurrentVersionResolver::Disk)) => {
                    let version = request.disk_version()?;
                    info!(
                        package = request.package,
                        pattern = request.tag_pattern.as_str(),
                        %version,
                        "Unable to resolve the current version from git tag, falling back to the version on disk"
                    );
                    Ok(CurrentVersion {
                        version,
                        tag_match: None,
                        used_fallback: true,
                    })
                }
                (None, None) => Err(Error::NoMatchingTag {
                    pattern: request.tag_pattern.as_str().to_string(),
                    package: request.package.to_string(),
                }),
            }
        }
    }
}
