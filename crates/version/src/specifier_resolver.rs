//! Version specifier resolution.
//!
//! Decides what kind of release a package (or a whole fixed group) needs,
//! either from conventional commits since the last release or by asking.

use crate::config::{
    ConventionalCommitsConfig, CurrentVersionResolver, FallbackCurrentVersionResolver,
    ReleaseGroup, SpecifierSource,
};
use crate::conventional::aggregate_bump;
use crate::current_version::CurrentVersion;
use crate::error::{Error, Result};
use crate::prompt::{PromptRequest, SpecifierPrompt};
use crate::specifier::VersionSpecifier;
use crate::vcs::VersionControl;
use crate::version::continue_prerelease;
use std::path::PathBuf;
use tracing::info;

/// A package whose history counts towards the specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedPackage {
    /// Package name.
    pub name: String,
    /// Manifest directory relative to the workspace root.
    pub root: PathBuf,
}

/// Everything needed to resolve a specifier.
pub struct SpecifierRequest<'a> {
    /// Where the specifier comes from.
    pub source: SpecifierSource,
    /// The release group policy.
    pub group: &'a ReleaseGroup,
    /// The package being processed.
    pub project: &'a str,
    /// Packages whose changes count: the project itself when independent,
    /// every target package when fixed.
    pub affected: &'a [AffectedPackage],
    /// The configured current version strategy.
    pub current_version_resolver: CurrentVersionResolver,
    /// The configured fallback strategy.
    pub fallback: Option<FallbackCurrentVersionResolver>,
    /// The resolved current version.
    pub current: &'a CurrentVersion,
    /// Commit type to bump table.
    pub conventional_commits: &'a ConventionalCommitsConfig,
}

/// Resolve the specifier for a request.
///
/// Returns `None` when commit analysis finds nothing worth releasing.
///
/// # Errors
///
/// Returns a configuration error when commit analysis is requested without
/// the git tag resolver or prompting without a prompt,
/// [`Error::UnresolvableReference`] when there is no tag or first commit to
/// compare against, and any git or prompt failure.
pub async fn resolve_specifier(
    request: &SpecifierRequest<'_>,
    vcs: &dyn VersionControl,
    prompt: Option<&dyn SpecifierPrompt>,
) -> Result<Option<VersionSpecifier>> {
    match request.source {
        SpecifierSource::ConventionalCommits => from_conventional_commits(request, vcs).await,
        SpecifierSource::Prompt => {
            let prompt = prompt.ok_or_else(|| {
                Error::config(
                    format!(
                        "No prompt is available to ask for the version of \"{}\"",
                        request.project
                    ),
                    "Pass an explicit specifier or use the conventional-commits specifier source",
                )
            })?;
            let question = if request.group.is_independent() {
                PromptRequest::for_project(request.group, request.project)
            } else {
                PromptRequest::for_group(request.group, request.affected.len())
            };
            let specifier = prompt.ask(&question).await?;
            info!(
                package = request.project,
                %specifier,
                "Resolved the specifier from prompt"
            );
            Ok(Some(specifier))
        }
    }
}

async fn from_conventional_commits(
    request: &SpecifierRequest<'_>,
    vcs: &dyn VersionControl,
) -> Result<Option<VersionSpecifier>> {
    if request.current_version_resolver != CurrentVersionResolver::GitTag {
        return Err(Error::config(
            format!(
                "Invalid currentVersionResolver \"{}\" provided for release group \"{}\". Must be \"git-tag\" when \"specifierSource\" is \"conventional-commits\"",
                request.current_version_resolver, request.group.name
            ),
            "Set currentVersionResolver to \"git-tag\" or use the prompt specifier source",
        ));
    }

    let names: Vec<String> = request.affected.iter().map(|p| p.name.clone()).collect();

    // Without a tag the disk fallback supplied the version; history then
    // starts at the first commit.
    let reference = match (&request.current.tag_match, request.fallback) {
        (Some(tag_match), _) => Some(tag_match.tag.clone()),
        (None, Some(FallbackCurrentVersionResolver::Disk)) => vcs.first_commit().await?,
        (None, None) => None,
    };
    let Some(reference) = reference else {
        return Err(Error::UnresolvableReference { packages: names });
    };

    let roots: Vec<PathBuf> = request.affected.iter().map(|p| p.root.clone()).collect();
    let commits = vcs.commits_since(&reference, &roots).await?;

    let Some(detected) = aggregate_bump(&commits, request.conventional_commits) else {
        info!(
            package = request.project,
            reference = %reference,
            "No changes were detected using git history and the conventional commits standard"
        );
        return Ok(None);
    };

    let effective = continue_prerelease(&request.current.version, detected);
    if effective == detected {
        info!(
            package = request.project,
            specifier = %effective,
            commits = commits.len(),
            "Resolved the specifier using git history and the conventional commits standard"
        );
    } else {
        info!(
            package = request.project,
            specifier = %effective,
            detected = %detected,
            current = %request.current.version,
            "Resolved the specifier as prerelease since the current version is a prerelease"
        );
    }

    Ok(Some(VersionSpecifier::Bump(effective)))
}
