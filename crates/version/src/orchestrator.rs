//! Release version orchestrator.
//!
//! Drives the per-package pipeline: select the manifest, resolve the current
//! version, resolve the specifier, derive the new version and stage the
//! manifest write. Staged writes are flushed once all packages succeeded.

use crate::config::{
    CurrentVersionResolver, DryRun, FallbackCurrentVersionResolver, VersionOptions,
};
use crate::current_version::{CurrentVersion, CurrentVersionRequest, resolve_current_version};
use crate::error::{Error, Result};
use crate::manifest::{MANIFEST_FILE_NAME, PyprojectManifest};
use crate::prompt::SpecifierPrompt;
use crate::specifier::{SpecifierResolution, VersionSpecifier};
use crate::specifier_resolver::{AffectedPackage, SpecifierRequest, resolve_specifier};
use crate::tag::TagPattern;
use crate::tree::ManifestTree;
use crate::vcs::{GitRepository, VersionControl};
use crate::version::derive_new_version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Steps a package moves through during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStep {
    /// Locating the manifest.
    SelectingRoot,
    /// Determining the baseline version.
    ResolvingCurrentVersion,
    /// Determining the bump.
    ResolvingSpecifier,
    /// No release needed; nothing is written.
    SkippedNoChange,
    /// Computing the new version.
    DerivingVersion,
    /// Staging the manifest edit.
    WritingManifest,
    /// Finished.
    Done,
}

impl fmt::Display for PackageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectingRoot => "selecting-root",
            Self::ResolvingCurrentVersion => "resolving-current-version",
            Self::ResolvingSpecifier => "resolving-specifier",
            Self::SkippedNoChange => "skipped-no-change",
            Self::DerivingVersion => "deriving-version",
            Self::WritingManifest => "writing-manifest",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Version report entry for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDataEntry {
    /// The baseline version.
    pub current_version: String,
    /// The new version, or `None` when the package is not released.
    pub new_version: Option<String>,
    /// Dependent packages whose ranges were updated. Always empty.
    pub dependents: Vec<String>,
}

/// Version report keyed by package name.
pub type VersionData = BTreeMap<String, VersionDataEntry>;

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct ReleaseVersionResult {
    /// Per-package versions.
    pub data: VersionData,
    /// Workspace-relative manifests that were (or in dry-run, would be) updated.
    pub changed_files: Vec<PathBuf>,
    /// Whether writes were suppressed.
    pub dry_run: DryRun,
}

impl ReleaseVersionResult {
    /// Completion hook for post-processing.
    ///
    /// Returns the files the run touched so callers can stage them.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature leaves room for hooks that do I/O.
    #[allow(clippy::unused_async)]
    pub async fn callback(&self) -> Result<Vec<PathBuf>> {
        Ok(self.changed_files.clone())
    }
}

/// State carried between packages of one run.
///
/// Independent groups start every package from a fresh context; fixed
/// groups carry it so the tag lookup and specifier are resolved once.
#[derive(Debug, Clone, Default)]
struct ResolutionContext {
    current: Option<CurrentVersion>,
    specifier: SpecifierResolution,
}

impl ResolutionContext {
    fn new(explicit: Option<&VersionSpecifier>) -> Self {
        Self {
            current: None,
            specifier: explicit
                .cloned()
                .map_or(SpecifierResolution::Unresolved, SpecifierResolution::Resolved),
        }
    }
}

/// Release version orchestrator.
///
/// Resolves and writes new versions for every package in
/// [`VersionOptions::projects`], in order.
pub struct VersionOrchestrator {
    workspace_root: PathBuf,
    options: VersionOptions,
    vcs: Box<dyn VersionControl>,
    prompt: Option<Box<dyn SpecifierPrompt>>,
}

impl VersionOrchestrator {
    /// Create an orchestrator for the workspace at `workspace_root`, backed by
    /// the git repository found there.
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>, options: VersionOptions) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            vcs: Box::new(GitRepository::new(workspace_root.clone())),
            workspace_root,
            options,
            prompt: None,
        }
    }

    /// Replace the version control backend.
    #[must_use]
    pub fn with_vcs(mut self, vcs: Box<dyn VersionControl>) -> Self {
        self.vcs = vcs;
        self
    }

    /// Set the prompt used when the specifier source is `prompt`.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn SpecifierPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Resolve new versions for all packages and write their manifests.
    ///
    /// # Errors
    ///
    /// Returns the first error hit by any package. Manifests are only written
    /// after every package succeeded, so an error leaves the disk untouched.
    pub async fn run(&self) -> Result<ReleaseVersionResult> {
        let explicit = self.options.validate()?;
        let dry_run = DryRun::resolve(self.options.dry_run);
        let group = &self.options.release_group;

        info!(
            group = %group.name,
            relationship = %group.projects_relationship,
            packages = self.options.projects.len(),
            dry_run = dry_run.is_dry_run(),
            "Resolving release versions"
        );

        let targets: Vec<AffectedPackage> = self
            .options
            .projects
            .iter()
            .map(|package| AffectedPackage {
                name: package.name.clone(),
                root: self.options.resolve_package_root(package),
            })
            .collect();

        let tag_pattern = TagPattern::new(group.release_tag_pattern.clone());
        let fallback = self.options.effective_fallback();
        let mut tree = ManifestTree::new(&self.workspace_root);
        let mut data = VersionData::new();
        let mut context = ResolutionContext::new(explicit.as_ref());

        for (index, package) in targets.iter().enumerate() {
            if group.is_independent() {
                context = ResolutionContext::new(explicit.as_ref());
            }
            let affected = if group.is_independent() {
                &targets[index..=index]
            } else {
                &targets[..]
            };

            let entry = self
                .version_package(
                    package,
                    affected,
                    &tag_pattern,
                    fallback,
                    &mut context,
                    &mut tree,
                )
                .await?;
            data.insert(package.name.clone(), entry);
        }

        tree.format_files();
        let changed_files = tree.changed_files();

        if dry_run.is_dry_run() {
            for path in &changed_files {
                info!(path = %path.display(), "[dry-run] Would update manifest");
            }
            info!("[dry-run] No changes were written to disk");
        } else {
            tree.flush().await?;
            info!(files = changed_files.len(), "Updated manifests");
        }

        Ok(ReleaseVersionResult {
            data,
            changed_files,
            dry_run,
        })
    }

    async fn version_package(
        &self,
        package: &AffectedPackage,
        affected: &[AffectedPackage],
        tag_pattern: &TagPattern,
        fallback: Option<FallbackCurrentVersionResolver>,
        context: &mut ResolutionContext,
        tree: &mut ManifestTree,
    ) -> Result<VersionDataEntry> {
        let name = package.name.as_str();
        step(name, PackageStep::SelectingRoot);
        let manifest_path = package.root.join(MANIFEST_FILE_NAME);
        let mut manifest = self.load_manifest(name, &manifest_path, tree).await?;

        step(name, PackageStep::ResolvingCurrentVersion);
        self.resolve_current(name, &manifest, tag_pattern, fallback, context)
            .await?;
        let current = context
            .current
            .clone()
            .ok_or_else(|| Error::MissingCurrentVersion {
                package: name.to_string(),
            })?;

        step(name, PackageStep::ResolvingSpecifier);
        if context.specifier.is_unresolved() {
            let request = SpecifierRequest {
                source: self.options.specifier_source,
                group: &self.options.release_group,
                project: name,
                affected,
                current_version_resolver: self.options.current_version_resolver,
                fallback,
                current: &current,
                conventional_commits: &self.options.conventional_commits,
            };
            context.specifier =
                resolve_specifier(&request, self.vcs.as_ref(), self.prompt.as_deref())
                    .await?
                    .into();
        } else if let Some(specifier) = context.specifier.specifier() {
            info!(package = name, %specifier, "Using the previously resolved specifier");
        }

        let current_version = current.version.to_string();
        let Some(specifier) = context.specifier.specifier() else {
            step(name, PackageStep::SkippedNoChange);
            info!(
                package = name,
                current = %current_version,
                "Skipping versioning, no release needed"
            );
            return Ok(VersionDataEntry {
                current_version,
                new_version: None,
                dependents: Vec::new(),
            });
        };

        step(name, PackageStep::DerivingVersion);
        let new_version =
            derive_new_version(&current.version, specifier, self.options.preid.as_deref())?
                .to_string();

        step(name, PackageStep::WritingManifest);
        manifest.set_version(&new_version)?;
        tree.write(manifest_path.clone(), manifest.to_string());
        info!(
            package = name,
            from = %current_version,
            to = %new_version,
            path = %manifest_path.display(),
            "New version written to manifest"
        );

        step(name, PackageStep::Done);
        Ok(VersionDataEntry {
            current_version,
            new_version: Some(new_version),
            dependents: Vec::new(),
        })
    }

    async fn load_manifest(
        &self,
        package: &str,
        manifest_path: &Path,
        tree: &ManifestTree,
    ) -> Result<PyprojectManifest> {
        if !tree.exists(manifest_path).await? {
            return Err(Error::ManifestMissing {
                package: package.to_string(),
                path: manifest_path.to_path_buf(),
            });
        }
        let text = tree.read(manifest_path).await?;
        let manifest = PyprojectManifest::parse(&text, manifest_path)?;
        debug!(
            package,
            project_name = ?manifest.name(),
            path = %manifest_path.display(),
            "Selected manifest"
        );
        Ok(manifest)
    }

    async fn resolve_current(
        &self,
        package: &str,
        manifest: &PyprojectManifest,
        tag_pattern: &TagPattern,
        fallback: Option<FallbackCurrentVersionResolver>,
        context: &mut ResolutionContext,
    ) -> Result<()> {
        let resolver = self.options.current_version_resolver;

        // Tag lookups are shared across a fixed group; disk versions never are.
        if resolver == CurrentVersionResolver::GitTag {
            if let Some(current) = &context.current {
                if current.used_fallback {
                    info!(
                        package,
                        version = %current.version,
                        "Using the current version already resolved from disk fallback"
                    );
                } else {
                    info!(
                        package,
                        version = %current.version,
                        "Using the current version already resolved from git tag"
                    );
                }
                return Ok(());
            }
        }

        let request = CurrentVersionRequest {
            package,
            manifest_path: manifest.path(),
            disk_version: manifest.version(),
            resolver,
            fallback,
            tag_pattern,
        };
        context.current = Some(resolve_current_version(&request, self.vcs.as_ref()).await?);
        Ok(())
    }
}

fn step(package: &str, step: PackageStep) {
    debug!(package, %step, "Package step");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Package, ProjectsRelationship, ReleaseGroup};
    use crate::conventional::ConventionalCommit;
    use crate::vcs::VcsFuture;
    use tempfile::TempDir;

    struct NoGit;

    impl VersionControl for NoGit {
        fn list_tags(&self) -> VcsFuture<'_, Vec<String>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn first_commit(&self) -> VcsFuture<'_, Option<String>> {
            Box::pin(async { Ok(None) })
        }

        fn commits_since<'a>(
            &'a self,
            _since: &'a str,
            _package_roots: &'a [PathBuf],
        ) -> VcsFuture<'a, Vec<ConventionalCommit>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn write_manifest(root: &Path, dir: &str, name: &str, version: &str) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(MANIFEST_FILE_NAME),
            format!("[project]\nname = \"{name}\"\nversion = \"{version}\"\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_package_step_display() {
        assert_eq!(PackageStep::SelectingRoot.to_string(), "selecting-root");
        assert_eq!(PackageStep::SkippedNoChange.to_string(), "skipped-no-change");
        assert_eq!(PackageStep::Done.to_string(), "done");
    }

    #[test]
    fn test_context_starts_from_explicit_specifier() {
        assert!(ResolutionContext::new(None).specifier.is_unresolved());
        let explicit: VersionSpecifier = "minor".parse().unwrap();
        let context = ResolutionContext::new(Some(&explicit));
        assert_eq!(context.specifier.specifier(), Some(&explicit));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = VersionDataEntry {
            current_version: "1.0.0".to_string(),
            new_version: None,
            dependents: Vec::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"currentVersion": "1.0.0", "newVersion": null, "dependents": []})
        );
    }

    #[tokio::test]
    async fn test_explicit_specifier_from_disk() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "packages/api", "api", "1.2.3");

        let options = VersionOptions {
            projects: vec![Package::new("api", "packages/api")],
            specifier: Some("minor".to_string()),
            ..Default::default()
        };
        let result = VersionOrchestrator::new(temp.path(), options)
            .with_vcs(Box::new(NoGit))
            .run()
            .await
            .unwrap();

        let entry = &result.data["api"];
        assert_eq!(entry.current_version, "1.2.3");
        assert_eq!(entry.new_version.as_deref(), Some("1.3.0"));
        assert_eq!(
            result.callback().await.unwrap(),
            vec![PathBuf::from("packages/api/pyproject.toml")]
        );
        let written =
            std::fs::read_to_string(temp.path().join("packages/api/pyproject.toml")).unwrap();
        assert!(written.contains("version = \"1.3.0\""));
    }

    #[tokio::test]
    async fn test_missing_manifest_aborts_before_writing() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "packages/api", "api", "1.0.0");

        let options = VersionOptions {
            projects: vec![
                Package::new("api", "packages/api"),
                Package::new("web", "packages/web"),
            ],
            release_group: ReleaseGroup {
                projects_relationship: ProjectsRelationship::Independent,
                ..Default::default()
            },
            specifier: Some("patch".to_string()),
            ..Default::default()
        };
        let err = VersionOrchestrator::new(temp.path(), options)
            .with_vcs(Box::new(NoGit))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ManifestMissing { ref package, .. } if package == "web"));
        let untouched =
            std::fs::read_to_string(temp.path().join("packages/api/pyproject.toml")).unwrap();
        assert!(untouched.contains("version = \"1.0.0\""));
    }
}
