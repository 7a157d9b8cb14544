//! Release version resolution for Python packages in a monorepo.
//!
//! Given a set of packages, each with a `pyproject.toml`, this crate decides
//! the next version of every package and writes it back to the manifest
//! without disturbing formatting.
//!
//! # Features
//!
//! - **Current versions** from `project.version` or from the latest matching
//!   git tag, with an optional fallback to the manifest
//! - **Specifiers** from conventional commits since the last release, from an
//!   interactive prompt, or given explicitly
//! - **Release groups** that version packages together (`fixed`) or one by
//!   one (`independent`)
//! - **Lossless manifest edits** through `toml_edit`
//! - **Dry runs** that resolve everything and write nothing
//!
//! # Architecture
//!
//! - [`orchestrator`] - the per-package pipeline and the version report
//! - [`current_version`] - baseline resolution from disk or git tags
//! - [`specifier_resolver`] - bump resolution from commits or prompts
//! - [`version`] - semver arithmetic
//! - [`manifest`] - `pyproject.toml` reading and writing
//! - [`vcs`] - git access behind the [`VersionControl`] trait
//! - [`config`] - caller options
//!
//! # Example
//!
//! ```rust,ignore
//! use pyrelease_version::{Package, VersionOptions, VersionOrchestrator};
//!
//! let options = VersionOptions {
//!     projects: vec![Package::new("api", "packages/api")],
//!     specifier: Some("minor".to_string()),
//!     ..Default::default()
//! };
//! let result = VersionOrchestrator::new(".", options).run().await?;
//! println!("{:?}", result.data["api"].new_version);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod commit_analyzer;
pub mod config;
pub mod conventional;
pub mod current_version;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod prompt;
pub mod specifier;
pub mod specifier_resolver;
pub mod tag;
pub mod tree;
pub mod vcs;
pub mod version;

// Re-export main types
pub use config::{
    ConventionalCommitsConfig, CurrentVersionResolver, DryRun, FallbackCurrentVersionResolver,
    Package, ProjectsRelationship, ReleaseGroup, SpecifierSource, VersionOptions,
};
pub use conventional::ConventionalCommit;
pub use current_version::CurrentVersion;
pub use error::{Error, ErrorCategory, Result};
pub use manifest::PyprojectManifest;
pub use orchestrator::{ReleaseVersionResult, VersionData, VersionDataEntry, VersionOrchestrator};
pub use prompt::{PromptRequest, SpecifierPrompt};
pub use specifier::{BumpKind, SpecifierResolution, VersionSpecifier};
pub use tag::{TagMatch, TagPattern};
pub use vcs::{GitRepository, VersionControl};
