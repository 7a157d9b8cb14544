//! Error types for release version resolution.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for version resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Every error aborts the run; the category only tells the caller which
/// kind of problem stopped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid options, detected before any manifest is touched.
    Configuration,
    /// A current version or a commit reference could not be determined.
    Resolution,
    /// A manifest could not be parsed or serialized.
    Manifest,
    /// Git or filesystem failure.
    Io,
}

/// Errors that can occur while resolving and applying release versions.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The provided version specifier is neither a version nor a bump keyword.
    #[error("The given version specifier \"{specifier}\" is not valid")]
    #[diagnostic(
        code(pyrelease::version::invalid_specifier),
        help(
            "Provide an exact version or a valid semver keyword such as \"major\", \"minor\", \"patch\", etc."
        )
    )]
    InvalidSpecifier {
        /// The rejected specifier
        specifier: String,
    },

    /// The configured version prefix is not one of the supported values.
    #[error("Invalid value for versionPrefix: \"{prefix}\"")]
    #[diagnostic(code(pyrelease::version::invalid_version_prefix), help("Valid values are: {valid}"))]
    InvalidVersionPrefix {
        /// The rejected prefix
        prefix: String,
        /// The accepted values, pre-formatted for display
        valid: String,
    },

    /// Incompatible or invalid option combination.
    #[error("Release configuration error: {message}")]
    #[diagnostic(code(pyrelease::version::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// A version string could not be parsed.
    #[error("Invalid version: {version}")]
    #[diagnostic(
        code(pyrelease::version::invalid_version),
        help("Version must follow semantic versioning (e.g., 1.0.0, 2.1.0-beta.1)")
    )]
    InvalidVersion {
        /// The invalid version string
        version: String,
    },

    /// The package has no manifest at the resolved location.
    #[error("The project \"{package}\" does not have a pyproject.toml available at {}", path.display())]
    #[diagnostic(
        code(pyrelease::version::manifest_missing),
        help(
            "Add a pyproject.toml at that location, exclude \"{package}\" from the release group, or amend the packageRoot option to point to where the pyproject.toml lives"
        )
    )]
    ManifestMissing {
        /// The package name
        package: String,
        /// The expected manifest path
        path: PathBuf,
    },

    /// A required field is absent from the manifest.
    #[error("The field \"{field}\" is missing from {}", path.display())]
    #[diagnostic(
        code(pyrelease::version::manifest_field_missing),
        help("Add a \"{field}\" entry to the manifest of \"{package}\"")
    )]
    ManifestFieldMissing {
        /// The package name
        package: String,
        /// Dotted path of the missing field
        field: String,
        /// The manifest path
        path: PathBuf,
    },

    /// The manifest could not be parsed or serialized.
    #[error("Manifest error: {message}")]
    #[diagnostic(
        code(pyrelease::version::manifest),
        help("Check that the manifest file is valid TOML")
    )]
    Manifest {
        /// The error message
        message: String,
        /// The manifest file path
        path: Option<PathBuf>,
    },

    /// No git tag matches the release tag pattern and no fallback is configured.
    #[error("No git tags matching pattern \"{pattern}\" for project \"{package}\" were found")]
    #[diagnostic(
        code(pyrelease::version::no_matching_tag),
        help(
            "Create an initial matching tag to use as a base for determining the next version. Alternatively, use the firstRelease option or set fallbackCurrentVersionResolver to \"disk\" to fall back to the version on disk when no matching git tags are found"
        )
    )]
    NoMatchingTag {
        /// The release tag pattern
        pattern: String,
        /// The affected package
        package: String,
    },

    /// No reference point is available for commit analysis.
    #[error("Unable to determine previous version ref for the projects {}", packages.join(", "))]
    #[diagnostic(
        code(pyrelease::version::unresolvable_reference),
        help(
            "Seed a release tag, set fallbackCurrentVersionResolver to \"disk\", or use the firstRelease option"
        )
    )]
    UnresolvableReference {
        /// The packages whose commits were to be analyzed
        packages: Vec<String>,
    },

    /// The current version was never resolved for a package.
    #[error("The current version for project \"{package}\" could not be resolved")]
    #[diagnostic(
        code(pyrelease::version::missing_current_version),
        help("Seed a release tag, set fallbackCurrentVersionResolver to \"disk\", or use the firstRelease option")
    )]
    MissingCurrentVersion {
        /// The package name
        package: String,
    },

    /// Git operation error.
    #[error("Git error: {message}")]
    #[diagnostic(
        code(pyrelease::version::git),
        help("Ensure you are in a git repository and have the necessary permissions")
    )]
    Git {
        /// The error message
        message: String,
    },

    /// The interactive prompt failed or was aborted.
    #[error("Prompt failed: {message}")]
    #[diagnostic(code(pyrelease::version::prompt))]
    Prompt {
        /// The error message
        message: String,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(pyrelease::version::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(pyrelease::version::json))]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new invalid specifier error.
    #[must_use]
    pub fn invalid_specifier(specifier: impl Into<String>) -> Self {
        Self::InvalidSpecifier {
            specifier: specifier.into(),
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a new manifest error.
    #[must_use]
    pub fn manifest(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Manifest {
            message: message.into(),
            path,
        }
    }

    /// Create a new missing-field error.
    #[must_use]
    pub fn field_missing(
        package: impl Into<String>,
        field: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::ManifestFieldMissing {
            package: package.into(),
            field: field.into(),
            path: path.into(),
        }
    }

    /// Create a new git error.
    #[must_use]
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a new prompt error.
    #[must_use]
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Which bucket of the error taxonomy this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSpecifier { .. }
            | Self::InvalidVersionPrefix { .. }
            | Self::Config { .. }
            | Self::Json(_) => ErrorCategory::Configuration,
            Self::InvalidVersion { .. }
            | Self::ManifestMissing { .. }
            | Self::ManifestFieldMissing { .. }
            | Self::NoMatchingTag { .. }
            | Self::UnresolvableReference { .. }
            | Self::MissingCurrentVersion { .. }
            | Self::Prompt { .. } => ErrorCategory::Resolution,
            Self::Manifest { .. } => ErrorCategory::Manifest,
            Self::Git { .. } | Self::Io(_) => ErrorCategory::Io,
        }
    }
}
