//! Release tag patterns and lookup.
//!
//! A tag pattern such as `{projectName}@{version}` or `v{version}` is used
//! both to recognise release tags and to pull the version back out of them.

use crate::error::{Error, Result};
use crate::vcs::VersionControl;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

const VERSION_PLACEHOLDER: &str = "{version}";
const PROJECT_NAME_PLACEHOLDER: &str = "{projectName}";

// Semver core with optional prerelease and build metadata.
const SEMVER_PATTERN: &str = r"(\d+\.\d+\.\d+(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?)";

/// A release tag and the version embedded in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMatch {
    /// The full tag name.
    pub tag: String,
    /// The version extracted from the tag.
    pub extracted_version: String,
}

/// A release tag template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    template: String,
}

impl TagPattern {
    /// Create a pattern from its template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Build the anchored regex matching tags for `project_name`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the template has no `{version}`
    /// placeholder.
    pub fn to_regex(&self, project_name: &str) -> Result<Regex> {
        let Some((before, after)) = self.template.split_once(VERSION_PLACEHOLDER) else {
            return Err(Error::config(
                format!(
                    "Release tag pattern \"{}\" has no {VERSION_PLACEHOLDER} placeholder",
                    self.template
                ),
                "Add {version} to releaseTagPattern, e.g. \"v{version}\" or \"{projectName}@{version}\"",
            ));
        };
        let literal = |part: &str| regex::escape(&part.replace(PROJECT_NAME_PLACEHOLDER, project_name));
        let source = format!("^{}{SEMVER_PATTERN}{}$", literal(before), literal(after));
        Regex::new(&source).map_err(|e| {
            Error::config(
                format!("Release tag pattern \"{}\" is invalid: {e}", self.template),
                "Check the releaseTagPattern option",
            )
        })
    }

    /// Pick the first tag in `tags` that matches this pattern.
    ///
    /// `tags` is expected newest first, as returned by
    /// [`VersionControl::list_tags`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    pub fn find_latest<S: AsRef<str>>(
        &self,
        tags: &[S],
        project_name: &str,
    ) -> Result<Option<TagMatch>> {
        let regex = self.to_regex(project_name)?;
        Ok(tags.iter().find_map(|tag| {
            let tag = tag.as_ref();
            regex.captures(tag).and_then(|caps| {
                caps.get(1).map(|version| TagMatch {
                    tag: tag.to_string(),
                    extracted_version: version.as_str().to_string(),
                })
            })
        }))
    }
}

impl From<&str> for TagPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Find the most recent tag matching `pattern` for `project_name`.
///
/// # Errors
///
/// Returns an error if the tags cannot be listed or the pattern is invalid.
pub async fn latest_tag_for_pattern(
    vcs: &dyn VersionControl,
    pattern: &TagPattern,
    project_name: &str,
) -> Result<Option<TagMatch>> {
    let tags = vcs.list_tags().await?;
    let found = pattern.find_latest(&tags, project_name)?;
    debug!(
        pattern = pattern.as_str(),
        project = project_name,
        candidates = tags.len(),
        tag = ?found.as_ref().map(|m| &m.tag),
        "Searched release tags"
    );
    Ok(found)
}
