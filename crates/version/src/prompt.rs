//! Interactive specifier prompt seam.
//!
//! The engine never renders a prompt itself. Callers plug in a terminal UI
//! (or a scripted answer) through [`SpecifierPrompt`].

use crate::config::ReleaseGroup;
use crate::error::Result;
use crate::specifier::VersionSpecifier;
use std::future::Future;
use std::pin::Pin;

/// The two questions shown to the user: pick a bump kind, or type an exact
/// version when "custom" is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Question asking for the kind of change.
    pub kind_question: String,
    /// Question asking for an exact version.
    pub exact_question: String,
}

impl PromptRequest {
    /// Questions for a single independently versioned package.
    #[must_use]
    pub fn for_project(group: &ReleaseGroup, project: &str) -> Self {
        Self {
            kind_question: format!(
                "{}?",
                with_group(group, &format!("What kind of change is this for project \"{project}\""))
            ),
            exact_question: format!(
                "{}?",
                with_group(group, &format!("What is the exact version for project \"{project}\""))
            ),
        }
    }

    /// Questions for every package of a fixed group at once.
    #[must_use]
    pub fn for_group(group: &ReleaseGroup, project_count: usize) -> Self {
        Self {
            kind_question: format!(
                "{}?",
                with_group(
                    group,
                    &format!("What kind of change is this for the {project_count} matched project(s)")
                )
            ),
            exact_question: format!(
                "{}?",
                with_group(
                    group,
                    &format!("What is the exact version for the {project_count} matched project(s)")
                )
            ),
        }
    }
}

// The implicit group name is noise, so it is left out.
fn with_group(group: &ReleaseGroup, question: &str) -> String {
    if group.is_implicit_default() {
        question.to_string()
    } else {
        format!("{question} within release group \"{}\"", group.name)
    }
}

/// Source of interactively chosen specifiers.
pub trait SpecifierPrompt: Send + Sync {
    /// Ask the user for a specifier. Blocks the run until answered.
    fn ask<'a>(
        &'a self,
        request: &'a PromptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<VersionSpecifier>> + Send + 'a>>;
}
