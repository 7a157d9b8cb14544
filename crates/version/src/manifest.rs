//! `pyproject.toml` reading and writing.
//!
//! The manifest is held as a lossless `toml_edit` document. Only
//! `project.name` and `project.version` are exposed as typed fields; every
//! other table, comment and formatting detail passes through untouched.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Formatted, Item, Value};

/// File name of a package manifest.
pub const MANIFEST_FILE_NAME: &str = "pyproject.toml";

/// A parsed `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct PyprojectManifest {
    path: PathBuf,
    doc: DocumentMut,
}

impl PyprojectManifest {
    /// Parse manifest text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] naming `path` if the text is not valid TOML.
    pub fn parse(text: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = text.parse::<DocumentMut>().map_err(|e| {
            Error::manifest(
                format!("Failed to parse {}: {e}", path.display()),
                Some(path.clone()),
            )
        })?;
        Ok(Self { path, doc })
    }

    /// The path the manifest was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `project.name`, if present and a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.project_field("name")
    }

    /// `project.version`, if present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.project_field("version")
    }

    fn project_field(&self, key: &str) -> Option<&str> {
        self.doc
            .get("project")
            .and_then(|project| project.get(key))
            .and_then(Item::as_str)
    }

    /// Replace the value of `project.version`.
    ///
    /// The key keeps its position, surrounding whitespace and trailing
    /// comment; only the string itself changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the `[project]` table is missing or
    /// `project.version` is not a plain string (for example when it is
    /// listed under `dynamic`).
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let path = self.path.clone();
        let project = self
            .doc
            .get_mut("project")
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| {
                Error::manifest(
                    "Manifest is missing the [project] table".to_string(),
                    Some(path.clone()),
                )
            })?;

        match project.get_mut("version") {
            Some(Item::Value(Value::String(existing))) => {
                let decor = existing.decor().clone();
                let mut replacement = is_literal(existing)
                    .then(|| literal_string(version))
                    .flatten()
                    .unwrap_or_else(|| Formatted::new(version.to_string()));
                *replacement.decor_mut() = decor;
                *existing = replacement;
            }
            Some(_) => {
                return Err(Error::manifest(
                    "project.version is not a string".to_string(),
                    Some(path),
                ));
            }
            None => {
                project.insert("version", toml_edit::value(version));
            }
        }

        Ok(())
    }
}

/// Whether the string was written with single quotes.
fn is_literal(value: &Formatted<String>) -> bool {
    value
        .as_repr()
        .and_then(|repr| repr.as_raw().as_str())
        .is_some_and(|raw| raw.starts_with('\''))
}

/// `version` as a single-quoted string, when it can be written as one.
fn literal_string(version: &str) -> Option<Formatted<String>> {
    if version.contains(['\'', '\n', '\r']) {
        return None;
    }
    match format!("'{version}'").parse::<Value>() {
        Ok(Value::String(literal)) => Some(literal),
        _ => None,
    }
}

impl fmt::Display for PyprojectManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.doc, f)
    }
}
