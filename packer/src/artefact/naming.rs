//! Output naming policy for packaged adapters.
//!
//! Archives and info cards share one stem built from the model name, task,
//! subtask and configuration name:
//! `<model_name>_<task>_<subtask>_<config_name>.{zip,yaml}`. Characters that
//! are unsafe in file names are replaced with `-`, so the same artefact
//! always maps to the same pair of files.

use super::archive::ARCHIVE_EXTENSION;
use super::error::{ArtefactError, Result};
use std::fmt;

/// File extension of info card manifests, without the leading dot.
pub const MANIFEST_EXTENSION: &str = "yaml";

/// Replacement for path-unsafe characters.
const SAFE_SUBSTITUTE: char = '-';

/// The components an output name is derived from.
#[derive(Debug, Clone, Copy)]
pub struct NameParts<'a> {
    /// Identifier of the pre-trained model, e.g. `bert-base-uncased`.
    pub model_name: &'a str,
    /// Task identifier, e.g. `sst`.
    pub task: &'a str,
    /// Subtask identifier, e.g. `sst-2`.
    pub subtask: &'a str,
    /// Resolved adapter configuration name, e.g. `pfeiffer`.
    pub config_name: &'a str,
}

/// A sanitized output file stem.
///
/// # Examples
///
/// ```
/// use adapterpack_packer::artefact::naming::{NameParts, OutputName};
///
/// let name = OutputName::new(NameParts {
///     model_name: "facebook/bart-base",
///     task: "sst",
///     subtask: "sst-2",
///     config_name: "pfeiffer",
/// })
/// .expect("all parts present");
/// assert_eq!(name.as_str(), "facebook-bart-base_sst_sst-2_pfeiffer");
/// assert_eq!(name.archive_filename(), "facebook-bart-base_sst_sst-2_pfeiffer.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputName(String);

impl OutputName {
    /// Join and sanitize the name components.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::EmptyNameComponent`] when a component is
    /// blank, which would otherwise produce ambiguous names.
    pub fn new(parts: NameParts<'_>) -> Result<Self> {
        let components = [
            ("model_name", parts.model_name),
            ("task", parts.task),
            ("subtask", parts.subtask),
            ("config_name", parts.config_name),
        ];
        if let Some(&(component, _)) = components.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ArtefactError::EmptyNameComponent { component });
        }

        let joined = components
            .iter()
            .map(|(_, value)| value.trim())
            .collect::<Vec<_>>()
            .join("_");
        Ok(Self(sanitize(&joined)))
    }

    /// Return the stem as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the archive, e.g. `<stem>.zip`.
    #[must_use]
    pub fn archive_filename(&self) -> String {
        format!("{}.{ARCHIVE_EXTENSION}", self.0)
    }

    /// File name of the info card, e.g. `<stem>.yaml`.
    #[must_use]
    pub fn manifest_filename(&self) -> String {
        format!("{}.{MANIFEST_EXTENSION}", self.0)
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replace characters that cannot appear in a portable file name.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => SAFE_SUBSTITUTE,
            c if c.is_control() => SAFE_SUBSTITUTE,
            c => c,
        })
        .collect()
}
