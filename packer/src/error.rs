//! Error types for the packaging pipeline.
//!
//! [`PackError`] covers everything that can go wrong while packaging a single
//! artefact. The orchestrator records these against the artefact and carries
//! on with the batch. [`SetupError`] covers the failures that make the whole
//! run pointless, such as an unreadable manifest template, and aborts before
//! any artefact is touched.

use crate::artefact::error::ArtefactError;
use crate::artefact::template_source::FetchError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while packaging one artefact.
#[derive(Debug, Error)]
pub enum PackError {
    /// A file or directory could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artefact's configuration file is not a valid JSON object.
    #[error("invalid adapter configuration {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A configuration field required by the manifest is absent.
    #[error("missing required configuration field `{field}`")]
    MissingField {
        /// Dotted path of the missing field, e.g. `config.non_linearity`.
        field: String,
    },

    /// The download URL template references an unknown field or is malformed.
    #[error("cannot resolve URL template \"{template}\": {reason}")]
    TemplateResolution {
        /// The template being interpolated.
        template: String,
        /// Description of the failure.
        reason: String,
    },

    /// The configuration fingerprint matches no known variant and no name
    /// was supplied for it.
    #[error("unknown adapter configuration {fingerprint}; supply a config name for it")]
    UnknownConfigFingerprint {
        /// The unmatched fingerprint.
        fingerprint: String,
    },

    /// The artefact directory holds no regular files to archive.
    #[error("no files to archive in {path}")]
    EmptyArtifact {
        /// The empty artefact directory.
        path: PathBuf,
    },

    /// Another artefact in the same batch already claimed this output name.
    #[error("output name \"{name}\" is already used by another artefact in this batch")]
    OutputCollision {
        /// The contested output name.
        name: String,
    },

    /// Writing the zip container failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The manifest could not be serialized.
    #[error("manifest serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// A digest or output name component failed validation.
    #[error(transparent)]
    Validation(#[from] ArtefactError),
}

impl PackError {
    /// Build an [`PackError::Io`] that records the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`PackError::MissingField`] for a dotted field path.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Errors that abort a packaging run before any artefact is processed.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The local manifest template does not exist.
    #[error("manifest template not found at {path}")]
    TemplateNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The local manifest template could not be read.
    #[error("failed to read manifest template {path}: {source}")]
    TemplateRead {
        /// Path to the template.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The remote manifest template could not be fetched.
    #[error("failed to fetch manifest template: {0}")]
    TemplateFetch(#[from] FetchError),

    /// The template is not a YAML mapping.
    #[error("invalid manifest template: {reason}")]
    InvalidTemplate {
        /// Description of the parse failure.
        reason: String,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`PackError`].
pub type Result<T> = std::result::Result<T, PackError>;
