//! Error types for artefact value validation.
//!
//! Each variant identifies the invalid input and the constraint that was
//! violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// A hex digest has the wrong length or contains invalid characters.
    #[error("invalid {algorithm} digest: {reason}")]
    InvalidDigest {
        /// The digest algorithm, e.g. `SHA-256`.
        algorithm: &'static str,
        /// Description of the validation failure.
        reason: String,
    },

    /// An output name component is empty after trimming.
    #[error("output name component `{component}` is empty")]
    EmptyNameComponent {
        /// The field that was empty.
        component: &'static str,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
