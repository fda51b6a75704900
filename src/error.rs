//! Error types for the `adapterpack` command.
//!
//! Every error here aborts the run. Per-adapter failures never surface as
//! errors; they are reported in the batch summary instead.

use adapterpack_packer::error::SetupError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while reading the session file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The session file could not be read.
    #[error("failed to read session file {path}: {source}")]
    Read {
        /// Path to the session file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The session file is not valid TOML or has unknown keys.
    #[error("invalid session file {path}: {source}")]
    Parse {
        /// Path to the session file.
        path: Utf8PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that end a run with exit code 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// The session file is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run could not start.
    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Result type alias using [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;
