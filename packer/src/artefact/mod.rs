//! Archive production, integrity digests and info card synthesis.
//!
//! # Sub-modules
//!
//! - [`archive`] - Deterministic zip archives of artefact directories.
//! - [`digest`] - Validated SHA-1 and SHA-256 hex digest newtypes.
//! - [`error`] - Validation errors for digests and output names.
//! - [`integrity`] - Streaming digest computation and the `files` entry.
//! - [`manifest`] - Info card template, metadata and synthesis.
//! - [`naming`] - Output naming policy (`OutputName`).
//! - [`record`] - Artefact records and caller-resolved fields.
//! - [`template_source`] - Loading the info card template from disk or HTTP.
//! - [`url_template`] - Download URL interpolation.

pub mod archive;
pub mod digest;
pub mod error;
pub mod integrity;
pub mod manifest;
pub mod naming;
pub mod record;
pub mod template_source;
pub mod url_template;
