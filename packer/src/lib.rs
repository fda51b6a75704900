//! Adapter packaging pipeline.
//!
//! This crate turns trained adapter directories into the files a public
//! adapter registry consumes: a deterministic zip archive and a YAML info
//! card listing the archive's digests. It is used by the `adapterpack` CLI
//! and can be driven programmatically; it never prompts.
//!
//! # Modules
//!
//! - [`artefact`] - Archives, digests, naming and info card synthesis
//! - [`error`] - Per-artefact and setup error types
//! - [`fingerprint`] - Configuration fingerprints and the known-variant registry
//! - [`orchestrator`] - Batch packaging with per-artefact failure isolation
//! - [`scanner`] - Discovery of model and adapter directories

pub mod artefact;
pub mod error;
pub mod fingerprint;
pub mod orchestrator;
pub mod scanner;
