//! Command-line front end for the adapter packaging pipeline.
//!
//! The `adapterpack` binary replaces the questions of an interactive packer
//! with a TOML session file, remembers author details between runs, and
//! reports a batch summary. The packaging itself lives in
//! [`adapterpack_packer`].
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Session file parsing and run settings
//! - [`dirs`] - Platform directory lookup
//! - [`error`] - Fatal error types
//! - [`metadata_cache`] - Author details remembered between runs
//! - [`output`] - Progress and summary text

pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod metadata_cache;
pub mod output;
