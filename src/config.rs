//! Session configuration.
//!
//! A session file replaces the questions an interactive packer would ask. It
//! is TOML with these tables, all optional:
//!
//! ```toml
//! output_dir = "dist"
//! version = "1"
//!
//! [metadata]
//! author = "Jane Doe"
//! email = "jane@example.org"
//! url_template = "https://example.org/adapters/{file}"
//!
//! [defaults]
//! task = "sst"
//! subtask = "sst-2"
//!
//! [adapters."checkpoints/bert-sst"]
//! config_name = "pfeiffer"
//! ```
//!
//! [`RunSettings::resolve`] combines the file with the command-line flags;
//! flags win.

use crate::cli::Cli;
use crate::error::ConfigError;
use adapterpack_packer::artefact::manifest::MetadataRecord;
use adapterpack_packer::artefact::record::ResolvedFields;
use adapterpack_packer::artefact::template_source::TemplateSource;
use adapterpack_packer::scanner::WeightsFileNames;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output directory used when neither flag nor file names one.
pub const DEFAULT_OUTPUT_DIR: &str = ".PACK_OUTPUT";

/// Version label used when neither flag nor file names one.
pub const DEFAULT_VERSION: &str = "1";

/// Contents of a session file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackConfig {
    /// Directory receiving archives and info cards.
    pub output_dir: Option<Utf8PathBuf>,
    /// Local info card template.
    pub template: Option<Utf8PathBuf>,
    /// Version label of the produced archives.
    pub version: Option<String>,
    /// Whether to look for full model checkpoints. Defaults to true.
    pub extract_from_models: Option<bool>,
    /// Overrides for the weights file names.
    pub weights: WeightsConfig,
    /// Author details and the download URL template.
    pub metadata: MetadataConfig,
    /// Fields applied to every adapter.
    pub defaults: ResolvedFields,
    /// Fields for individual adapters, keyed by directory.
    pub adapters: BTreeMap<String, ResolvedFields>,
}

impl PackConfig {
    /// Parse a session file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid session file.
    pub fn load_from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parse session TOML from a string.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Resolved fields for the adapter in `dir`.
    ///
    /// Starts from `[defaults]` and overlays the `[adapters]` entry whose
    /// key matches the end of `dir` component-wise. When several keys
    /// match, the one with the most components wins.
    #[must_use]
    pub fn fields_for(&self, dir: &Path) -> ResolvedFields {
        let specific = self
            .adapters
            .iter()
            .filter(|(key, _)| dir.ends_with(Path::new(key.as_str())))
            .max_by_key(|(key, _)| Path::new(key.as_str()).components().count());
        match specific {
            Some((_, fields)) => self.defaults.overlaid_with(fields),
            None => self.defaults.clone(),
        }
    }
}

/// Weights file name overrides.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WeightsConfig {
    /// File marking a full model checkpoint.
    pub model: Option<String>,
    /// File marking an adapter.
    pub adapter: Option<String>,
}

impl WeightsConfig {
    /// File names to scan for, falling back to the framework defaults.
    #[must_use]
    pub fn file_names(&self) -> WeightsFileNames {
        let defaults = WeightsFileNames::default();
        WeightsFileNames {
            model: self.model.clone().unwrap_or(defaults.model),
            adapter: self.adapter.clone().unwrap_or(defaults.adapter),
        }
    }
}

/// Author details as written in the session file and the metadata cache.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Name of the author or authors.
    pub author: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
    /// Homepage of the author or their work.
    pub url: Option<String>,
    /// Twitter handle.
    pub twitter: Option<String>,
    /// GitHub account.
    pub github: Option<String>,
    /// Download URL template for the archives.
    #[serde(alias = "adapter_url_template")]
    pub url_template: Option<String>,
}

impl MetadataConfig {
    /// Fill fields left blank here from `fallback`.
    #[must_use]
    pub fn filled_from(&self, fallback: &Self) -> Self {
        let pick = |own: &Option<String>, other: &Option<String>| {
            non_blank(own).or_else(|| non_blank(other)).map(str::to_owned)
        };
        Self {
            author: pick(&self.author, &fallback.author),
            email: pick(&self.email, &fallback.email),
            url: pick(&self.url, &fallback.url),
            twitter: pick(&self.twitter, &fallback.twitter),
            github: pick(&self.github, &fallback.github),
            url_template: pick(&self.url_template, &fallback.url_template),
        }
    }

    /// Returns true when every field is unset or blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled_from(&Self::default()) == Self::default()
    }

    /// The metadata written into info cards.
    ///
    /// `None` when neither author nor email is known, in which case the
    /// template's values are kept.
    #[must_use]
    pub fn record(&self) -> Option<MetadataRecord> {
        let author = non_blank(&self.author);
        let email = non_blank(&self.email);
        if author.is_none() && email.is_none() {
            return None;
        }
        Some(MetadataRecord {
            author: author.unwrap_or_default().to_owned(),
            email: email.unwrap_or_default().to_owned(),
            url: non_blank(&self.url).map(str::to_owned),
            twitter: non_blank(&self.twitter).map(str::to_owned),
            github: non_blank(&self.github).map(str::to_owned),
        })
    }

    /// The download URL template, if set.
    #[must_use]
    pub fn url_template(&self) -> Option<&str> {
        non_blank(&self.url_template)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Settings for one run, after combining flags and the session file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSettings {
    /// Roots to scan.
    pub inputs: Vec<PathBuf>,
    /// Directory receiving archives and info cards.
    pub output_dir: PathBuf,
    /// Where the info card template comes from.
    pub template: TemplateSource,
    /// Version label of the produced archives.
    pub version: String,
    /// Whether full model checkpoints are looked for.
    pub include_models: bool,
    /// Report only; package nothing.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

impl RunSettings {
    /// Combine `cli` with `config`, preferring the command line.
    #[must_use]
    pub fn resolve(cli: &Cli, config: &PackConfig) -> Self {
        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
        let template = cli
            .template
            .clone()
            .or_else(|| config.template.clone())
            .map_or_else(TemplateSource::default, |path| {
                TemplateSource::Local(path.into_std_path_buf())
            });
        let version = cli
            .version
            .clone()
            .or_else(|| config.version.clone())
            .unwrap_or_else(|| DEFAULT_VERSION.to_owned());

        Self {
            inputs: cli.paths.iter().map(|p| p.clone().into_std_path_buf()).collect(),
            output_dir: output_dir.into_std_path_buf(),
            template,
            version,
            include_models: config.extract_from_models.unwrap_or(true) && !cli.no_extract,
            dry_run: cli.dry_run,
            quiet: cli.quiet,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
