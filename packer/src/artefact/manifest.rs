//! Info card manifests for the adapter registry.
//!
//! A manifest starts as a copy of the registry's template. Artefact fields
//! whose keys the template already defines are copied in, then the fields
//! the pipeline owns (`files`, `default_version`, `config`,
//! `prediction_head`) are set, and finally the session metadata is written
//! over the top. The template defines the schema: artefact fields it does
//! not know are dropped, while session metadata is always written.

use super::integrity::{IntegrityDigests, IntegrityRecord};
use super::record::{ArtifactRecord, CONFIG_NAME_FIELD};
use super::url_template::{self, PLACEHOLDER_URL};
use crate::error::{PackError, Result, SetupError};
use crate::fingerprint::CONFIG_FIELD;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Manifest key listing the downloadable archives.
pub const FILES_KEY: &str = "files";
/// Manifest key naming the version installed by default.
pub const DEFAULT_VERSION_KEY: &str = "default_version";
/// Manifest key flagging a bundled prediction head.
pub const PREDICTION_HEAD_KEY: &str = "prediction_head";
/// Key of the configuration name inside the `config` block.
pub const USING_KEY: &str = "using";
/// Nested configuration field holding the activation function.
pub const NON_LINEARITY_KEY: &str = "non_linearity";
/// Nested configuration field holding the bottleneck reduction factor.
pub const REDUCTION_FACTOR_KEY: &str = "reduction_factor";

/// The registry's info card template.
///
/// Read-only once loaded; [`synthesize`] works on a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestTemplate(Mapping);

impl ManifestTemplate {
    /// Parse a template from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidTemplate`] unless the document is a
    /// YAML mapping.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, SetupError> {
        match serde_yaml::from_str::<Value>(text) {
            Ok(Value::Mapping(mapping)) => Ok(Self(mapping)),
            Ok(_) => Err(SetupError::InvalidTemplate {
                reason: "expected a mapping at the top level".to_owned(),
            }),
            Err(err) => Err(SetupError::InvalidTemplate {
                reason: err.to_string(),
            }),
        }
    }

    /// Wrap an existing mapping.
    #[must_use]
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    /// Returns true if the template defines a top-level `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// Author details written into every info card of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    /// Name of the author or authors.
    pub author: String,
    /// Contact email address.
    pub email: String,
    /// Homepage of the author or their work.
    pub url: Option<String>,
    /// Twitter handle.
    pub twitter: Option<String>,
    /// GitHub account.
    pub github: Option<String>,
}

impl MetadataRecord {
    /// The fields to write, in info card order.
    ///
    /// Author and email are always present; optional fields are skipped
    /// when unset or blank.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("author", self.author.as_str()), ("email", self.email.as_str())];
        let optional = [
            ("url", &self.url),
            ("twitter", &self.twitter),
            ("github", &self.github),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                fields.push((key, value));
            }
        }
        fields
    }
}

/// A finished info card.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument(Mapping);

impl ManifestDocument {
    /// Return the value stored under a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Return the underlying mapping.
    #[must_use]
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Serialize the card to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Serialization`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Parse a card previously written by [`Self::to_yaml`].
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Serialization`] if the text is not a YAML
    /// mapping.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(Self(serde_yaml::from_str(text)?))
    }
}

/// Everything [`synthesize`] combines into one info card.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    /// The shared template.
    pub template: &'a ManifestTemplate,
    /// The artefact being described.
    pub artifact: &'a ArtifactRecord,
    /// Session metadata, if any was collected.
    pub metadata: Option<&'a MetadataRecord>,
    /// Digests of the packaged archive.
    pub digests: &'a IntegrityDigests,
    /// Version label of the archive.
    pub version: &'a str,
    /// Download URL template, if configured.
    pub url_template: Option<&'a str>,
    /// Base name of the archive file, bound to `{file}`.
    pub archive_file_name: &'a str,
}

/// Build the info card for one artefact.
///
/// # Errors
///
/// Returns [`PackError::TemplateResolution`] if the URL template cannot be
/// filled, [`PackError::MissingField`] if the configuration name or the
/// nested `config` fields are absent, and [`PackError::Serialization`] if
/// an artefact field cannot be represented in YAML.
pub fn synthesize(input: SynthesisInput<'_>) -> Result<ManifestDocument> {
    let fields = input.artifact.config_fields();
    let mut card = input.template.0.clone();

    for (key, value) in fields {
        if key != CONFIG_FIELD && card.contains_key(key.as_str()) {
            card.insert(Value::from(key.as_str()), serde_yaml::to_value(value)?);
        }
    }

    let url = match input.url_template {
        Some(template) => url_template::render(template, input.archive_file_name, fields)?,
        None => PLACEHOLDER_URL.to_owned(),
    };
    let record = IntegrityRecord::new(input.version, url, input.digests.clone());
    card.insert(
        Value::from(FILES_KEY),
        Value::Sequence(vec![serde_yaml::to_value(&record)?]),
    );
    card.insert(Value::from(DEFAULT_VERSION_KEY), Value::from(input.version));
    card.insert(Value::from(CONFIG_FIELD), config_block(input.artifact)?);
    card.insert(
        Value::from(PREDICTION_HEAD_KEY),
        Value::Bool(input.artifact.has_prediction_head()),
    );

    if let Some(metadata) = input.metadata {
        for (key, value) in metadata.fields() {
            card.insert(Value::from(key), Value::from(value));
        }
    }

    Ok(ManifestDocument(card))
}

/// Build the `config` block from the configuration name and the two
/// nested fields the registry displays.
fn config_block(artifact: &ArtifactRecord) -> Result<Value> {
    let using = artifact.text_field(CONFIG_NAME_FIELD)?;
    let nested = artifact
        .config_fields()
        .get(CONFIG_FIELD)
        .ok_or_else(|| PackError::missing_field(CONFIG_FIELD))?;
    let sub_field = |name: &str| {
        nested
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| PackError::missing_field(format!("{CONFIG_FIELD}.{name}")))
    };
    let non_linearity = sub_field(NON_LINEARITY_KEY)?;
    let reduction_factor = sub_field(REDUCTION_FACTOR_KEY)?;

    let mut block = Mapping::new();
    block.insert(Value::from(USING_KEY), Value::from(using));
    block.insert(
        Value::from(NON_LINEARITY_KEY),
        serde_yaml::to_value(non_linearity)?,
    );
    block.insert(
        Value::from(REDUCTION_FACTOR_KEY),
        serde_yaml::to_value(reduction_factor)?,
    );
    Ok(Value::Mapping(block))
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
