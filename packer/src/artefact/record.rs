//! Artefact records: an adapter directory's configuration plus the fields
//! the surrounding tool resolved for it.
//!
//! The record is read once from `adapter_config.json`, overlaid with the
//! caller's [`ResolvedFields`], and not changed afterwards.

use crate::error::{PackError, Result};
use crate::fingerprint::{ConfigFingerprint, ConfigRegistry};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file saved next to every adapter.
pub const ADAPTER_CONFIG_NAME: &str = "adapter_config.json";

/// Prediction head configuration; its presence marks a bundled head.
pub const HEAD_CONFIG_NAME: &str = "head_config.json";

/// Field holding the adapter type (`text_task` or `text_lang`).
pub const TYPE_FIELD: &str = "type";
/// Field holding the task identifier.
pub const TASK_FIELD: &str = "task";
/// Field holding the subtask identifier.
pub const SUBTASK_FIELD: &str = "subtask";
/// Field holding the resolved configuration name.
pub const CONFIG_NAME_FIELD: &str = "config_name";
/// Field holding the pre-trained model identifier.
pub const MODEL_NAME_FIELD: &str = "model_name";

/// Per-artefact values supplied by the caller instead of an interactive
/// prompt.
///
/// `task`, `subtask` and `config_name` replace whatever the artefact
/// configuration holds. `adapter_type` and `model_name` only fill gaps, as
/// the configuration is the better source for them when it has them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedFields {
    /// Adapter type, used when the configuration has none.
    #[serde(rename = "type")]
    pub adapter_type: Option<String>,
    /// Task identifier.
    pub task: Option<String>,
    /// Subtask identifier.
    pub subtask: Option<String>,
    /// Configuration name; overrides the registry lookup.
    pub config_name: Option<String>,
    /// Pre-trained model identifier, used when the configuration has none.
    pub model_name: Option<String>,
}

impl ResolvedFields {
    /// Merge two field sets, preferring values from `overrides`.
    #[must_use]
    pub fn overlaid_with(&self, overrides: &Self) -> Self {
        let pick = |own: &Option<String>, other: &Option<String>| {
            other.clone().or_else(|| own.clone())
        };
        Self {
            adapter_type: pick(&self.adapter_type, &overrides.adapter_type),
            task: pick(&self.task, &overrides.task),
            subtask: pick(&self.subtask, &overrides.subtask),
            config_name: pick(&self.config_name, &overrides.config_name),
            model_name: pick(&self.model_name, &overrides.model_name),
        }
    }
}

/// An adapter directory ready for packaging.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRecord {
    root_path: PathBuf,
    config_fields: Map<String, Value>,
    has_prediction_head: bool,
}

impl ArtifactRecord {
    /// Build a record from already-parsed configuration fields.
    #[must_use]
    pub fn new(
        root_path: impl Into<PathBuf>,
        config_fields: Map<String, Value>,
        has_prediction_head: bool,
    ) -> Self {
        Self {
            root_path: root_path.into(),
            config_fields,
            has_prediction_head,
        }
    }

    /// Load the record for `dir`, overlay `resolved`, and settle the
    /// configuration name.
    ///
    /// When `resolved` carries no configuration name, the artefact's
    /// fingerprint is looked up in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] if `adapter_config.json` cannot be read,
    /// [`PackError::InvalidConfig`] if it is not a JSON object, and
    /// [`PackError::UnknownConfigFingerprint`] when no configuration name
    /// can be determined.
    pub fn load(dir: &Path, resolved: &ResolvedFields, registry: &ConfigRegistry) -> Result<Self> {
        let mut fields = read_config(dir)?;
        apply_resolved(&mut fields, resolved);

        if !has_text(&fields, CONFIG_NAME_FIELD) {
            let name = resolve_config_name(&fields, registry)?;
            debug!("{} uses known configuration {name}", dir.display());
            fields.insert(CONFIG_NAME_FIELD.to_owned(), Value::String(name));
        }

        let has_prediction_head = dir.join(HEAD_CONFIG_NAME).is_file();
        Ok(Self::new(dir, fields, has_prediction_head))
    }

    /// Directory holding the artefact's files.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Merged configuration fields.
    #[must_use]
    pub fn config_fields(&self) -> &Map<String, Value> {
        &self.config_fields
    }

    /// Whether a prediction head configuration ships with the adapter.
    #[must_use]
    pub fn has_prediction_head(&self) -> bool {
        self.has_prediction_head
    }

    /// Return a top-level string field.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::MissingField`] if the field is absent, blank or
    /// not a string.
    pub fn text_field(&self, field: &str) -> Result<&str> {
        self.config_fields
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PackError::missing_field(field))
    }
}

fn read_config(dir: &Path) -> Result<Map<String, Value>> {
    let path = dir.join(ADAPTER_CONFIG_NAME);
    let content = fs::read_to_string(&path).map_err(|e| PackError::io(&path, e))?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(PackError::InvalidConfig {
            path,
            reason: "expected a JSON object".to_owned(),
        }),
        Err(err) => Err(PackError::InvalidConfig {
            path,
            reason: err.to_string(),
        }),
    }
}

fn apply_resolved(fields: &mut Map<String, Value>, resolved: &ResolvedFields) {
    let mut set = |key: &str, value: &Option<String>, only_if_missing: bool| {
        let Some(value) = value else { return };
        if only_if_missing && has_text(fields, key) {
            return;
        }
        fields.insert(key.to_owned(), Value::String(value.clone()));
    };
    set(TYPE_FIELD, &resolved.adapter_type, true);
    set(TASK_FIELD, &resolved.task, false);
    set(SUBTASK_FIELD, &resolved.subtask, false);
    set(CONFIG_NAME_FIELD, &resolved.config_name, false);
    set(MODEL_NAME_FIELD, &resolved.model_name, true);
}

fn resolve_config_name(fields: &Map<String, Value>, registry: &ConfigRegistry) -> Result<String> {
    let fingerprint = ConfigFingerprint::for_artifact(fields)
        .ok_or_else(|| PackError::missing_field(crate::fingerprint::CONFIG_FIELD))?;
    registry
        .lookup(&fingerprint)
        .map(str::to_owned)
        .ok_or_else(|| PackError::UnknownConfigFingerprint {
            fingerprint: fingerprint.to_string(),
        })
}

fn has_text(fields: &Map<String, Value>, key: &str) -> bool {
    fields
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
