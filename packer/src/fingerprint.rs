//! Configuration fingerprints and the registry of known adapter variants.
//!
//! A fingerprint identifies an adapter configuration independently of key
//! order and of fields left at an "empty" value. It is the first sixteen hex
//! digits of the SHA-1 of a canonical JSON rendering:
//!
//! 1. Object entries whose value is `null`, `false`, `0`, `""`, `[]` or `{}`
//!    are dropped (recursively through nested objects).
//! 2. Keys are sorted and the document is rendered as
//!    `{"key": value, "other": [1, 2]}` with non-ASCII characters escaped.
//!
//! This rendering matches the `config_id` values the training library writes
//! into `adapter_config.json`, so fingerprints computed here can be compared
//! with the ones found on disk.

use serde_json::{Map, Value, json};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;

/// Number of hex digits kept from the SHA-1 digest.
const FINGERPRINT_LEN: usize = 16;

/// Field of `adapter_config.json` that carries a precomputed fingerprint.
pub const CONFIG_ID_FIELD: &str = "config_id";

/// Field of `adapter_config.json` that holds the nested configuration.
pub const CONFIG_FIELD: &str = "config";

/// A stable, order-independent identifier for an adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    /// Compute the fingerprint of a configuration document.
    ///
    /// # Examples
    ///
    /// ```
    /// use adapterpack_packer::fingerprint::ConfigFingerprint;
    /// use serde_json::json;
    ///
    /// let a = ConfigFingerprint::of(&json!({"reduction_factor": 16, "non_linearity": "relu"}));
    /// let b = ConfigFingerprint::of(&json!({"non_linearity": "relu", "reduction_factor": 16}));
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), 16);
    /// ```
    #[must_use]
    pub fn of(config: &Value) -> Self {
        let canonical = canonical_json(&minimize(config));
        let digest = format!("{:x}", Sha1::digest(canonical.as_bytes()));
        Self(digest.chars().take(FINGERPRINT_LEN).collect())
    }

    /// Wrap a fingerprint read from an artefact's `config_id` field.
    #[must_use]
    pub fn from_config_id(value: &str) -> Self {
        Self(value.trim().to_owned())
    }

    /// Pick the fingerprint for an artefact's configuration fields.
    ///
    /// A non-empty `config_id` wins; otherwise the nested `config` object is
    /// fingerprinted. Returns `None` when neither is present.
    #[must_use]
    pub fn for_artifact(fields: &Map<String, Value>) -> Option<Self> {
        if let Some(id) = fields
            .get(CONFIG_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
        {
            return Some(Self::from_config_id(id));
        }
        fields.get(CONFIG_FIELD).map(Self::of)
    }

    /// Return the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup table from fingerprint to configuration name.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    names: HashMap<ConfigFingerprint, String>,
}

impl ConfigRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every variant in [`known_variants`].
    #[must_use]
    pub fn with_known_variants() -> Self {
        let mut registry = Self::new();
        for (name, config) in known_variants() {
            registry.register(name, &config);
        }
        registry
    }

    /// Register `config` under `name`, returning its fingerprint.
    ///
    /// A later registration with an equal configuration replaces the name.
    pub fn register(&mut self, name: impl Into<String>, config: &Value) -> ConfigFingerprint {
        let fingerprint = ConfigFingerprint::of(config);
        self.names.insert(fingerprint.clone(), name.into());
        fingerprint
    }

    /// Return the name registered for `fingerprint`, if any.
    #[must_use]
    pub fn lookup(&self, fingerprint: &ConfigFingerprint) -> Option<&str> {
        self.names.get(fingerprint).map(String::as_str)
    }

    /// Number of registered variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The adapter configuration variants shipped with the training library.
#[must_use]
pub fn known_variants() -> Vec<(&'static str, Value)> {
    let pfeiffer = json!({
        "original_ln_before": true,
        "original_ln_after": true,
        "residual_before_ln": true,
        "adapter_residual_before_ln": false,
        "ln_before": false,
        "ln_after": false,
        "mh_adapter": false,
        "output_adapter": true,
        "non_linearity": "relu",
        "reduction_factor": 16,
        "inv_adapter": null,
        "inv_adapter_reduction_factor": null,
        "cross_adapter": false,
        "leave_out": [],
    });
    let houlsby = json!({
        "original_ln_before": false,
        "original_ln_after": true,
        "residual_before_ln": true,
        "adapter_residual_before_ln": false,
        "ln_before": false,
        "ln_after": false,
        "mh_adapter": true,
        "output_adapter": true,
        "non_linearity": "swish",
        "reduction_factor": 16,
        "inv_adapter": null,
        "inv_adapter_reduction_factor": null,
        "cross_adapter": false,
        "leave_out": [],
    });
    let with_invertible = |base: &Value| {
        let mut config = base.clone();
        if let Some(map) = config.as_object_mut() {
            map.insert("inv_adapter".to_owned(), json!("nice"));
            map.insert("inv_adapter_reduction_factor".to_owned(), json!(2));
        }
        config
    };
    let pfeiffer_inv = with_invertible(&pfeiffer);
    let houlsby_inv = with_invertible(&houlsby);

    vec![
        ("pfeiffer", pfeiffer),
        ("houlsby", houlsby),
        ("pfeiffer+inv", pfeiffer_inv),
        ("houlsby+inv", houlsby_inv),
    ]
}

/// Drop empty-valued object entries, recursing into nested objects.
///
/// Emptiness is judged on the original value, so a nested object that only
/// becomes empty after its own minimisation is kept as `{}`.
fn minimize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !is_empty_value(v))
                .map(|(k, v)| (k.clone(), minimize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Render `value` with sorted keys, `", "`/`": "` separators and ASCII-only
/// string escapes.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => match n.as_f64().filter(|_| n.is_f64()) {
            Some(float) => out.push_str(&float_literal(float)),
            None => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(key, out);
                out.push_str(": ");
                if let Some(v) = map.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
    }
}

/// Render a float as the training library writes it: shortest round-trip
/// digits, positional between `1e-4` and `1e16`, otherwise `1e-05`/`1e+16`
/// with a signed, two-digit exponent.
fn float_literal(value: f64) -> String {
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let sign = if value.is_sign_negative() { "-" } else { "" };

    if !(-4..16).contains(&exponent) {
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{sign}{mantissa}e{exponent_sign}{:02}",
            exponent.unsigned_abs()
        );
    }
    if exponent < 0 {
        let zeros = "0".repeat(usize::try_from(-exponent - 1).unwrap_or(0));
        return format!("{sign}0.{zeros}{digits}");
    }
    let int_len = usize::try_from(exponent + 1).unwrap_or(0);
    let int_part: String = digits
        .chars()
        .chain(std::iter::repeat('0'))
        .take(int_len)
        .collect();
    let fraction: String = digits.chars().skip(int_len).collect();
    if fraction.is_empty() {
        format!("{sign}{int_part}.0")
    } else {
        format!("{sign}{int_part}.{fraction}")
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_ascii() && c >= ' ' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
