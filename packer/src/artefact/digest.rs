//! Hex digest newtypes for archive integrity records.
//!
//! Both types validate that the value is a lowercase hexadecimal string of
//! the algorithm's fixed length, which is the exact form the registry
//! manifest expects.

use super::error::{ArtefactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected length of a hex-encoded SHA-1 digest.
const SHA1_HEX_LEN: usize = 40;

/// Expected length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// A validated hex-encoded SHA-1 digest string.
///
/// # Examples
///
/// ```
/// use adapterpack_packer::artefact::digest::Sha1Digest;
///
/// let hex = "a".repeat(40);
/// let digest: Sha1Digest = hex.as_str().try_into().expect("valid digest");
/// assert_eq!(digest.as_str().len(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha1Digest(String);

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use adapterpack_packer::artefact::digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest: Sha256Digest = hex.as_str().try_into().expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

macro_rules! hex_digest_impls {
    ($name:ident, $algorithm:literal, $len:expr) => {
        impl $name {
            /// Return the digest as a hex string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ArtefactError;

            fn try_from(value: &str) -> Result<Self> {
                validate_hex(value, $algorithm, $len)?;
                Ok(Self(value.to_owned()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = ArtefactError;

            fn try_from(value: String) -> Result<Self> {
                validate_hex(&value, $algorithm, $len)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

hex_digest_impls!(Sha1Digest, "SHA-1", SHA1_HEX_LEN);
hex_digest_impls!(Sha256Digest, "SHA-256", SHA256_HEX_LEN);

/// Validate that `value` is a lowercase hex string of exactly `len` chars.
fn validate_hex(value: &str, algorithm: &'static str, len: usize) -> Result<()> {
    if value.len() != len {
        return Err(ArtefactError::InvalidDigest {
            algorithm,
            reason: format!("expected {len} hex characters, got {}", value.len()),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ArtefactError::InvalidDigest {
            algorithm,
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ArtefactError::InvalidDigest {
            algorithm,
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}
