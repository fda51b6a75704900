//! Archive integrity digests and the manifest file entry built from them.
//!
//! The registry lists each downloadable archive with a version, a download
//! URL and two digests. Both digests are computed from a single streaming
//! read of the archive.

use super::digest::{Sha1Digest, Sha256Digest};
use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read buffer size used while hashing.
const CHUNK_SIZE: usize = 8192;

/// The SHA-1 and SHA-256 digests of one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityDigests {
    /// Lowercase hex SHA-1 digest.
    pub sha1: Sha1Digest,
    /// Lowercase hex SHA-256 digest.
    pub sha256: Sha256Digest,
}

/// One entry of a manifest's `files` list.
///
/// Field order matches the registry's info card layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    /// Version label of the archive.
    pub version: String,
    /// Download location of the archive.
    pub url: String,
    /// SHA-1 digest of the archive.
    pub sha1: Sha1Digest,
    /// SHA-256 digest of the archive.
    pub sha256: Sha256Digest,
}

impl IntegrityRecord {
    /// Combine computed digests with a version label and download URL.
    #[must_use]
    pub fn new(version: impl Into<String>, url: impl Into<String>, digests: IntegrityDigests) -> Self {
        Self {
            version: version.into(),
            url: url.into(),
            sha1: digests.sha1,
            sha256: digests.sha256,
        }
    }
}

/// Compute the SHA-1 and SHA-256 digests of a file.
///
/// The file is read once in chunks and every chunk feeds both hashers.
///
/// # Errors
///
/// Returns [`PackError::Io`] if the file cannot be read.
pub fn compute_digests(path: &Path) -> Result<IntegrityDigests> {
    let mut file = fs::File::open(path).map_err(|e| PackError::io(path, e))?;
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| PackError::io(path, e))?;
        let Some(chunk) = buffer.get(..bytes_read) else {
            break;
        };
        if chunk.is_empty() {
            break;
        }
        sha1.update(chunk);
        sha256.update(chunk);
    }

    Ok(IntegrityDigests {
        sha1: Sha1Digest::try_from(format!("{:x}", sha1.finalize()))?,
        sha256: Sha256Digest::try_from(format!("{:x}", sha256.finalize()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    #[rstest]
    fn digests_of_empty_file_match_known_constants(temp_dir: TempDir) {
        let path = temp_dir.path().join("empty.bin");
        fs::write(&path, b"").expect("write");

        let digests = compute_digests(&path).expect("digests");
        assert_eq!(
            digests.sha1.as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            digests.sha256.as_str(),
            concat!(
                "e3b0c44298fc1c149afbf4c8996fb924",
                "27ae41e4649b934ca495991b7852b855"
            )
        );
    }

    #[rstest]
    fn digests_of_known_content(temp_dir: TempDir) {
        let path = temp_dir.path().join("abc.bin");
        fs::write(&path, b"abc").expect("write");

        let digests = compute_digests(&path).expect("digests");
        assert_eq!(
            digests.sha1.as_str(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            digests.sha256.as_str(),
            concat!(
                "ba7816bf8f01cfea414140de5dae2223",
                "b00361a396177a9cb410ff61f20015ad"
            )
        );
    }

    #[rstest]
    fn content_larger_than_one_chunk_is_hashed_completely(temp_dir: TempDir) {
        let path = temp_dir.path().join("large.bin");
        let content = vec![7u8; CHUNK_SIZE * 3 + 17];
        fs::write(&path, &content).expect("write");

        let digests = compute_digests(&path).expect("digests");
        assert_eq!(
            digests.sha256.as_str(),
            format!("{:x}", Sha256::digest(&content))
        );
        assert_eq!(digests.sha1.as_str(), format!("{:x}", Sha1::digest(&content)));
    }

    #[rstest]
    fn repeated_runs_are_deterministic(temp_dir: TempDir) {
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"adapter weights").expect("write");

        let first = compute_digests(&path).expect("first");
        let second = compute_digests(&path).expect("second");
        assert_eq!(first, second);
    }

    #[rstest]
    fn missing_file_is_an_io_error(temp_dir: TempDir) {
        let path = temp_dir.path().join("missing.zip");
        let err = compute_digests(&path).expect_err("missing file");
        assert!(matches!(err, PackError::Io { .. }));
    }

    #[test]
    fn record_keeps_registry_field_order() {
        let digests = IntegrityDigests {
            sha1: Sha1Digest::try_from("a".repeat(40)).expect("valid"),
            sha256: Sha256Digest::try_from("b".repeat(64)).expect("valid"),
        };
        let record = IntegrityRecord::new("1", "TODO", digests);
        let yaml = serde_yaml::to_string(&record).expect("serialize");
        let keys: Vec<&str> = yaml
            .lines()
            .filter_map(|line| line.split(':').next())
            .collect();
        assert_eq!(keys, ["version", "url", "sha1", "sha256"]);
    }
}
