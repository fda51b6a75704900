//! Remembered author details.
//!
//! The metadata of the last run is stored at
//! `<cache_dir>/pack_metadata.json` and fills whatever the next session file
//! leaves blank, so authors only type their details once.

use crate::config::MetadataConfig;
use crate::dirs::BaseDirs;
use std::path::{Path, PathBuf};

const CACHE_FILENAME: &str = "pack_metadata.json";

/// Errors that prevent reading or writing the cache.
#[derive(Debug, thiserror::Error)]
pub enum MetadataCacheError {
    /// No cache directory exists on this platform.
    #[error("could not determine the cache directory")]
    MissingCacheDirectory,

    /// Creating the cache directory failed.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the cache file failed.
    #[error("failed to read metadata cache {path}: {source}")]
    Read {
        /// Cache file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing the metadata failed.
    #[error("failed to serialize metadata: {source}")]
    Serialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the cache file failed.
    #[error("failed to write metadata cache {path}: {source}")]
    Write {
        /// Cache file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Cached metadata and whether a malformed file was ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedMetadata {
    /// The remembered metadata; empty when nothing was cached.
    pub metadata: MetadataConfig,
    /// True when the cache file existed but could not be parsed.
    pub recovered_from_corrupt_file: bool,
}

/// Location of the cache file.
///
/// # Errors
///
/// Returns [`MetadataCacheError::MissingCacheDirectory`] when the platform
/// has no cache directory.
pub fn cache_path(dirs: &dyn BaseDirs) -> Result<PathBuf, MetadataCacheError> {
    let cache_dir = dirs
        .cache_dir()
        .ok_or(MetadataCacheError::MissingCacheDirectory)?;
    Ok(cache_dir.join(CACHE_FILENAME))
}

/// Load the cached metadata at `path`.
///
/// A missing file yields empty metadata. A malformed file also yields empty
/// metadata and is flagged in the result; it is replaced on the next save.
///
/// # Errors
///
/// Returns [`MetadataCacheError::Read`] if the file exists but cannot be
/// read.
pub fn load(path: &Path) -> Result<CachedMetadata, MetadataCacheError> {
    if !path.exists() {
        return Ok(CachedMetadata::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| MetadataCacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match serde_json::from_str::<MetadataConfig>(&content) {
        Ok(metadata) => CachedMetadata {
            metadata,
            recovered_from_corrupt_file: false,
        },
        Err(_) => CachedMetadata {
            metadata: MetadataConfig::default(),
            recovered_from_corrupt_file: true,
        },
    })
}

/// Store `metadata` at `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save(path: &Path, metadata: &MetadataConfig) -> Result<(), MetadataCacheError> {
    let parent = path
        .parent()
        .ok_or_else(|| MetadataCacheError::CreateDirectory {
            path: PathBuf::new(),
            source: std::io::Error::other("cache file path has no parent"),
        })?;
    std::fs::create_dir_all(parent).map_err(|source| MetadataCacheError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })?;

    let json = serde_json::to_string_pretty(metadata)
        .map_err(|source| MetadataCacheError::Serialize { source })?;
    std::fs::write(path, json).map_err(|source| MetadataCacheError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn sample() -> MetadataConfig {
        MetadataConfig {
            author: Some("Jane Doe".to_owned()),
            email: Some("jane@example.org".to_owned()),
            url_template: Some("https://example.org/{file}".to_owned()),
            ..MetadataConfig::default()
        }
    }

    #[rstest]
    fn cache_path_uses_cache_dir(temp_dir: TempDir) {
        let root = temp_dir.path().to_path_buf();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_cache_dir().return_const(Some(root.clone()));

        let path = cache_path(&dirs).expect("path");

        assert_eq!(path, root.join(CACHE_FILENAME));
    }

    #[test]
    fn cache_path_without_cache_dir_fails() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_cache_dir().return_const(None::<PathBuf>);

        let err = cache_path(&dirs).expect_err("no cache dir");

        assert!(matches!(err, MetadataCacheError::MissingCacheDirectory));
    }

    #[rstest]
    fn save_then_load_restores_metadata(temp_dir: TempDir) {
        let path = temp_dir.path().join("nested").join(CACHE_FILENAME);

        save(&path, &sample()).expect("save");
        let cached = load(&path).expect("load");

        assert_eq!(cached.metadata, sample());
        assert!(!cached.recovered_from_corrupt_file);
    }

    #[rstest]
    fn missing_file_is_empty(temp_dir: TempDir) {
        let cached = load(&temp_dir.path().join(CACHE_FILENAME)).expect("load");
        assert!(cached.metadata.is_empty());
        assert!(!cached.recovered_from_corrupt_file);
    }

    #[rstest]
    fn corrupt_file_is_flagged_and_ignored(temp_dir: TempDir) {
        let path = temp_dir.path().join(CACHE_FILENAME);
        std::fs::write(&path, "{not json").expect("write");

        let cached = load(&path).expect("load");

        assert!(cached.metadata.is_empty());
        assert!(cached.recovered_from_corrupt_file);
    }

    #[rstest]
    fn reads_legacy_url_template_key(temp_dir: TempDir) {
        let path = temp_dir.path().join(CACHE_FILENAME);
        std::fs::write(
            &path,
            r#"{"author": "A", "email": "a@x.com", "adapter_url_template": "https://x.test/{file}"}"#,
        )
        .expect("write");

        let cached = load(&path).expect("load");

        assert_eq!(cached.metadata.url_template(), Some("https://x.test/{file}"));
    }
}
