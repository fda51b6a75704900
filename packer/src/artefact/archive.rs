//! Deterministic zip archives of flat artefact directories.
//!
//! Every regular file directly inside the artefact directory becomes one
//! archive entry named after its base name. Entries are written in
//! lexicographic order with a fixed timestamp and fixed permissions, so two
//! builds from identical inputs are byte-identical.

use crate::error::{PackError, Result};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// File extension of produced archives, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Permissions recorded for every archive entry.
const ENTRY_PERMISSIONS: u32 = 0o644;

/// Package the files of `source_dir` into a zip archive at `dest`.
///
/// The archive is assembled in a temporary file next to `dest` and renamed
/// into place once complete, replacing any existing file. Sub-directories
/// are not descended into. Returns the entry names in archive order.
///
/// # Errors
///
/// Returns [`PackError::Io`] when the directory cannot be listed or a file
/// cannot be read or written, [`PackError::EmptyArtifact`] when there is
/// nothing to archive, and [`PackError::Archive`] if the zip writer fails.
pub fn build_archive(source_dir: &Path, dest: &Path) -> Result<Vec<String>> {
    let entries = collect_entries(source_dir)?;
    if entries.is_empty() {
        return Err(PackError::EmptyArtifact {
            path: source_dir.to_path_buf(),
        });
    }

    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = tempfile::Builder::new()
        .prefix(".adapterpack-")
        .suffix(".partial")
        .tempfile_in(parent)
        .map_err(|e| PackError::io(parent, e))?;

    let mut writer = ZipWriter::new(staged.as_file());
    let options = entry_options();
    for (name, path) in &entries {
        debug!("adding {} as {name}", path.display());
        writer.start_file(name.as_str(), options)?;
        let mut source = fs::File::open(path).map_err(|e| PackError::io(path, e))?;
        io::copy(&mut source, &mut writer).map_err(|e| PackError::io(path, e))?;
    }
    writer.finish()?;

    staged
        .persist(dest)
        .map_err(|e| PackError::io(dest, e.error))?;

    Ok(entries.into_iter().map(|(name, _)| name).collect())
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// A dangling symlink is an I/O error rather than a silently dropped entry.
fn collect_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PackError::io(dir, e))? {
        let entry = entry.map_err(|e| PackError::io(dir, e))?;
        let path = entry.path();
        // Symlinks are archived as the file they point to.
        let metadata = fs::metadata(&path).map_err(|e| PackError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, path));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Options shared by every entry; fixed values keep output reproducible.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(ENTRY_PERMISSIONS)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
