//! Artefact scanner for discovering model and adapter directories.
//!
//! Full models and adapters are recognised by their weights file: a
//! directory holding `pytorch_model.bin` is a full model checkpoint and a
//! directory holding `pytorch_adapter.bin` is an adapter. The scanner walks
//! every root recursively and reports each matching directory once.

use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Weights file written next to a full model checkpoint.
pub const MODEL_WEIGHTS_NAME: &str = "pytorch_model.bin";

/// Weights file written next to a saved adapter.
pub const ADAPTER_WEIGHTS_NAME: &str = "pytorch_adapter.bin";

/// The weights file names that identify each kind of artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightsFileNames {
    /// File name marking a full model directory.
    pub model: String,
    /// File name marking an adapter directory.
    pub adapter: String,
}

impl Default for WeightsFileNames {
    fn default() -> Self {
        Self {
            model: MODEL_WEIGHTS_NAME.to_owned(),
            adapter: ADAPTER_WEIGHTS_NAME.to_owned(),
        }
    }
}

/// Directories found by [`scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Full model directories, only collected when requested.
    pub model_dirs: Vec<PathBuf>,
    /// Adapter directories.
    pub adapter_dirs: Vec<PathBuf>,
}

impl ScanResult {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.model_dirs.is_empty() && self.adapter_dirs.is_empty()
    }
}

/// Scan `roots` for model and adapter directories.
///
/// Directories are reported in walk order (entries sorted by file name,
/// roots in the order given) and each at most once. A directory reported as
/// an adapter is never also reported as a model. Missing roots and
/// unreadable entries are skipped with a warning.
///
/// # Examples
///
/// ```no_run
/// use adapterpack_packer::scanner::{WeightsFileNames, scan};
/// use std::path::PathBuf;
///
/// let found = scan(&[PathBuf::from("checkpoints")], &WeightsFileNames::default(), false);
/// for dir in &found.adapter_dirs {
///     println!("adapter in {}", dir.display());
/// }
/// ```
#[must_use]
pub fn scan(roots: &[PathBuf], names: &WeightsFileNames, include_models: bool) -> ScanResult {
    let adapter_dirs = find_dirs_containing(roots, &names.adapter);
    let model_dirs = if include_models {
        let adapters: HashSet<&PathBuf> = adapter_dirs.iter().collect();
        find_dirs_containing(roots, &names.model)
            .into_iter()
            .filter(|dir| !adapters.contains(dir))
            .collect()
    } else {
        Vec::new()
    };

    ScanResult {
        model_dirs,
        adapter_dirs,
    }
}

/// Collect the parent directory of every file named `file_name`.
fn find_dirs_containing(roots: &[PathBuf], file_name: &str) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();

    for root in roots {
        if !root.exists() {
            warn!("input path {} does not exist", root.display());
            continue;
        }
        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            // Follows a symlinked weights file; symlinked directories are
            // still not descended into.
            if entry.file_name() != file_name || !entry.path().is_file() {
                continue;
            }
            let Some(dir) = entry.path().parent().map(Path::to_path_buf) else {
                continue;
            };
            if seen.insert(dir.clone()) {
                debug!("found {file_name} in {}", dir.display());
                dirs.push(dir);
            }
        }
    }

    dirs
}

/// Extracts adapter directories from a full model checkpoint.
///
/// Extraction needs the model framework and lives outside this crate; the
/// trait is the seam through which its results join the batch.
#[cfg_attr(test, mockall::automock)]
pub trait AdapterExtractor {
    /// Save every adapter held by the model in `model_dir` and return the
    /// directories they were written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be loaded or saved.
    fn extract(&self, model_dir: &Path) -> std::io::Result<Vec<PathBuf>>;
}

/// Run `extractor` over every model directory and merge the results into
/// the adapter list.
///
/// Extraction failures are logged and skipped so one unreadable checkpoint
/// does not hide the adapters found elsewhere.
pub fn extract_adapters(scan: &mut ScanResult, extractor: &dyn AdapterExtractor) {
    for model_dir in &scan.model_dirs {
        match extractor.extract(model_dir) {
            Ok(extracted) => merge_extracted(&mut scan.adapter_dirs, extracted),
            Err(err) => warn!(
                "failed to extract adapters from {}: {err}",
                model_dir.display()
            ),
        }
    }
}

/// Append the directories in `extracted` that are not yet listed.
pub fn merge_extracted(adapter_dirs: &mut Vec<PathBuf>, extracted: Vec<PathBuf>) {
    for dir in extracted {
        if !adapter_dirs.contains(&dir) {
            adapter_dirs.push(dir);
        }
    }
}
