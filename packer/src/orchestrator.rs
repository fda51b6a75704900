//! Batch packaging orchestration.
//!
//! Each artefact goes through the same sequence: derive its output name,
//! build the archive, compute its digests, synthesize the info card, and
//! move both files into the output directory. Work happens in a staging
//! directory inside the output directory, so nothing appears at a final path
//! until every step for that artefact has succeeded. A failure is recorded
//! against the artefact and the batch carries on.

use crate::artefact::archive::build_archive;
use crate::artefact::integrity::compute_digests;
use crate::artefact::manifest::{
    ManifestTemplate, MetadataRecord, SynthesisInput, synthesize,
};
use crate::artefact::naming::{NameParts, OutputName};
use crate::artefact::record::{
    ArtifactRecord, CONFIG_NAME_FIELD, MODEL_NAME_FIELD, ResolvedFields, SUBTASK_FIELD,
    TASK_FIELD,
};
use crate::error::{PackError, Result, SetupError};
use crate::fingerprint::ConfigRegistry;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the per-artefact staging directories.
const STAGING_PREFIX: &str = ".adapterpack-staging-";

/// Values shared by every artefact of one packaging run.
#[derive(Debug, Clone)]
pub struct PackSession {
    /// Info card template.
    pub template: ManifestTemplate,
    /// Author details written into every card.
    pub metadata: Option<MetadataRecord>,
    /// Version label of the produced archives.
    pub version: String,
    /// Download URL template; `None` writes a placeholder URL.
    pub url_template: Option<String>,
    /// Directory receiving archives and cards.
    pub output_dir: PathBuf,
}

/// Files produced for one artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    /// Shared stem of the archive and card.
    pub name: OutputName,
    /// Final path of the archive.
    pub archive_path: PathBuf,
    /// Final path of the info card.
    pub manifest_path: PathBuf,
}

/// An artefact that could not be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    /// Output name when it could be derived, otherwise the directory.
    pub artifact: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of a packaging run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Artefacts packaged successfully, in processing order.
    pub succeeded: Vec<PackagedArtifact>,
    /// Artefacts that failed, in processing order.
    pub failed: Vec<ArtifactFailure>,
}

impl BatchResult {
    /// Returns true when no artefact failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of artefacts processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn record_failure(&mut self, artifact: String, err: &PackError) {
        warn!("failed to package {artifact}: {err}");
        self.failed.push(ArtifactFailure {
            artifact,
            reason: err.to_string(),
        });
    }
}

/// Create the output directory if it does not exist.
///
/// # Errors
///
/// Returns [`SetupError::OutputDir`] if the directory cannot be created.
pub fn prepare_output_dir(dir: &Path) -> std::result::Result<(), SetupError> {
    fs::create_dir_all(dir).map_err(|source| SetupError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Package every artefact in `artifacts`.
///
/// Artefacts are processed in order. Within one call, an artefact whose
/// output name was already claimed by an earlier artefact fails with
/// [`PackError::OutputCollision`]. Files left by earlier runs are replaced.
#[must_use]
pub fn pack_all(artifacts: &[ArtifactRecord], session: &PackSession) -> BatchResult {
    let mut packer = BatchPacker::new(session);
    for artifact in artifacts {
        packer.pack(artifact);
    }
    packer.finish()
}

/// Load and package the adapter directories in `dirs`.
///
/// `fields_for` supplies the resolved fields for each directory. A directory
/// whose record cannot be loaded is recorded as a failure under its path.
#[must_use]
pub fn pack_directories(
    dirs: &[PathBuf],
    fields_for: &dyn Fn(&Path) -> ResolvedFields,
    registry: &ConfigRegistry,
    session: &PackSession,
) -> BatchResult {
    let mut packer = BatchPacker::new(session);
    for dir in dirs {
        match ArtifactRecord::load(dir, &fields_for(dir), registry) {
            Ok(artifact) => packer.pack(&artifact),
            Err(err) => packer.result.record_failure(dir.display().to_string(), &err),
        }
    }
    packer.finish()
}

/// Derive the output name of `artifact` from its resolved fields.
///
/// # Errors
///
/// Returns [`PackError::MissingField`] if a name component is absent and
/// [`PackError::Validation`] if one is blank.
pub fn output_name(artifact: &ArtifactRecord) -> Result<OutputName> {
    let parts = NameParts {
        model_name: artifact.text_field(MODEL_NAME_FIELD)?,
        task: artifact.text_field(TASK_FIELD)?,
        subtask: artifact.text_field(SUBTASK_FIELD)?,
        config_name: artifact.text_field(CONFIG_NAME_FIELD)?,
    };
    Ok(OutputName::new(parts)?)
}

struct BatchPacker<'a> {
    session: &'a PackSession,
    /// Claimed names, lowercased for case-insensitive filesystems.
    claimed: HashSet<String>,
    result: BatchResult,
}

impl<'a> BatchPacker<'a> {
    fn new(session: &'a PackSession) -> Self {
        Self {
            session,
            claimed: HashSet::new(),
            result: BatchResult::default(),
        }
    }

    fn pack(&mut self, artifact: &ArtifactRecord) {
        let name = match output_name(artifact) {
            Ok(name) => name,
            Err(err) => {
                let label = artifact.root_path().display().to_string();
                self.result.record_failure(label, &err);
                return;
            }
        };

        // The first artefact to claim a name owns it for the whole batch,
        // even if it later fails. Names differing only in case collide.
        if !self.claimed.insert(name.as_str().to_lowercase()) {
            let err = PackError::OutputCollision {
                name: name.to_string(),
            };
            self.result.record_failure(name.to_string(), &err);
            return;
        }

        match pack_one(artifact, &name, self.session) {
            Ok(packaged) => {
                info!("packaged {name} from {}", artifact.root_path().display());
                self.result.succeeded.push(packaged);
            }
            Err(err) => self.result.record_failure(name.to_string(), &err),
        }
    }

    fn finish(self) -> BatchResult {
        self.result
    }
}

fn pack_one(
    artifact: &ArtifactRecord,
    name: &OutputName,
    session: &PackSession,
) -> Result<PackagedArtifact> {
    let output_dir = &session.output_dir;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(output_dir)
        .map_err(|e| PackError::io(output_dir, e))?;

    let archive_file = name.archive_filename();
    let manifest_file = name.manifest_filename();
    let staged_archive = staging.path().join(&archive_file);
    let staged_manifest = staging.path().join(&manifest_file);

    let entries = build_archive(artifact.root_path(), &staged_archive)?;
    debug!("{name}: archived {} file(s)", entries.len());

    let digests = compute_digests(&staged_archive)?;
    debug!("{name}: sha256 {}", digests.sha256);

    let card = synthesize(SynthesisInput {
        template: &session.template,
        artifact,
        metadata: session.metadata.as_ref(),
        digests: &digests,
        version: &session.version,
        url_template: session.url_template.as_deref(),
        archive_file_name: &archive_file,
    })?;
    let yaml = card.to_yaml()?;
    fs::write(&staged_manifest, yaml).map_err(|e| PackError::io(&staged_manifest, e))?;

    let archive_path = output_dir.join(&archive_file);
    let manifest_path = output_dir.join(&manifest_file);
    fs::rename(&staged_archive, &archive_path).map_err(|e| PackError::io(&archive_path, e))?;
    if let Err(err) = fs::rename(&staged_manifest, &manifest_path) {
        // An archive must never sit next to a card describing other bytes.
        if let Err(cleanup) = fs::remove_file(&archive_path) {
            warn!("could not remove {}: {cleanup}", archive_path.display());
        }
        return Err(PackError::io(&manifest_path, err));
    }

    Ok(PackagedArtifact {
        name: name.clone(),
        archive_path,
        manifest_path,
    })
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
