//! Platform directory lookup.
//!
//! Kept behind a trait so tests can point the metadata cache at a temporary
//! directory.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Source of per-user directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory for cached, regenerable data.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by the platform conventions.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    project: Option<ProjectDirs>,
}

impl SystemBaseDirs {
    /// Resolve the directories for this tool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project: ProjectDirs::from("org", "AdapterHub", "adapterpack"),
        }
    }
}

impl Default for SystemBaseDirs {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        self.project.as_ref().map(|dirs| dirs.cache_dir().to_path_buf())
    }
}
