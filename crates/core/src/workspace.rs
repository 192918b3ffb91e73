//! Scratch space for archive extraction
//!
//! One [`TemporaryWorkspace`] lives for the whole run. Its directory is
//! created with the first archive and removed when the workspace is dropped,
//! whether the run finished, failed or was interrupted. Every archive gets its
//! own subdirectory so extracted names never meet across archives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use crate::error::{CheckError, Result};
use crate::logging::{log, LogCategory, LogLevel};

/// Characters of the archive stem kept in its subdirectory name
const STEM_CHARS: usize = 20;

/// The root directory is only created once the first archive needs it.
#[derive(Debug, Default)]
pub struct TemporaryWorkspace {
    dir: OnceLock<TempDir>,
}

impl TemporaryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root directory, if anything has been extracted yet
    pub fn path(&self) -> Option<&Path> {
        self.dir.get().map(TempDir::path)
    }

    fn root(&self) -> Result<&Path> {
        if let Some(dir) = self.dir.get() {
            return Ok(dir.path());
        }
        let dir = tempfile::Builder::new()
            .prefix("romcheck-")
            .tempdir()
            .map_err(|e| CheckError::fs(std::env::temp_dir(), e))?;
        log(LogCategory::Archive, LogLevel::Debug, || {
            format!("workspace at {}", dir.path().display())
        });
        Ok(self.dir.get_or_init(|| dir).path())
    }

    /// Create a fresh, empty subdirectory for `archive`.
    ///
    /// The name is derived from the archive stem and path; if it is taken the
    /// numeric suffix is bumped until an unused name is found.
    pub fn archive_dir(&self, archive: &Path) -> Result<PathBuf> {
        let root = self.root()?;
        let stem: String = archive
            .file_stem()
            .map(|s| s.to_string_lossy().chars().take(STEM_CHARS).collect())
            .unwrap_or_default();
        let mut suffix = path_suffix(archive);

        loop {
            let candidate = root.join(format!("_{}_{:04}", stem, suffix));
            match fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    suffix = (suffix + 1) % 10_000;
                }
                Err(e) => return Err(CheckError::fs(candidate, e)),
            }
        }
    }

    /// Delete everything extracted so far without waiting for drop.
    ///
    /// For exits that skip destructors; the later drop finds nothing left.
    pub fn purge(&self) {
        if let Some(root) = self.path() {
            if let Err(e) = fs::remove_dir_all(root) {
                log(LogCategory::Archive, LogLevel::Warn, || {
                    format!("could not remove {}: {}", root.display(), e)
                });
            }
        }
    }
}

/// Four-digit suffix from a CRC of the path. Only meant to keep similar
/// archive names apart.
fn path_suffix(path: &Path) -> u32 {
    crc32fast::hash(path.to_string_lossy().as_bytes()) % 10_000
}
