use std::path::Path;

use super::CollectedRom;
use crate::error::CheckError;
use crate::extract::{Extractor, SevenZipExtractor, ZipExtractor};
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::ROM_EXTENSIONS;
use crate::workspace::TemporaryWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    SevenZip,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "zip" => Some(ArchiveKind::Zip),
            "7z" => Some(ArchiveKind::SevenZip),
            _ => None,
        }
    }
}

/// What one archive contributed to the run
#[derive(Debug, Default)]
pub struct ArchiveOutcome {
    pub roms: Vec<CollectedRom>,
    /// Why nothing was collected; `NoMatchingEntries` is not a failure
    pub error: Option<CheckError>,
}

impl ArchiveOutcome {
    fn failed(error: CheckError) -> Self {
        Self {
            roms: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.as_ref().is_some_and(CheckError::is_failure)
    }

    /// One-line human readable status
    pub fn status(&self) -> String {
        match &self.error {
            Some(e) => e.to_string(),
            None => format!("{} ROM(s) extracted", self.roms.len()),
        }
    }
}

/// Extracts ROMs from archives into per-archive workspace directories
pub struct ArchiveCollector<'a> {
    workspace: &'a TemporaryWorkspace,
    zip: Box<dyn Extractor + 'a>,
    seven_zip: Box<dyn Extractor + 'a>,
}

impl<'a> ArchiveCollector<'a> {
    pub fn new(workspace: &'a TemporaryWorkspace, seven_zip: SevenZipExtractor) -> Self {
        Self::with_backends(workspace, Box::new(ZipExtractor), Box::new(seven_zip))
    }

    pub fn with_backends(
        workspace: &'a TemporaryWorkspace,
        zip: Box<dyn Extractor + 'a>,
        seven_zip: Box<dyn Extractor + 'a>,
    ) -> Self {
        Self {
            workspace,
            zip,
            seven_zip,
        }
    }

    /// Extract the ROMs of `archive`. Errors are contained in the outcome;
    /// a path that is not a supported archive yields an empty outcome.
    pub fn collect(&self, archive: &Path) -> ArchiveOutcome {
        let backend = match ArchiveKind::from_path(archive) {
            Some(ArchiveKind::Zip) => &self.zip,
            Some(ArchiveKind::SevenZip) => &self.seven_zip,
            None => return ArchiveOutcome::default(),
        };

        let out_dir = match self.workspace.archive_dir(archive) {
            Ok(dir) => dir,
            Err(e) => return ArchiveOutcome::failed(e),
        };

        match backend.extract(archive, &ROM_EXTENSIONS, &out_dir) {
            Ok(roms) => {
                log(LogCategory::Archive, LogLevel::Info, || {
                    format!("{}: {} ROM(s)", archive.display(), roms.len())
                });
                ArchiveOutcome { roms, error: None }
            }
            Err(e) => {
                let level = if e.is_failure() {
                    LogLevel::Warn
                } else {
                    LogLevel::Info
                };
                log(LogCategory::Archive, level, || {
                    format!("{}: {}", archive.display(), e)
                });
                ArchiveOutcome::failed(e)
            }
        }
    }
}
