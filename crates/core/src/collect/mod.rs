//! Turning command-line inputs into a flat list of ROM files
//!
//! Archives are extracted into the workspace, folders are walked, loose
//! ROMs are taken as they are. Everything ends up as a [`CollectedRom`]:
//! a real path to read plus a name to show.

mod archive;
mod folder;

pub use archive::{ArchiveCollector, ArchiveKind, ArchiveOutcome};
pub use folder::{collect_from_folder, DISPLAY_SEPARATOR};

use std::path::{Path, PathBuf};

use crate::cancel::CancelFlag;
use crate::error::{CheckError, Result};
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::has_rom_extension;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedRom {
    /// File to read; always exists once collection is done
    pub path: PathBuf,
    /// Name used for sorting and printing only
    pub display_name: String,
}

impl CollectedRom {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// A ROM passed directly on the command line
    pub fn loose(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Archive(PathBuf),
    Directory(PathBuf),
    LooseRom(PathBuf),
}

impl InputSource {
    /// Classify one existing path. Archive extensions win over directories,
    /// so a folder named `foo.zip` is still treated as an archive.
    pub fn classify(path: &Path) -> Option<Self> {
        if ArchiveKind::from_path(path).is_some() {
            Some(InputSource::Archive(path.to_path_buf()))
        } else if path.is_dir() {
            Some(InputSource::Directory(path.to_path_buf()))
        } else if path
            .file_name()
            .is_some_and(|n| has_rom_extension(&n.to_string_lossy()))
        {
            Some(InputSource::LooseRom(path.to_path_buf()))
        } else {
            None
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            InputSource::Archive(p) | InputSource::Directory(p) | InputSource::LooseRom(p) => p,
        }
    }
}

/// Inputs resolved from raw arguments, plus the ones that were skipped
#[derive(Debug, Default)]
pub struct ResolvedInputs {
    pub sources: Vec<InputSource>,
    pub skipped: Vec<CheckError>,
}

/// Resolve raw arguments once: missing or unsupported paths are skipped with
/// an [`CheckError::InvalidInputPath`], the rest are made absolute.
pub fn resolve_inputs<I, P>(args: I) -> ResolvedInputs
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut resolved = ResolvedInputs::default();
    for arg in args {
        let arg = arg.as_ref();
        let Ok(path) = arg.canonicalize() else {
            resolved
                .skipped
                .push(CheckError::InvalidInputPath(arg.to_path_buf()));
            continue;
        };
        match InputSource::classify(&path) {
            Some(source) => resolved.sources.push(source),
            None => resolved.skipped.push(CheckError::InvalidInputPath(path)),
        }
    }
    resolved
}

/// Progress notifications from [`collect_all`]
#[derive(Debug)]
pub enum CollectEvent<'a> {
    Archive {
        archive: &'a Path,
        outcome: &'a ArchiveOutcome,
    },
    Folder {
        folder: &'a Path,
        found: usize,
    },
    Loose {
        path: &'a Path,
    },
}

/// Collect every ROM from `sources`, one input at a time.
///
/// A failing archive contributes nothing and does not stop the run; only
/// cancellation does.
pub fn collect_all<F>(
    sources: &[InputSource],
    archives: &ArchiveCollector<'_>,
    cancel: &CancelFlag,
    mut on_event: F,
) -> Result<Vec<CollectedRom>>
where
    F: FnMut(CollectEvent<'_>),
{
    let mut roms = Vec::new();
    for source in sources {
        if cancel.is_cancelled() {
            return Err(CheckError::Cancelled);
        }
        match source {
            InputSource::Archive(path) => {
                let outcome = archives.collect(path);
                if matches!(outcome.error, Some(CheckError::Cancelled)) {
                    return Err(CheckError::Cancelled);
                }
                on_event(CollectEvent::Archive {
                    archive: path,
                    outcome: &outcome,
                });
                roms.extend(outcome.roms);
            }
            InputSource::Directory(path) => {
                let found = collect_from_folder(path);
                on_event(CollectEvent::Folder {
                    folder: path,
                    found: found.len(),
                });
                roms.extend(found);
            }
            InputSource::LooseRom(path) => {
                on_event(CollectEvent::Loose { path });
                roms.push(CollectedRom::loose(path));
            }
        }
    }
    log(LogCategory::Collect, LogLevel::Info, || {
        format!("collected {} ROM(s) from {} input(s)", roms.len(), sources.len())
    });
    Ok(roms)
}
