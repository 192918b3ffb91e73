//! Error taxonomy shared by the collectors and the extraction backends.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    #[error("extraction tool not found: {0}")]
    MissingExtractionTool(String),
    /// Not a failure: the archive simply holds no .gb/.gbc entries.
    #[error("no .gb/.gbc entries in archive")]
    NoMatchingEntries,
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("extraction timed out after {}s", .0.as_secs())]
    ExtractionTimeout(Duration),
    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("zip extraction failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid input path: {}", .0.display())]
    InvalidInputPath(PathBuf),
    #[error("could not start verification workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("cancelled")]
    Cancelled,
}

impl CheckError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CheckError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether this outcome should be reported as a failure rather than an
    /// empty result.
    pub fn is_failure(&self) -> bool {
        !matches!(self, CheckError::NoMatchingEntries)
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
