//! Archive extraction backends
//!
//! The collectors only need "put the matching files of this archive into this
//! directory", so each archive format sits behind [`Extractor`] and can be
//! swapped for another implementation (or a stub in tests).

mod deflate;
mod sevenzip;

pub use deflate::ZipExtractor;
pub use sevenzip::{SevenZipExtractor, DEFAULT_TIMEOUT};

use std::path::Path;

use crate::collect::CollectedRom;
use crate::error::Result;

pub trait Extractor: Send + Sync {
    /// Extract every entry of `archive` whose name ends in one of
    /// `extensions` (lowercase, no dot) into `out_dir`.
    ///
    /// Returns the extracted files with their display names, or
    /// [`CheckError::NoMatchingEntries`](crate::CheckError::NoMatchingEntries)
    /// when nothing matched.
    fn extract(
        &self,
        archive: &Path,
        extensions: &[&str],
        out_dir: &Path,
    ) -> Result<Vec<CollectedRom>>;
}
