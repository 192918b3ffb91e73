use std::fs::{File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::Extractor;
use crate::collect::CollectedRom;
use crate::error::{CheckError, Result};
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::has_extension;

/// In-process extraction of deflate zip archives
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(
        &self,
        archive: &Path,
        extensions: &[&str],
        out_dir: &Path,
    ) -> Result<Vec<CollectedRom>> {
        let file = File::open(archive).map_err(|e| CheckError::fs(archive, e))?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;

        let mut roms = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() || !has_extension(entry.name(), extensions) {
                continue;
            }

            // Only the base name is ever joined to `out_dir`, so stored
            // directories (`..` and absolute roots included) are dropped.
            let Some(file_name) = entry_base_name(entry.name()) else {
                log(LogCategory::Archive, LogLevel::Warn, || {
                    format!("{}: skipping entry {:?}", archive.display(), entry.name())
                });
                continue;
            };

            let target = unique_target(out_dir, &file_name);
            let mut out = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .map_err(|e| CheckError::fs(&target, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| CheckError::fs(&target, e))?;

            log(LogCategory::Archive, LogLevel::Debug, || {
                format!("{} -> {}", entry.name(), target.display())
            });
            roms.push(CollectedRom::new(target, file_name));
        }

        if roms.is_empty() {
            return Err(CheckError::NoMatchingEntries);
        }
        Ok(roms)
    }
}

/// Last segment of a stored entry name, split on either separator.
fn entry_base_name(name: &str) -> Option<String> {
    match name.rsplit(|c: char| c == '/' || c == '\\').next() {
        Some("" | "." | "..") | None => None,
        Some(base) => Some(base.to_string()),
    }
}

/// `dir/file_name`, or `dir/stem_N.ext` with the first free N when taken.
fn unique_target(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{suffix}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
