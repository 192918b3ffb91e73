use std::path::Path;

use walkdir::WalkDir;

use super::CollectedRom;
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::has_rom_extension;

/// Replaces path separators in folder-relative display names
pub const DISPLAY_SEPARATOR: &str = "→";

/// Walk `root` (following symlinks) and collect every .gb/.gbc file.
///
/// Display names are relative to `root`, e.g. `x→y.gb` for `root/x/y.gb`.
/// Unreadable entries are logged and skipped.
pub fn collect_from_folder(root: &Path) -> Vec<CollectedRom> {
    let mut roms = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log(LogCategory::Collect, LogLevel::Warn, || {
                    format!("{}: {}", root.display(), e)
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !has_rom_extension(&file_name) {
            continue;
        }

        let display_name = display_name(root, entry.path()).unwrap_or(file_name);
        roms.push(CollectedRom::new(entry.into_path(), display_name));
    }

    log(LogCategory::Collect, LogLevel::Debug, || {
        format!("{}: {} ROM(s)", root.display(), roms.len())
    });
    roms
}

fn display_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(DISPLAY_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_nested_rom_gets_arrow_joined_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("x").join("y.gb"), b"").unwrap();

        let roms = collect_from_folder(dir.path());

        assert_eq!(roms.len(), 1);
        assert_eq!(roms[0].display_name, "x→y.gb");
        assert_eq!(roms[0].path, dir.path().join("x").join("y.gb"));
    }

    #[test]
    fn test_top_level_and_deep_roms() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(dir.path().join("top.GBC"), b"").unwrap();
        fs::write(deep.join("deep.gb"), b"").unwrap();
        fs::write(deep.join("skip.sav"), b"").unwrap();

        let mut names: Vec<_> = collect_from_folder(dir.path())
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        names.sort();

        assert_eq!(names, ["a→b→c→deep.gb", "top.GBC"]);
    }

    #[test]
    fn test_directory_named_like_rom_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("fake.gb")).unwrap();
        assert!(collect_from_folder(dir.path()).is_empty());
    }

    #[test]
    fn test_display_name_falls_back_when_outside_root() {
        assert_eq!(
            display_name(Path::new("/a/b"), Path::new("/c/d.gb")),
            None
        );
    }
}
