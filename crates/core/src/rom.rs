//! Game Boy header classification
//!
//! Only the CGB flag at 0x143 is read. 0x00 marks an original Game Boy
//! cartridge, 0x80 (CGB enhanced) and 0xC0 (CGB only) mark Game Boy Color.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::logging::{log, LogCategory, LogLevel};

/// Offset of the CGB flag in the cartridge header
pub const CGB_FLAG_OFFSET: u64 = 0x143;

/// File extensions handled by the checker, lowercase without the dot
pub const ROM_EXTENSIONS: [&str; 2] = ["gb", "gbc"];

/// Hardware declared by a ROM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum HeaderType {
    GB,
    GBC,
    Unknown,
}

impl HeaderType {
    pub fn from_cgb_flag(flag: u8) -> Self {
        match flag {
            0x00 => HeaderType::GB,
            0x80 | 0xC0 => HeaderType::GBC,
            _ => HeaderType::Unknown,
        }
    }

    /// Extension (with dot) a file of this type should carry
    pub fn expected_extension(self) -> Option<&'static str> {
        match self {
            HeaderType::GB => Some(".gb"),
            HeaderType::GBC => Some(".gbc"),
            HeaderType::Unknown => None,
        }
    }
}

/// Whether `name` ends in `.` plus one of `extensions`, ignoring case
pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_lowercase();
    extensions
        .iter()
        .any(|ext| lower.strip_suffix(ext).is_some_and(|s| s.ends_with('.')))
}

/// Whether `name` ends in .gb or .gbc, ignoring case
pub fn has_rom_extension(name: &str) -> bool {
    has_extension(name, &ROM_EXTENSIONS)
}

/// Read the CGB flag of the ROM at `path`.
///
/// A file that cannot be opened or is too short to hold the flag is
/// `Unknown`.
pub fn detect_header_type(path: &Path) -> HeaderType {
    match read_cgb_flag(path) {
        Ok(Some(flag)) => HeaderType::from_cgb_flag(flag),
        Ok(None) => {
            log(LogCategory::Verify, LogLevel::Debug, || {
                format!("{}: shorter than the cartridge header", path.display())
            });
            HeaderType::Unknown
        }
        Err(e) => {
            log(LogCategory::Verify, LogLevel::Warn, || {
                format!("{}: unreadable: {}", path.display(), e)
            });
            HeaderType::Unknown
        }
    }
}

fn read_cgb_flag(path: &Path) -> std::io::Result<Option<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(CGB_FLAG_OFFSET))?;
    let mut buf = [0u8; 1];
    match file.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Ok,
    Mismatch,
    Unknown,
}

impl VerdictStatus {
    pub fn symbol(self, ascii: bool) -> &'static str {
        match (self, ascii) {
            (VerdictStatus::Ok, false) => "✅",
            (VerdictStatus::Mismatch, false) => "❌",
            (VerdictStatus::Unknown, false) => "⚠",
            (VerdictStatus::Ok, true) => "OK",
            (VerdictStatus::Mismatch, true) => "BAD",
            (VerdictStatus::Unknown, true) => "??",
        }
    }
}

/// Outcome of checking one collected ROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomVerdict {
    pub display_name: String,
    pub status: VerdictStatus,
    /// Set only for `Mismatch`
    pub suggested_extension: Option<&'static str>,
}

/// Compare the declared hardware of `path` with its extension.
pub fn check_rom(path: &Path, display_name: &str) -> RomVerdict {
    let header = detect_header_type(path);
    let Some(expected) = header.expected_extension() else {
        return RomVerdict {
            display_name: display_name.to_string(),
            status: VerdictStatus::Unknown,
            suggested_extension: None,
        };
    };

    let current = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let (status, suggested_extension) = if current == expected {
        (VerdictStatus::Ok, None)
    } else {
        (VerdictStatus::Mismatch, Some(expected))
    };

    log(LogCategory::Verify, LogLevel::Trace, || {
        format!("{}: {:?} header, {:?}", path.display(), header, status)
    });

    RomVerdict {
        display_name: display_name.to_string(),
        status,
        suggested_extension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_rom(dir: &Path, name: &str, flag: u8) -> PathBuf {
        let mut data = vec![0u8; 0x150];
        data[CGB_FLAG_OFFSET as usize] = flag;
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_cgb_flag_mapping() {
        assert_eq!(HeaderType::from_cgb_flag(0x00), HeaderType::GB);
        assert_eq!(HeaderType::from_cgb_flag(0x80), HeaderType::GBC);
        assert_eq!(HeaderType::from_cgb_flag(0xC0), HeaderType::GBC);
        assert_eq!(HeaderType::from_cgb_flag(0x55), HeaderType::Unknown);
        assert_eq!(HeaderType::from_cgb_flag(0x40), HeaderType::Unknown);
    }

    #[test]
    fn test_has_rom_extension() {
        assert!(has_rom_extension("Tetris.gb"));
        assert!(has_rom_extension("ZELDA.GBC"));
        assert!(has_rom_extension("a.Gb"));
        assert!(!has_rom_extension("readme.txt"));
        assert!(!has_rom_extension("gb"));
        assert!(!has_rom_extension("rom.agb"));
        assert!(!has_rom_extension("game.gba"));
    }

    #[test]
    fn test_gb_header_with_gb_extension_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rom(dir.path(), "tetris.gb", 0x00);
        let verdict = check_rom(&path, "tetris.gb");
        assert_eq!(verdict.status, VerdictStatus::Ok);
        assert_eq!(verdict.suggested_extension, None);
        assert_eq!(verdict.display_name, "tetris.gb");
    }

    #[test]
    fn test_cgb_only_header_with_gb_extension_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rom(dir.path(), "crystal.gb", 0xC0);
        let verdict = check_rom(&path, "crystal.gb");
        assert_eq!(verdict.status, VerdictStatus::Mismatch);
        assert_eq!(verdict.suggested_extension, Some(".gbc"));
    }

    #[test]
    fn test_gb_header_with_gbc_extension_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rom(dir.path(), "red.gbc", 0x00);
        let verdict = check_rom(&path, "red.gbc");
        assert_eq!(verdict.status, VerdictStatus::Mismatch);
        assert_eq!(verdict.suggested_extension, Some(".gb"));
    }

    #[test]
    fn test_extension_compare_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rom(dir.path(), "GOLD.GBC", 0x80);
        assert_eq!(check_rom(&path, "GOLD.GBC").status, VerdictStatus::Ok);
    }

    #[test]
    fn test_unknown_flag_is_unknown_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["x.gb", "x.gbc"] {
            let path = write_rom(dir.path(), name, 0x55);
            let verdict = check_rom(&path, name);
            assert_eq!(verdict.status, VerdictStatus::Unknown);
            assert_eq!(verdict.suggested_extension, None);
        }
    }

    #[test]
    fn test_short_or_missing_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short.gb");
        fs::write(&short, [0u8; 0x143]).unwrap();
        assert_eq!(detect_header_type(&short), HeaderType::Unknown);
        assert_eq!(
            detect_header_type(&dir.path().join("missing.gb")),
            HeaderType::Unknown
        );
    }

    #[test]
    fn test_status_symbols() {
        assert_eq!(VerdictStatus::Ok.symbol(true), "OK");
        assert_eq!(VerdictStatus::Mismatch.symbol(true), "BAD");
        assert_eq!(VerdictStatus::Unknown.symbol(false), "⚠");
    }
}
