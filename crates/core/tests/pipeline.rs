//! End-to-end run over a temporary tree: resolve, collect, verify, render.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use romcheck_core::error::Result;
use romcheck_core::rom::CGB_FLAG_OFFSET;
use romcheck_core::{
    collect_all, render_table, resolve_inputs, verify_all, ArchiveCollector, CancelFlag,
    CheckError, CollectEvent, CollectedRom, Extractor, ReportStyle, Summary, TemporaryWorkspace,
    VerdictStatus, ZipExtractor,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn rom_bytes(flag: u8) -> Vec<u8> {
    let mut data = vec![0u8; 0x200];
    data[CGB_FLAG_OFFSET as usize] = flag;
    data
}

/// 7z backend that never finds anything
struct EmptySevenZip;

impl Extractor for EmptySevenZip {
    fn extract(&self, _: &Path, _: &[&str], _: &Path) -> Result<Vec<CollectedRom>> {
        Err(CheckError::NoMatchingEntries)
    }
}

#[test]
fn test_mixed_inputs_end_to_end() {
    let root = tempfile::tempdir().unwrap();

    // Folder with a nested ROM declaring GBC but named .gb
    let folder = root.path().join("library");
    fs::create_dir_all(folder.join("gbc")).unwrap();
    fs::write(folder.join("gbc").join("crystal.gb"), rom_bytes(0xC0)).unwrap();

    // Zip holding two entries with the same base name
    let archive = root.path().join("pack.zip");
    let mut zip = ZipWriter::new(File::create(&archive).unwrap());
    for (name, flag) in [("tetris.gb", 0x00), ("dupes/tetris.gb", 0x80)] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(&rom_bytes(flag)).unwrap();
    }
    zip.finish().unwrap();

    // A loose ROM with an unrecognised flag, an empty 7z, and junk
    let loose = root.path().join("homebrew.gbc");
    fs::write(&loose, rom_bytes(0x55)).unwrap();
    let seven = root.path().join("empty.7z");
    fs::write(&seven, b"").unwrap();
    let junk = root.path().join("notes.txt");
    fs::write(&junk, b"").unwrap();

    let resolved = resolve_inputs([
        &folder,
        &archive,
        &loose,
        &seven,
        &junk,
        &root.path().join("gone.zip"),
    ]);
    assert_eq!(resolved.sources.len(), 4);
    assert_eq!(resolved.skipped.len(), 2);

    let workspace = TemporaryWorkspace::new();
    let collector = ArchiveCollector::with_backends(
        &workspace,
        Box::new(ZipExtractor),
        Box::new(EmptySevenZip),
    );

    let mut archive_statuses = Vec::new();
    let roms = collect_all(&resolved.sources, &collector, &CancelFlag::new(), |event| {
        if let CollectEvent::Archive { outcome, .. } = event {
            archive_statuses.push((outcome.is_failure(), outcome.status()));
        }
    })
    .unwrap();

    assert_eq!(roms.len(), 4);
    let workspace_root = workspace.path().unwrap().to_path_buf();
    assert_eq!(archive_statuses.len(), 2);
    assert!(archive_statuses.iter().all(|(failed, _)| !failed));

    let verdicts = verify_all(&roms, 2, &CancelFlag::new(), |_| {}).unwrap();
    let summary = Summary::from_verdicts(&verdicts);
    assert_eq!(
        summary,
        Summary {
            total: 4,
            ok: 1,
            mismatch: 2,
            unknown: 1
        }
    );

    let crystal = verdicts
        .iter()
        .find(|v| v.display_name == "gbc→crystal.gb")
        .unwrap();
    assert_eq!(crystal.status, VerdictStatus::Mismatch);
    assert_eq!(crystal.suggested_extension, Some(".gbc"));

    let tetris: Vec<_> = verdicts
        .iter()
        .filter(|v| v.display_name == "tetris.gb")
        .collect();
    assert_eq!(tetris.len(), 2);

    let table = render_table(
        &verdicts,
        ReportStyle {
            ascii: true,
            ..ReportStyle::default()
        },
    );
    let rows: Vec<&str> = table.lines().skip(3).take(4).collect();
    assert!(rows[0].starts_with("gbc→crystal.gb"));
    assert!(rows[1].starts_with("homebrew.gbc"));
    assert!(rows[2].starts_with("tetris.gb"));
    assert!(rows[3].starts_with("tetris.gb"));

    drop(collector);
    drop(workspace);
    assert!(!workspace_root.exists());
}

#[test]
fn test_cancelled_collection_stops_early() {
    let root = tempfile::tempdir().unwrap();
    let loose = root.path().join("a.gb");
    fs::write(&loose, rom_bytes(0x00)).unwrap();

    let resolved = resolve_inputs([&loose]);
    let workspace = TemporaryWorkspace::new();
    let collector = ArchiveCollector::with_backends(
        &workspace,
        Box::new(ZipExtractor),
        Box::new(EmptySevenZip),
    );
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = collect_all(&resolved.sources, &collector, &cancel, |_| {}).unwrap_err();
    assert!(matches!(err, CheckError::Cancelled));
    assert!(workspace.path().is_none());
}

#[test]
fn test_loose_roms_need_no_workspace() {
    let root = tempfile::tempdir().unwrap();
    let loose = root.path().join("a.gb");
    fs::write(&loose, rom_bytes(0x00)).unwrap();
    fs::create_dir(root.path().join("folder")).unwrap();

    let resolved = resolve_inputs([loose, root.path().join("folder")]);
    let workspace = TemporaryWorkspace::new();
    let collector = ArchiveCollector::with_backends(
        &workspace,
        Box::new(ZipExtractor),
        Box::new(EmptySevenZip),
    );

    let roms = collect_all(&resolved.sources, &collector, &CancelFlag::new(), |_| {}).unwrap();
    assert_eq!(roms.len(), 1);
    assert!(workspace.path().is_none());
}
