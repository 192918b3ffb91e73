//! Parallel header checks over the collected ROMs
//!
//! Every check opens its own file and reads one byte, so tasks share nothing
//! but the result vector rayon assembles for us.

use std::thread;

use rayon::prelude::*;

use crate::cancel::CancelFlag;
use crate::collect::CollectedRom;
use crate::error::{CheckError, Result};
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::{check_rom, RomVerdict};

/// Upper bound on verification threads
pub const MAX_WORKERS: usize = 4;

/// `min(4, available parallelism)`, or 2 when parallelism is unknown
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .min(MAX_WORKERS)
}

/// Check every ROM on a dedicated pool of `workers` threads.
///
/// `on_done` runs on the worker thread right after each check, in completion
/// order. The returned verdicts are in no particular order.
pub fn verify_all<F>(
    roms: &[CollectedRom],
    workers: usize,
    cancel: &CancelFlag,
    on_done: F,
) -> Result<Vec<RomVerdict>>
where
    F: Fn(&RomVerdict) + Sync,
{
    let workers = workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("romcheck-verify-{i}"))
        .build()?;

    log(LogCategory::Verify, LogLevel::Info, || {
        format!("checking {} ROM(s) on {} worker(s)", roms.len(), workers)
    });

    let verdicts: Vec<RomVerdict> = pool.install(|| {
        roms.par_iter()
            .filter_map(|rom| {
                if cancel.is_cancelled() {
                    return None;
                }
                let verdict = check_rom(&rom.path, &rom.display_name);
                on_done(&verdict);
                Some(verdict)
            })
            .collect()
    });

    if cancel.is_cancelled() {
        return Err(CheckError::Cancelled);
    }
    Ok(verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::{VerdictStatus, CGB_FLAG_OFFSET};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_roms(dir: &std::path::Path, count: usize) -> Vec<CollectedRom> {
        (0..count)
            .map(|i| {
                let mut data = vec![0u8; 0x150];
                data[CGB_FLAG_OFFSET as usize] = if i % 2 == 0 { 0x00 } else { 0x80 };
                let path = dir.join(format!("rom{i}.gb"));
                fs::write(&path, data).unwrap();
                CollectedRom::new(path, format!("rom{i}.gb"))
            })
            .collect()
    }

    #[test]
    fn test_default_workers_is_bounded() {
        let n = default_workers();
        assert!((1..=MAX_WORKERS).contains(&n));
    }

    #[test]
    fn test_every_rom_gets_a_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let roms = make_roms(dir.path(), 25);
        let done = AtomicUsize::new(0);

        let verdicts = verify_all(&roms, 4, &CancelFlag::new(), |_| {
            done.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        assert_eq!(verdicts.len(), 25);
        assert_eq!(done.load(Ordering::Relaxed), 25);
        let ok = verdicts
            .iter()
            .filter(|v| v.status == VerdictStatus::Ok)
            .count();
        assert_eq!(ok, 13);
    }

    #[test]
    fn test_zero_workers_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let roms = make_roms(dir.path(), 3);
        let verdicts = verify_all(&roms, 0, &CancelFlag::new(), |_| {}).unwrap();
        assert_eq!(verdicts.len(), 3);
    }

    #[test]
    fn test_cancelled_run_reports_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let roms = make_roms(dir.path(), 5);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = verify_all(&roms, 2, &cancel, |_| {}).unwrap_err();
        assert!(matches!(err, CheckError::Cancelled));
    }
}
