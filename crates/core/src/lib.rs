//! Core of the Game Boy ROM extension checker.
//!
//! Inputs (archives, folders, loose files) are collected into a flat list of
//! [`CollectedRom`]s, each ROM's CGB header flag is compared with its file
//! extension on a small worker pool, and the verdicts are rendered as a
//! fixed-width table. Nothing outside the temporary workspace is ever written.

pub mod cancel;
pub mod collect;
pub mod error;
pub mod extract;
pub mod logging;
pub mod report;
pub mod rom;
pub mod verify;
pub mod width;
pub mod workspace;

pub use cancel::CancelFlag;
pub use collect::{
    collect_all, resolve_inputs, ArchiveCollector, CollectEvent, CollectedRom, InputSource,
};
pub use error::CheckError;
pub use extract::{Extractor, SevenZipExtractor, ZipExtractor};
pub use report::{render_table, ReportStyle, Summary};
pub use rom::{check_rom, detect_header_type, HeaderType, RomVerdict, VerdictStatus};
pub use verify::{default_workers, verify_all};
pub use width::WidthStrategy;
pub use workspace::TemporaryWorkspace;
