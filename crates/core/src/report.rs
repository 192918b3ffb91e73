//! Fixed-width result table
//!
//! Rendering only starts once every verdict is in, and produces a complete
//! `String`; nothing is printed from here.

use std::fmt::Write;

use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::{RomVerdict, VerdictStatus};
use crate::width::WidthStrategy;

pub const NAME_WIDTH: usize = 48;
pub const STATUS_WIDTH: usize = 4;
pub const SUGGEST_WIDTH: usize = 10;

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportStyle {
    pub width: WidthStrategy,
    /// Plain-text status labels instead of emoji
    pub ascii: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub mismatch: usize,
    pub unknown: usize,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[RomVerdict]) -> Self {
        let total = verdicts.len();
        let count = |s| verdicts.iter().filter(|v| v.status == s).count();
        let ok = count(VerdictStatus::Ok);
        let mismatch = count(VerdictStatus::Mismatch);
        Self {
            total,
            ok,
            mismatch,
            unknown: total - ok - mismatch,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Total: {} | OK: {} | Mismatch: {} | Unknown: {}",
            self.total, self.ok, self.mismatch, self.unknown
        )
    }
}

/// Sort by display name, ignoring case. Equal names keep their order.
pub fn sort_verdicts(verdicts: &mut [RomVerdict]) {
    verdicts.sort_by_cached_key(|v| v.display_name.to_lowercase());
}

/// Render the table: a `=` rule, the header, a `-` rule, one row per verdict
/// and a closing `=` rule, all as wide as the header.
pub fn render_table(verdicts: &[RomVerdict], style: ReportStyle) -> String {
    let w = style.width;
    let header = [
        w.pad_to_width("File name", NAME_WIDTH),
        w.center("Stat", STATUS_WIDTH),
        w.pad_to_width("Suggest", SUGGEST_WIDTH),
    ]
    .join(COLUMN_GAP);
    let rule_width = w.display_width(&header);

    let mut sorted = verdicts.to_vec();
    sort_verdicts(&mut sorted);

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(rule_width));
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(rule_width));
    for verdict in &sorted {
        let name = w.truncate_to_width(&verdict.display_name, NAME_WIDTH);
        let row = [
            w.pad_to_width(&name, NAME_WIDTH),
            w.center(verdict.status.symbol(style.ascii), STATUS_WIDTH),
            w.pad_to_width(verdict.suggested_extension.unwrap_or(""), SUGGEST_WIDTH),
        ]
        .join(COLUMN_GAP);
        let _ = writeln!(out, "{row}");
    }
    let _ = writeln!(out, "{}", "=".repeat(rule_width));

    log(LogCategory::Report, LogLevel::Debug, || {
        format!("rendered {} row(s), {} cells wide", sorted.len(), rule_width)
    });
    out
}
