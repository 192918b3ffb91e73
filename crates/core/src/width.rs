//! Terminal display width for mixed East-Asian/ASCII text.
//!
//! All measurement goes through a [`WidthStrategy`] picked once from the
//! settings, so the table code never cares which measurement is active.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Marker inserted where characters were cut out of a name
pub const ELLIPSIS: &str = "...";

/// Widest display width kept from the end of a truncated name
const TAIL_WIDTH: usize = 4;

/// Longest suffix (dot included, in characters) still treated as an extension
const MAX_EXT_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthStrategy {
    /// Unicode East Asian Width table
    #[default]
    Unicode,
    /// Any non-ASCII code point counts as two cells
    Codepoint,
}

impl WidthStrategy {
    pub fn char_width(self, c: char) -> usize {
        match self {
            // Control characters have no width of their own.
            WidthStrategy::Unicode => c.width().unwrap_or(0),
            WidthStrategy::Codepoint => {
                if (c as u32) > 127 {
                    2
                } else {
                    1
                }
            }
        }
    }

    pub fn display_width(self, text: &str) -> usize {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Append spaces until `text` is `target` cells wide. Never removes anything.
    pub fn pad_to_width(self, text: &str, target: usize) -> String {
        let current = self.display_width(text);
        let mut out = String::with_capacity(text.len() + target.saturating_sub(current));
        out.push_str(text);
        for _ in current..target {
            out.push(' ');
        }
        out
    }

    /// Center `text` in a `width`-cell field, putting the odd space on the right.
    pub fn center(self, text: &str, width: usize) -> String {
        let pad = width.saturating_sub(self.display_width(text));
        let left = pad / 2;
        let mut out = " ".repeat(left);
        out.push_str(text);
        out.push_str(&" ".repeat(pad - left));
        out
    }

    /// Shorten `text` to at most `max_width` cells, keeping its extension and
    /// up to four cells of the end of its stem.
    ///
    /// The result is `prefix + "..." + tail + ext`. When not even the ellipsis
    /// and extension fit, `"..." + ext` is returned, which may exceed
    /// `max_width`.
    pub fn truncate_to_width(self, text: &str, max_width: usize) -> String {
        if self.display_width(text) <= max_width {
            return text.to_string();
        }

        let (base, ext) = split_extension(text);
        let ext_width = self.display_width(ext);
        let ellipsis_width = self.display_width(ELLIPSIS);

        if max_width <= ellipsis_width + ext_width {
            return format!("{ELLIPSIS}{ext}");
        }

        let base_chars: Vec<char> = base.chars().collect();

        // The tail never takes room the ellipsis and extension need.
        let tail_budget = TAIL_WIDTH.min(max_width - ellipsis_width - ext_width);
        let mut tail_start = base_chars.len();
        let mut tail_width = 0;
        while tail_start > 0 {
            let cw = self.char_width(base_chars[tail_start - 1]);
            if tail_width + cw > tail_budget {
                break;
            }
            tail_width += cw;
            tail_start -= 1;
        }

        let prefix_budget = max_width - tail_width - ellipsis_width - ext_width;
        let mut prefix_end = 0;
        let mut prefix_width = 0;
        while prefix_end < tail_start {
            let cw = self.char_width(base_chars[prefix_end]);
            if prefix_width + cw > prefix_budget {
                break;
            }
            prefix_width += cw;
            prefix_end += 1;
        }

        let mut out = String::with_capacity(text.len());
        out.extend(&base_chars[..prefix_end]);
        out.push_str(ELLIPSIS);
        out.extend(&base_chars[tail_start..]);
        out.push_str(ext);
        out
    }
}

/// Split at the last `.` when the suffix is short enough to be an extension.
fn split_extension(text: &str) -> (&str, &str) {
    match text.rfind('.') {
        Some(dot) if text[dot..].chars().count() <= MAX_EXT_CHARS => text.split_at(dot),
        _ => (text, ""),
    }
}
