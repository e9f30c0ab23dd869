//! Per-hotspot call trees.
//!
//! Each ranked group prints its representative stack innermost first, two
//! spaces of indent per level. The innermost line carries the percentage,
//! right-aligned at [`PERCENT_COLUMN`].

use super::RenderOptions;
use super::theme::paint_row;
use crate::analysis::{RankedHotspot, Report};
use std::fmt::Write as _;

const BANNER_RULE: usize = 50;
const HEADER_COLUMN: usize = 40;

/// Width the innermost frame text is padded to before its percentage
pub const PERCENT_COLUMN: usize = 110;

/// Render the call tree section for one cycle.
#[must_use]
pub fn render_call_tree(report: &Report, options: &RenderOptions) -> String {
    let mut out = String::new();
    let rule = "=".repeat(BANNER_RULE);
    let _ = writeln!(out, "{rule}Print the call stack of the hotspot function{rule}");
    let _ = writeln!(
        out,
        "{:<w$}{:<w$}{:>w$}",
        "@symbol",
        "@module",
        "@percent",
        w = HEADER_COLUMN
    );
    for hotspot in &report.hotspots {
        write_stack(&mut out, hotspot, options);
    }
    out
}

fn write_stack(out: &mut String, hotspot: &RankedHotspot, options: &RenderOptions) {
    let blocked = hotspot.group.is_blocked();
    for (depth, frame) in hotspot.group.representative_stack().iter().enumerate() {
        let info = format!("{} {}", frame.identity(), frame.module_or_unknown());
        let line = if depth == 0 {
            format!("|——{info:<width$}{:.2}%", hotspot.percent, width = PERCENT_COLUMN)
        } else {
            format!("{}|——{info}", "  ".repeat(depth))
        };
        let _ = writeln!(out, "{}", paint_row(&line, blocked, options.color));
    }
}
