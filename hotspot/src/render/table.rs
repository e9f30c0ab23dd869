//! Flat hotspot table: one row per ranked group.
//!
//! ```text
//! ============================================================ … (140)
//! ------------------------------------------------------------ … (140)
//!  Function                        Weight    Module    weight(%)
//! ------------------------------------------------------------ …
//!   foo                            150       a.so      83.33%
//!   bar                            30        b.so      16.67%
//! ____________________________________________________________ …
//! ```

use super::theme::paint_row;
use super::{module_basename, truncate_name, RenderOptions, NAME_WIDTH, TABLE_WIDTH};
use crate::analysis::Report;
use crate::domain::UNKNOWN;
use std::fmt::Write as _;

const WEIGHT_WIDTH: usize = 20;
const MODULE_WIDTH: usize = 40;

/// Render the flat table for one cycle.
#[must_use]
pub fn render_table(report: &Report, options: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(TABLE_WIDTH));
    let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));
    let _ = writeln!(
        out,
        "{:<name$}{:<weight$}{:<module$}weight(%)",
        " Function",
        " Weight",
        " Module",
        name = NAME_WIDTH + 2,
        weight = WEIGHT_WIDTH,
        module = MODULE_WIDTH,
    );
    let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));

    for hotspot in &report.hotspots {
        let group = &hotspot.group;
        let (name, module) = match group.leaf() {
            Some(leaf) => (leaf.identity(), module_basename(leaf.module_or_unknown())),
            None => (String::new(), UNKNOWN),
        };
        let row = format!(
            "  {:<name_w$}{:<weight_w$}{:<module_w$}{:.2}%",
            truncate_name(&name),
            group.total_weight(),
            module,
            hotspot.percent,
            name_w = NAME_WIDTH,
            weight_w = WEIGHT_WIDTH,
            module_w = MODULE_WIDTH,
        );
        let _ = writeln!(out, "{}", paint_row(&row, group.is_blocked(), options.color));
    }

    let _ = writeln!(out, "{}", "_".repeat(TABLE_WIDTH));
    out
}
