//! Text rendering of a cycle's report
//!
//! Everything here builds plain `String`s; the driver decides where they
//! go. Rendering is total: any name length, any module string, and an empty
//! ranking all produce output.

pub mod call_tree;
pub mod table;
pub mod theme;

pub use call_tree::render_call_tree;
pub use table::render_table;

use crate::analysis::Report;

/// Display width of the function column (the row indent is extra).
pub const NAME_WIDTH: usize = 78;

/// Width of the table rules.
pub const TABLE_WIDTH: usize = 140;

const ELLIPSIS: &str = "...";

/// Presentation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Paint off-CPU rows. `NO_COLOR` disables this regardless.
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Abbreviate names longer than [`NAME_WIDTH`] to exactly that width.
///
/// Keeps the first 38 characters and the last 37, joined by `...`.
#[must_use]
pub fn truncate_name(name: &str) -> String {
    let len = name.chars().count();
    if len <= NAME_WIDTH {
        return name.to_string();
    }

    let half = NAME_WIDTH / 2 - 1;
    let tail_start = (len + half + ELLIPSIS.len()).saturating_sub(NAME_WIDTH).clamp(half, len);

    let mut out: String = name.chars().take(half).collect();
    out.push_str(ELLIPSIS);
    out.extend(name.chars().skip(tail_start));
    out
}

/// Last path component of a module, the whole string if it has no `/`.
#[must_use]
pub fn module_basename(module: &str) -> &str {
    module.rsplit_once('/').map_or(module, |(_, base)| base)
}

/// One-line header printed before each cycle's report.
#[must_use]
pub fn cycle_banner(cycle: u32, count: u32, report: &Report) -> String {
    format!(
        "cycle {cycle}/{count}: {} samples, total weight {}",
        report.sample_count, report.total_weight
    )
}

/// Full report for one cycle: banner, flat table, call trees.
#[must_use]
pub fn render_report(cycle: u32, count: u32, report: &Report, options: &RenderOptions) -> String {
    let mut out = cycle_banner(cycle, count, report);
    out.push('\n');
    out.push_str(&render_table(report, options));
    out.push_str(&render_call_tree(report, options));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_unchanged() {
        assert_eq!(truncate_name(""), "");
        assert_eq!(truncate_name("main"), "main");
        let exact = "a".repeat(78);
        assert_eq!(truncate_name(&exact), exact);
    }

    #[test]
    fn test_long_names_keep_head_and_tail() {
        let name: String = (0..200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let short = truncate_name(&name);

        assert_eq!(short.chars().count(), 78);
        assert_eq!(&short[..38], &name[..38]);
        assert_eq!(&short[38..41], "...");
        assert_eq!(&short[41..], &name[200 - 37..]);
    }

    #[test]
    fn test_marginally_long_name() {
        let name = "b".repeat(38) + &"c".repeat(41);
        assert_eq!(name.len(), 79);
        let short = truncate_name(&name);
        assert_eq!(short, "b".repeat(38) + "..." + &"c".repeat(37));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let name = "λ".repeat(100);
        let short = truncate_name(&name);
        assert_eq!(short.chars().count(), 78);
        assert!(short.contains("..."));
    }

    #[test]
    fn test_module_basename() {
        assert_eq!(module_basename("/usr/lib64/libc.so.6"), "libc.so.6");
        assert_eq!(module_basename("a.so"), "a.so");
        assert_eq!(module_basename("dir/"), "");
        assert_eq!(module_basename("UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn test_report_sections_in_order() {
        let report = Report { total_weight: 42, sample_count: 3, ..Report::default() };
        let out = render_report(2, 5, &report, &RenderOptions { color: false });
        let banner = out.lines().next().unwrap();
        assert_eq!(banner, "cycle 2/5: 3 samples, total weight 42");
        let table = out.find(" Function").unwrap();
        let tree = out.find("Print the call stack").unwrap();
        assert!(table < tree);
    }
}
