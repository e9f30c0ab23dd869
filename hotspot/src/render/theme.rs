//! Terminal styling for the report
//!
//! Off-CPU rows are painted red. crossterm drops the escape codes on its
//! own when `NO_COLOR` is set.

use crossterm::style::{Color, Stylize};

/// Color of rows holding off-CPU ("blocked") samples
pub const BLOCKED_RED: Color = Color::Red;

/// Wrap `line` in the blocked style when `blocked` and color are both on.
#[must_use]
pub fn paint_row(line: &str, blocked: bool, color: bool) -> String {
    if blocked && color {
        line.with(BLOCKED_RED).to_string()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rows_untouched() {
        assert_eq!(paint_row("  foo", false, true), "  foo");
        assert_eq!(paint_row("  foo", true, false), "  foo");
    }

    #[test]
    fn test_blocked_rows_styled() {
        let painted = paint_row("  foo", true, true);
        assert!(painted.contains("  foo"));
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(painted.starts_with("\u{1b}["));
            assert_ne!(painted, "  foo");
        }
    }
}
