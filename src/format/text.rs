//! Text formatting functions for `beans`.
//!
//! Provides plain text (non-ANSI) formatting for terminal output:
//! - Status icons (○ ◐ ✓)
//! - Priority and type badges
//! - Bean line formatting with width-aware title truncation

use beans_lib::Record;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Status icon characters.
pub mod icons {
    /// Open bean (hollow circle).
    pub const OPEN: &str = "○";
    /// In progress (half-filled).
    pub const IN_PROGRESS: &str = "◐";
    /// Done (checkmark).
    pub const DONE: &str = "✓";
    /// Any other status.
    pub const UNKNOWN: &str = "?";
}

/// Widest title shown on a list line.
pub const TITLE_WIDTH: usize = 50;

/// Return the icon character for a status.
#[must_use]
pub fn format_status_icon(status: &str) -> &'static str {
    match status {
        "open" => icons::OPEN,
        "in-progress" => icons::IN_PROGRESS,
        "done" => icons::DONE,
        _ => icons::UNKNOWN,
    }
}

/// Format a priority as a `!priority` badge; empty when unset.
#[must_use]
pub fn format_priority(priority: &str) -> String {
    if priority.is_empty() {
        String::new()
    } else {
        format!("!{priority}")
    }
}

/// Format a bean type as a bracketed badge.
#[must_use]
pub fn format_type_badge(record_type: &str) -> String {
    if record_type.is_empty() {
        String::new()
    } else {
        format!("[{record_type}]")
    }
}

/// Shorten `text` to at most `max_width` terminal columns, ending in "...".
#[must_use]
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(3);
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Format a single-line bean summary.
///
/// Format: `{icon} {id} [{type}] {!priority} {title}`
#[must_use]
pub fn format_record_line(record: &Record) -> String {
    let mut line = format!("{} {}", format_status_icon(&record.status), record.id);
    for badge in [
        format_type_badge(&record.record_type),
        format_priority(&record.priority),
    ] {
        if !badge.is_empty() {
            line.push(' ');
            line.push_str(&badge);
        }
    }
    line.push(' ');
    line.push_str(&truncate(&record.title, TITLE_WIDTH));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_record() -> Record {
        let mut record = Record::new("a1b2", "Test title");
        record.status = "open".to_string();
        record.record_type = "task".to_string();
        record
    }

    #[test]
    fn test_status_icons() {
        assert_eq!(format_status_icon("open"), "○");
        assert_eq!(format_status_icon("in-progress"), "◐");
        assert_eq!(format_status_icon("done"), "✓");
        assert_eq!(format_status_icon("custom"), "?");
    }

    #[test]
    fn test_format_record_line_open() {
        let record = make_test_record();
        assert_eq!(format_record_line(&record), "○ a1b2 [task] Test title");
    }

    #[test]
    fn test_format_record_line_with_priority() {
        let mut record = make_test_record();
        record.priority = "high".to_string();
        record.record_type = "bug".to_string();
        assert_eq!(format_record_line(&record), "○ a1b2 [bug] !high Test title");
    }

    #[test]
    fn test_format_record_line_without_type() {
        let mut record = make_test_record();
        record.record_type.clear();
        record.status = "done".to_string();
        assert_eq!(format_record_line(&record), "✓ a1b2 Test title");
    }

    #[test]
    fn test_truncate_counts_columns() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        // Each CJK character is two columns wide.
        assert_eq!(truncate("日本語のタイトル", 9), "日本語...");
    }
}
