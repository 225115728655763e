//! Parses the legacy Markdown log (`til.md`) into entries.
//!
//! ```text
//! # Today I Learned
//!
//! ## 2025-08-15
//!
//! Rust lifetimes
//!
//! <!-- notion-synced: false -->
//!
//! [Read more](files/2025-08-15_body.md)
//!
//! Files:
//! - [diagram.png](files/2025-08-15_diagram.png)
//! ```

use crate::entry::{DAY_FORMAT, Entry};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static SYNCED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*notion-synced:\s*(\w+)\s*-->").unwrap());
static FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^- \[([^\]]+)\]\(files/").unwrap());

/// An entry as it appears in the log. Bodies live in separate files, so the
/// parser only records whether one is referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub entry: Entry,
    pub read_more: bool,
}

enum State {
    NoEntry,
    InEntry(LogEntry),
}

/// Parses the whole log. Entries come back latest first; anything under a
/// heading whose date does not parse is dropped.
pub fn parse_log(content: &str) -> Vec<LogEntry> {
    let mut parsed = Vec::new();
    let mut state = State::NoEntry;

    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(heading) = line.strip_prefix("## ") {
            if let State::InEntry(done) = std::mem::replace(&mut state, State::NoEntry) {
                parsed.push(done);
            }
            if let Some(entry) = entry_for_heading(heading) {
                state = State::InEntry(LogEntry {
                    entry,
                    read_more: false,
                });
            }
            continue;
        }

        let State::InEntry(current) = &mut state else {
            continue;
        };

        if line.contains("<!-- notion-synced:") {
            if let Some(caps) = SYNCED_RE.captures(line) {
                current.entry.notion_synced = &caps[1] == "true";
            }
        } else if is_read_more(line) {
            current.read_more = true;
        } else if line == "Files:" {
            // list follows
        } else if let Some(caps) = FILE_RE.captures(line) {
            current.entry.files.push(caps[1].to_string());
        } else if current.entry.message.is_empty() {
            current.entry.message = line.to_string();
        }
    }

    if let State::InEntry(done) = state {
        parsed.push(done);
    }
    parsed.reverse();
    parsed
}

/// Whether `line` is read as log structure (a heading, sync marker, body
/// link or file list item) instead of as an entry message.
pub fn is_markup_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("## ")
        || line.contains("<!-- notion-synced:")
        || is_read_more(line)
        || line == "Files:"
        || FILE_RE.is_match(line)
}

fn is_read_more(line: &str) -> bool {
    line.starts_with("[Read more]") && line.contains("_body.md)")
}

/// Headings carry only a day; the entry is placed at the first hour of it
/// that exists locally (midnight unless a DST jump skips it).
fn entry_for_heading(heading: &str) -> Option<Entry> {
    let day = NaiveDate::parse_from_str(heading.trim(), DAY_FORMAT).ok()?;
    let date = (0..3).find_map(|hour| {
        day.and_hms_opt(hour, 0, 0)?
            .and_local_timezone(Local)
            .earliest()
    })?;
    Some(Entry {
        date,
        message: String::new(),
        message_body: None,
        files: Vec::new(),
        is_committed: true,
        notion_synced: false,
        commit_id: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"# Today I Learned

## 2025-08-14

Borrow checker basics

<!-- notion-synced: true -->

## 2025-08-15

Rust lifetimes

<!-- notion-synced: false -->

[Read more](files/2025-08-15_body.md)

Files:
- [diagram.png](files/2025-08-15_diagram.png)
- [notes.txt](files/2025-08-15_notes.txt)
"#;

    #[test]
    fn parses_entries_latest_first() {
        let parsed = parse_log(LOG);
        assert_eq!(parsed.len(), 2);

        let latest = &parsed[0];
        assert_eq!(latest.entry.day_string(), "2025-08-15");
        assert_eq!(latest.entry.message, "Rust lifetimes");
        assert!(!latest.entry.notion_synced);
        assert!(latest.read_more);
        assert_eq!(latest.entry.files, ["diagram.png", "notes.txt"]);

        let oldest = &parsed[1];
        assert_eq!(oldest.entry.message, "Borrow checker basics");
        assert!(oldest.entry.notion_synced);
        assert!(!oldest.read_more);
        assert!(oldest.entry.files.is_empty());
    }

    #[test]
    fn unparsable_heading_drops_its_block() {
        let log = "## not-a-date\n\nLost\n\n## 2025-01-02\n\nKept\n";
        let parsed = parse_log(log);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].entry.message, "Kept");
    }

    #[test]
    fn only_the_first_free_line_is_the_message() {
        let log = "## 2025-01-02\n\nTitle\n\nstray paragraph\n";
        let parsed = parse_log(log);
        assert_eq!(parsed[0].entry.message, "Title");
    }

    #[test]
    fn header_only_log_is_empty() {
        assert!(parse_log("# Today I Learned\n\n").is_empty());
        assert!(parse_log("").is_empty());
    }

    #[test]
    fn markup_lines_are_recognised() {
        for line in [
            "## 2024-01-01",
            "Files:",
            "- [a.png](files/2025-01-01_a.png)",
            "<!-- notion-synced: true -->",
            "[Read more](files/2025-01-01_body.md)",
        ] {
            assert!(is_markup_line(line), "{line}");
        }
        assert!(!is_markup_line("Rust lifetimes"));
        assert!(!is_markup_line("# not a day heading"));
        assert!(!is_markup_line("Files: are just bytes"));
    }

    #[test]
    fn heading_dates_land_at_local_midnight() {
        let parsed = parse_log("## 2025-03-09\n\nDST week\n");
        let date = parsed[0].entry.date;
        assert_eq!(date.format("%H:%M").to_string(), "00:00");
    }
}
