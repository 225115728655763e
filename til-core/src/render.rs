//! Pure Markdown rendering for the legacy log.
//!
//! Entry block:
//!   ## YYYY-MM-DD
//!
//!   Message
//!
//!   <!-- notion-synced: false -->

use crate::entry::Entry;
use crate::parse_entries::is_markup_line;
use crate::paths::{attachment_file_name, markdown_body_file_name};

pub const LOG_HEADER: &str = "# Today I Learned\n\n";

/// Render one entry block. Bodies are referenced, never inlined.
pub fn format_log_entry(entry: &Entry) -> String {
    let day = entry.day_string();
    let mut block = format!(
        "## {day}\n\n{}\n\n<!-- notion-synced: {} -->\n\n",
        entry.message.trim(),
        entry.notion_synced
    );
    if entry.has_body() {
        block.push_str(&format!(
            "[Read more](files/{})\n\n",
            markdown_body_file_name(&day)
        ));
    }
    if !entry.files.is_empty() {
        block.push_str("Files:\n");
        for name in &entry.files {
            block.push_str(&format!(
                "- [{name}](files/{})\n",
                attachment_file_name(&day, name)
            ));
        }
        block.push('\n');
    }
    block
}

/// Whether `message` survives a write and re-parse of the log unchanged:
/// a single line that the parser will not mistake for markup.
pub fn fits_log_line(message: &str) -> bool {
    !message.contains(['\n', '\r']) && !is_markup_line(message)
}

/// Whole log, entries in the order given (storage order, oldest first).
pub fn render_log(entries: &[Entry]) -> String {
    let mut out = String::from(LOG_HEADER);
    for entry in entries {
        out.push_str(&format_log_entry(entry));
    }
    out
}
