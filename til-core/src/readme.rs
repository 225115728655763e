//! `README.md` summary table, regenerated whenever the journal is mirrored.

use crate::entry::Entry;
use crate::paths::attachment_file_name;
use crate::storage::EntryStore;

const ENTRIES_HEADING: &str = "## Entries";

pub const README_TEMPLATE: &str =
    "# Today I Learned\n\nA collection of things I've learned day to day.\n\n";

/// Rebuilds the README from `existing`, keeping everything above the entries
/// section. `entries` must already be newest first.
pub fn render_readme(existing: Option<&str>, entries: &[Entry], store: &dyn EntryStore) -> String {
    let preamble = existing
        .map(|text| match text.find(ENTRIES_HEADING) {
            Some(pos) => &text[..pos],
            None => text,
        })
        .unwrap_or(README_TEMPLATE);

    let mut out = preamble.trim_end().to_string();
    out.push_str("\n\n");
    out.push_str(ENTRIES_HEADING);
    out.push_str("\n\n| Date | Entry | Files |\n| ---- | ----- | ----- |\n");
    for entry in entries {
        out.push_str(&table_row(entry, store));
    }
    out
}

fn table_row(entry: &Entry, store: &dyn EntryStore) -> String {
    let message = escape_cell(&entry.message);
    let title = if entry.has_body() {
        format!("[{message}](files/{})", store.body_file_name(entry))
    } else {
        message
    };

    let key = store.attachment_key(entry);
    let files = entry
        .files
        .iter()
        .map(|name| {
            format!(
                "[{}](files/{})",
                escape_cell(name),
                attachment_file_name(&key, name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("| {} | {title} | {files} |\n", entry.day_string())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::YamlStore;
    use crate::tests::common::at;

    #[test]
    fn fresh_readme_has_template_and_table() {
        let store = YamlStore::new("til.yml");
        let entry = Entry::new("Plain", None, vec![], at(2025, 8, 15, 9, 0));
        let text = render_readme(None, &[entry], &store);

        assert!(text.starts_with("# Today I Learned\n\nA collection"));
        assert!(text.contains("## Entries\n\n| Date | Entry | Files |\n| ---- | ----- | ----- |\n"));
        assert!(text.ends_with("| 2025-08-15 | Plain |  |\n"));
    }

    #[test]
    fn links_bodies_and_files_by_store_key() {
        let store = YamlStore::new("til.yml");
        let entry = Entry::new(
            "With | pipe",
            Some("body".into()),
            vec!["a.png".into(), "b.txt".into()],
            at(2025, 8, 15, 9, 0),
        );
        let id = entry.commit_id.clone();
        let text = render_readme(None, &[entry], &store);

        assert!(text.contains(&format!("[With \\| pipe](files/body_{id}.md)")));
        assert!(text.contains(&format!("[a.png](files/{id}_a.png), [b.txt](files/{id}_b.txt)")));
    }

    #[test]
    fn keeps_custom_preamble_and_replaces_table() {
        let store = YamlStore::new("til.yml");
        let existing = "# My notes\n\nHand written intro.\n\n## Entries\n\n| Date | Entry | Files |\n| old | row | |\n";
        let entry = Entry::new("New", None, vec![], at(2025, 8, 15, 9, 0));
        let text = render_readme(Some(existing), &[entry], &store);

        assert!(text.starts_with("# My notes\n\nHand written intro.\n\n## Entries"));
        assert!(!text.contains("| old | row |"));
        assert_eq!(text.matches(ENTRIES_HEADING).count(), 1);
    }

    #[test]
    fn missing_section_is_appended() {
        let store = YamlStore::new("til.yml");
        let text = render_readme(Some("# Notes\n"), &[], &store);
        assert_eq!(
            text,
            "# Notes\n\n## Entries\n\n| Date | Entry | Files |\n| ---- | ----- | ----- |\n"
        );
    }
}
