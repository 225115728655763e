//! One-shot conversion of a legacy `til.md` repository to `til.yml`.

use crate::error::{IoContext, Result, TilError};
use crate::paths::{attachment_file_name, locate_attachment, yaml_body_file_name};
use crate::storage::{EntryStore, MarkdownStore, YamlStore, atomic_write};
use crate::til::Til;
use std::fs;

impl Til {
    /// Moves every Markdown entry into the YAML store, re-keys bodies and
    /// attachments by commit id and keeps the old log as `til.md.bak`.
    /// Returns the number of migrated entries.
    pub fn migrate(&mut self) -> Result<usize> {
        let paths = self.paths().clone();
        let markdown_path = paths.markdown_file();
        if !markdown_path.is_file() {
            return Err(TilError::NothingToMigrate);
        }

        let yaml = YamlStore::new(paths.yaml_file());
        if !yaml.load()?.is_empty() {
            return Err(TilError::MigrationConflict(paths.yaml_file()));
        }

        let files_dir = paths.files_dir();
        let legacy = MarkdownStore::new(&markdown_path, &files_dir);
        let entries = legacy.load()?;

        fs::create_dir_all(&files_dir)
            .with_context(|| format!("creating {}", files_dir.display()))?;
        for entry in &entries {
            if let Some(body) = &entry.message_body {
                atomic_write(&files_dir.join(yaml_body_file_name(&entry.commit_id)), body)?;
            }
            for name in &entry.files {
                let target = files_dir.join(attachment_file_name(&entry.commit_id, name));
                if target.exists() {
                    continue;
                }
                match locate_attachment(&files_dir, entry, name) {
                    Some(source) => {
                        fs::copy(&source, &target).with_context(|| {
                            format!("copying {} to {}", source.display(), target.display())
                        })?;
                    }
                    None => tracing::warn!("attachment {name} of '{}' is missing", entry.message),
                }
            }
        }

        yaml.save(&entries)?;
        let backup = paths.markdown_backup();
        fs::rename(&markdown_path, &backup).with_context(|| {
            format!("renaming {} to {}", markdown_path.display(), backup.display())
        })?;
        self.store = Box::new(yaml);
        tracing::debug!("migrated {} entries", entries.len());
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageFormat;
    use crate::tests::common::{mk_config, write_file};
    use tempfile::tempdir;

    const LEGACY: &str = "# Today I Learned\n\n## 2025-08-14\n\nOlder\n\n<!-- notion-synced: true -->\n\n## 2025-08-15\n\nNewer\n\n<!-- notion-synced: false -->\n\n[Read more](files/2025-08-15_body.md)\n\nFiles:\n- [a.png](files/2025-08-15_a.png)\n";

    fn legacy_til() -> (Til, tempfile::TempDir) {
        let tmp = tempdir().unwrap();
        let config = mk_config(tmp.path());
        let paths = config.paths();
        write_file(&paths.markdown_file(), LEGACY);
        write_file(&paths.files_dir().join("2025-08-15_body.md"), "The body");
        write_file(&paths.files_dir().join("2025-08-15_a.png"), "png");
        (Til::open(config), tmp)
    }

    #[test]
    fn migrates_entries_bodies_and_attachments() {
        let (mut til, _tmp) = legacy_til();
        assert_eq!(til.format(), StorageFormat::Markdown);

        assert_eq!(til.migrate().unwrap(), 2);
        assert_eq!(til.format(), StorageFormat::Yaml);

        let paths = til.paths().clone();
        assert!(!paths.markdown_file().exists());
        assert!(paths.markdown_backup().is_file());

        let entries = til.list_latest(0).unwrap();
        assert_eq!(entries.len(), 2);
        let newer = &entries[0];
        assert_eq!(newer.message, "Newer");
        assert_eq!(newer.message_body.as_deref(), Some("The body"));
        assert!(!newer.notion_synced);
        assert!(entries[1].notion_synced);
        assert!(entries.iter().all(|e| e.commit_id.len() == 12));

        let files = paths.files_dir();
        assert_eq!(
            fs::read_to_string(files.join(format!("{}_a.png", newer.commit_id))).unwrap(),
            "png"
        );
        assert!(files.join(format!("body_{}.md", newer.commit_id)).is_file());
    }

    #[test]
    fn reopening_after_migration_uses_yaml() {
        let (mut til, _tmp) = legacy_til();
        til.migrate().unwrap();
        let reopened = Til::open(til.config.clone());
        assert_eq!(reopened.format(), StorageFormat::Yaml);
        assert_eq!(reopened.list_latest(0).unwrap().len(), 2);
    }

    #[test]
    fn nothing_to_migrate_without_markdown() {
        let tmp = tempdir().unwrap();
        let mut til = Til::open(mk_config(tmp.path()));
        assert!(matches!(til.migrate().unwrap_err(), TilError::NothingToMigrate));
    }

    #[test]
    fn refuses_when_yaml_already_has_entries() {
        let (mut til, _tmp) = legacy_til();
        let paths = til.paths().clone();
        write_file(
            &paths.yaml_file(),
            "entries:\n- date: 2025-08-16T10:00:00+00:00\n  message: Existing\n  is_committed: true\n  notion_synced: false\n",
        );

        let err = til.migrate().unwrap_err();
        assert!(matches!(err, TilError::MigrationConflict(_)));
        assert!(paths.markdown_file().is_file());
    }

    #[test]
    fn empty_yaml_store_does_not_block_migration() {
        let (mut til, _tmp) = legacy_til();
        write_file(&til.paths().yaml_file(), "entries: []\n");
        assert_eq!(til.migrate().unwrap(), 2);
    }
}
