//! Durable entry stores.
//!
//! Both formats sit behind [`EntryStore`]; [`open_store`] picks one when a
//! repository is opened and nothing above this module branches on format again.

mod markdown_store;
mod yaml_store;

pub use markdown_store::MarkdownStore;
pub use yaml_store::YamlStore;

use crate::entry::Entry;
use crate::error::{IoContext, Result, TilError};
use crate::paths::RepoPaths;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StorageFormat {
    Yaml,
    Markdown,
}

pub trait EntryStore {
    fn format(&self) -> StorageFormat;

    fn path(&self) -> &Path;

    fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// All entries in storage order (oldest write first). A missing file is
    /// an empty store.
    fn load(&self) -> Result<Vec<Entry>>;

    /// Replaces the whole file with `entries`.
    fn save(&self, entries: &[Entry]) -> Result<()>;

    /// Prefix for attachment copies of `entry`.
    fn attachment_key(&self, entry: &Entry) -> String;

    /// File name, under the attachments dir, holding the body of `entry`.
    fn body_file_name(&self, entry: &Entry) -> String;

    fn append(&self, entry: &Entry) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(entry.clone());
        self.save(&entries)
    }

    /// Applies `apply` to the stored record matching `target`. Nothing is
    /// written when no record matches.
    fn update_with(&self, target: &Entry, apply: &mut dyn FnMut(&mut Entry)) -> Result<()> {
        let mut entries = self.load()?;
        let stored = entries
            .iter_mut()
            .find(|stored| stored.is_same_record(target))
            .ok_or(TilError::EntryNotFound)?;
        apply(stored);
        self.save(&entries)
    }

    fn update(&self, entry: &Entry) -> Result<()> {
        self.update_with(entry, &mut |stored| *stored = entry.clone())
    }

    /// Entries newest first. Equal dates keep the most recently stored first.
    fn list(&self) -> Result<Vec<Entry>> {
        let mut entries = self.load()?;
        entries.reverse();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }
}

/// Chooses the backend for a repository: YAML when `til.yml` exists, the
/// legacy Markdown log when only `til.md` exists, YAML for a fresh repository.
pub fn open_store(paths: &RepoPaths) -> Box<dyn EntryStore> {
    let yaml = paths.yaml_file();
    let markdown = paths.markdown_file();
    if yaml.is_file() {
        if markdown.is_file() {
            tracing::warn!(
                "both {} and {} exist; using the YAML store. Run 'til migrate' once the legacy file is reconciled.",
                yaml.display(),
                markdown.display()
            );
        }
        Box::new(YamlStore::new(yaml))
    } else if markdown.is_file() {
        Box::new(MarkdownStore::new(markdown, paths.files_dir()))
    } else {
        Box::new(YamlStore::new(yaml))
    }
}

/// Writes `content` to a sibling temp file, syncs it and renames it over
/// `path`, so readers never observe a half-written store.
pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let file = File::create(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .and_then(|()| writer.flush())
            .and_then(|()| writer.get_ref().sync_all())
            .with_context(|| format!("writing {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("replacing {}", path.display()))?;
    tracing::debug!("wrote {}", path.display());
    Ok(())
}
