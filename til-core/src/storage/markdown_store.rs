use super::{EntryStore, StorageFormat, atomic_write};
use crate::entry::Entry;
use crate::error::{IoContext, Result, TilError};
use crate::parse_entries::parse_log;
use crate::paths::markdown_body_file_name;
use crate::render::{fits_log_line, render_log};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Legacy `til.md` log. Entries carry only a day, and bodies and attachments
/// are keyed by that day under `files_dir`.
#[derive(Debug, Clone)]
pub struct MarkdownStore {
    path: PathBuf,
    files_dir: PathBuf,
}

impl MarkdownStore {
    pub fn new(path: impl Into<PathBuf>, files_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            files_dir: files_dir.into(),
        }
    }

    fn read_body(&self, entry: &Entry) -> Result<Option<String>> {
        let path = self.files_dir.join(self.body_file_name(entry));
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body).filter(|body| !body.trim().is_empty())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("body file {} is missing", path.display());
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}

impl EntryStore for MarkdownStore {
    fn format(&self) -> StorageFormat {
        StorageFormat::Markdown
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Entry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let mut entries = Vec::new();
        // parse_log is latest first; storage order is the file order.
        for parsed in parse_log(&content).into_iter().rev() {
            let mut entry = parsed.entry;
            if parsed.read_more {
                entry.message_body = self.read_body(&entry)?;
            }
            entry.ensure_commit_id();
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Refuses, before touching the file, any entry whose message would not
    /// parse back as the same entry.
    fn save(&self, entries: &[Entry]) -> Result<()> {
        if let Some(entry) = entries.iter().find(|e| !fits_log_line(e.message.trim())) {
            return Err(TilError::UnrepresentableMessage(entry.message.clone()));
        }
        atomic_write(&self.path, &render_log(entries))
    }

    fn attachment_key(&self, entry: &Entry) -> String {
        entry.day_string()
    }

    fn body_file_name(&self, entry: &Entry) -> String {
        markdown_body_file_name(&entry.day_string())
    }
}
