use super::{EntryStore, StorageFormat, atomic_write};
use crate::entry::Entry;
use crate::error::{IoContext, Result, TilError};
use crate::paths::yaml_body_file_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct YamlDocument {
    #[serde(default)]
    entries: Vec<Entry>,
}

/// `til.yml`: one `entries:` list, bodies inline.
#[derive(Debug, Clone)]
pub struct YamlStore {
    path: PathBuf,
}

impl YamlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EntryStore for YamlStore {
    fn format(&self) -> StorageFormat {
        StorageFormat::Yaml
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Entry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: YamlDocument =
            serde_yaml::from_str(&content).map_err(|source| TilError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        let mut entries = document.entries;
        entries.iter_mut().for_each(Entry::ensure_commit_id);
        Ok(entries)
    }

    fn save(&self, entries: &[Entry]) -> Result<()> {
        let document = YamlDocument {
            entries: entries.to_vec(),
        };
        let content = serde_yaml::to_string(&document).map_err(|source| TilError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, &content)
    }

    fn attachment_key(&self, entry: &Entry) -> String {
        entry.commit_id.clone()
    }

    fn body_file_name(&self, entry: &Entry) -> String {
        yaml_body_file_name(&entry.commit_id)
    }
}
