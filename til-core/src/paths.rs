//! On-disk layout of a TIL repository.
//!
//! ```text
//! <root>/.til/config          repository config
//! <root>/.til/staging/        files waiting for the next commit
//! <root>/til/til.yml          entry store (legacy: til.md)
//! <root>/til/files/           bodies and attachment copies
//! <root>/til/README.md        summary, regenerated when mirroring to git
//! ```

use crate::entry::{DAY_FORMAT, Entry};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".til";
pub const DATA_DIR: &str = "til";

#[derive(Debug, Clone)]
pub struct RepoPaths {
    root: PathBuf,
}

impl RepoPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config_dir().join("staging")
    }

    /// The directory mirrored into git.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn yaml_file(&self) -> PathBuf {
        self.data_dir().join("til.yml")
    }

    pub fn markdown_file(&self) -> PathBuf {
        self.data_dir().join("til.md")
    }

    pub fn markdown_backup(&self) -> PathBuf {
        self.data_dir().join("til.md.bak")
    }

    pub fn files_dir(&self) -> PathBuf {
        self.data_dir().join("files")
    }

    pub fn readme(&self) -> PathBuf {
        self.data_dir().join("README.md")
    }
}

/// `{key}_{name}`, where key is a commit id or a day.
pub fn attachment_file_name(key: &str, name: &str) -> String {
    format!("{key}_{name}")
}

pub fn yaml_body_file_name(commit_id: &str) -> String {
    format!("body_{commit_id}.md")
}

pub fn markdown_body_file_name(day: &str) -> String {
    format!("{day}_body.md")
}

/// Finds the stored copy of an attachment, whichever naming scheme wrote it.
pub fn locate_attachment(files_dir: &Path, entry: &Entry, name: &str) -> Option<PathBuf> {
    let day = entry.date.format(DAY_FORMAT).to_string();
    [entry.commit_id.as_str(), day.as_str()]
        .into_iter()
        .filter(|key| !key.is_empty())
        .map(|key| files_dir.join(attachment_file_name(key, name)))
        .find(|candidate| candidate.is_file())
}
