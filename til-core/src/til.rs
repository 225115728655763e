use crate::{
    Config,
    entry::Entry,
    error::{IoContext, Result, TilError},
    git::{GitRepo, VersionControl},
    paths::{RepoPaths, attachment_file_name},
    readme::render_readme,
    staging::StagingArea,
    storage::{EntryStore, StorageFormat, YamlStore, atomic_write, open_store},
};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A TIL repository: entry store, staging area and the optional git mirror.
pub struct Til {
    pub config: Config,
    paths: RepoPaths,
    pub(crate) store: Box<dyn EntryStore>,
    staging: StagingArea,
    vcs: Option<Box<dyn VersionControl>>,
}

impl Til {
    /// Opens the repository described by `config`. The store format is
    /// decided here, once, from what exists on disk.
    pub fn open(config: Config) -> Self {
        let paths = config.paths();
        let store = open_store(&paths);
        let staging = StagingArea::new(paths.staging_dir());
        let vcs: Option<Box<dyn VersionControl>> = if config.sync_to_git {
            Some(Box::new(GitRepo::with_branches(
                paths.data_dir(),
                config.git_branches.clone(),
            )))
        } else {
            None
        };
        Self {
            config,
            paths,
            store,
            staging,
            vcs,
        }
    }

    /// Replaces the git mirror, e.g. with a test double.
    pub fn with_vcs(mut self, vcs: Option<Box<dyn VersionControl>>) -> Self {
        self.vcs = vcs;
        self
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    pub fn format(&self) -> StorageFormat {
        self.store.format()
    }

    pub fn vcs(&self) -> Option<&dyn VersionControl> {
        self.vcs.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.store.exists()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(TilError::NotInitialized)
        }
    }

    /// Creates an empty YAML store plus the attachments and staging dirs.
    pub fn initialize(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Err(TilError::AlreadyInitialized);
        }
        for dir in [self.paths.files_dir(), self.paths.staging_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let store = YamlStore::new(self.paths.yaml_file());
        store.save(&[])?;
        self.store = Box::new(store);
        tracing::debug!("initialized {}", self.paths.root().display());
        Ok(())
    }

    pub fn add_file(&self, path: &Path) -> Result<String> {
        self.ensure_initialized()?;
        self.staging.stage(path)
    }

    pub fn staged_files(&self) -> Result<Vec<String>> {
        self.staging.list()
    }

    pub fn clear_staged(&self) -> Result<()> {
        self.staging.clear()
    }

    pub fn commit(&self, message: &str, body: Option<&str>) -> Result<Entry> {
        self.commit_at(message, body, Local::now())
    }

    /// Records a new entry dated `date` holding everything currently staged.
    pub fn commit_at(
        &self,
        message: &str,
        body: Option<&str>,
        date: DateTime<Local>,
    ) -> Result<Entry> {
        self.ensure_initialized()?;
        let message = message.trim();
        if message.is_empty() {
            return Err(TilError::EmptyMessage);
        }

        let staged = self.staging.list()?;
        let entry = Entry::new(message, body.map(str::to_string), staged.clone(), date);
        self.store.append(&entry)?;
        if entry.has_body() && self.body_path(&entry).exists() {
            tracing::warn!(
                "{} is shared with an earlier entry of the same day and is being replaced",
                self.body_path(&entry).display()
            );
        }
        self.write_body(&entry)?;
        self.store_attachments(&entry, &staged)?;
        self.staging.clear()?;

        self.mirror(message);
        Ok(entry)
    }

    /// Rewrites the most recent entry. `body` of `None` keeps the current
    /// body and `Some("")` removes it. Newly staged files are appended.
    pub fn amend(&self, message: &str, body: Option<&str>) -> Result<Entry> {
        self.ensure_initialized()?;
        let message = message.trim();
        if message.is_empty() {
            return Err(TilError::EmptyMessage);
        }
        let latest = self
            .store
            .list()?
            .into_iter()
            .next()
            .ok_or(TilError::NoEntries)?;

        let staged = self.staging.list()?;
        let mut amended = latest.clone();
        amended.message = message.to_string();
        if let Some(body) = body {
            amended.message_body = Some(body.to_string()).filter(|b| !b.trim().is_empty());
        }
        for name in &staged {
            if !amended.files.contains(name) {
                amended.files.push(name.clone());
            }
        }

        self.store.update_with(&latest, &mut |stored| *stored = amended.clone())?;
        if amended.has_body() {
            self.write_body(&amended)?;
        } else if latest.has_body() {
            self.remove_body(&amended)?;
        }
        self.store_attachments(&amended, &staged)?;
        self.staging.clear()?;

        self.mirror(&format!("Amend: {message}"));
        Ok(amended)
    }

    /// Newest first. `limit` of 0 returns everything.
    pub fn list_latest(&self, limit: usize) -> Result<Vec<Entry>> {
        let mut entries = self.store.list()?;
        if limit > 0 {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Stores `entry.notion_synced` on the matching record.
    pub fn update_sync_flag(&self, entry: &Entry) -> Result<()> {
        let synced = entry.notion_synced;
        self.store
            .update_with(entry, &mut |stored| stored.notion_synced = synced)
    }

    /// Whether an entry already exists on the calendar day of `at`.
    pub fn collides_with_existing(&self, at: DateTime<Local>) -> Result<bool> {
        let day = at.date_naive();
        Ok(self.store.load()?.iter().any(|entry| entry.day() == day))
    }

    /// Regenerates `til/README.md` from the current entries.
    pub fn refresh_readme(&self) -> Result<()> {
        let path = self.paths.readme();
        let existing = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let entries = self.store.list()?;
        atomic_write(
            &path,
            &render_readme(existing.as_deref(), &entries, &*self.store),
        )
    }

    fn body_path(&self, entry: &Entry) -> PathBuf {
        self.paths.files_dir().join(self.store.body_file_name(entry))
    }

    /// Writes the body file. Entries without a body leave the files alone:
    /// in a Markdown repository the file is shared by every entry of a day.
    fn write_body(&self, entry: &Entry) -> Result<()> {
        match &entry.message_body {
            Some(body) => atomic_write(&self.body_path(entry), body),
            None => Ok(()),
        }
    }

    /// Deletes the body file of `entry` unless another stored entry with a
    /// body still points at it.
    fn remove_body(&self, entry: &Entry) -> Result<()> {
        let name = self.store.body_file_name(entry);
        let shared = self.store.load()?.iter().any(|other| {
            !other.is_same_record(entry)
                && other.has_body()
                && self.store.body_file_name(other) == name
        });
        if shared {
            tracing::debug!("keeping {name}; another entry still uses it");
            return Ok(());
        }
        let path = self.body_path(entry);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", path.display()))
            }
            _ => Ok(()),
        }
    }

    fn store_attachments(&self, entry: &Entry, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let files_dir = self.paths.files_dir();
        fs::create_dir_all(&files_dir)
            .with_context(|| format!("creating {}", files_dir.display()))?;
        let key = self.store.attachment_key(entry);
        for name in names {
            let from = self.staging.path_of(name);
            let to = files_dir.join(attachment_file_name(&key, name));
            fs::copy(&from, &to)
                .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        }
        Ok(())
    }

    /// Mirrors the data dir to git. Every failure is downgraded to a warning;
    /// the local write has already happened.
    fn mirror(&self, message: &str) {
        let Some(vcs) = self.vcs.as_deref() else {
            return;
        };
        if let Err(e) = self.refresh_readme() {
            tracing::warn!("failed to update README.md: {e}");
        }
        if !vcs.is_initialized() {
            tracing::warn!(
                "git mirror is enabled but {} is not a repository; run 'til init --git-remote <url>'",
                self.paths.data_dir().display()
            );
            return;
        }
        let result = vcs
            .add_all()
            .and_then(|()| vcs.commit(message))
            .and_then(|()| vcs.push());
        match result {
            Ok(()) => tracing::info!("pushed changes to git"),
            Err(e) => tracing::warn!("failed to sync with git: {e}"),
        }
    }
}
