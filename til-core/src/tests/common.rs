use crate::{
    Config, Til,
    entry::Entry,
    error::{Result, TilError},
    git::VersionControl,
    notion::RemoteDatabase,
};
use chrono::{DateTime, Local, NaiveDate};
use std::{
    cell::{Cell, RefCell},
    fs,
    path::Path,
    rc::Rc,
};
use tempfile::{TempDir, tempdir};

/// Test helper to create a default `Config` for testing purposes.
///
/// This is the single source of truth for test configuration.
/// If you add a field to `Config`, you only need to update it here.
pub fn mk_config(root: &Path) -> Config {
    Config {
        root: root.to_path_buf(),
        editor: None,
        sync_to_notion: false,
        notion_api_key: None,
        notion_db_id: None,
        sync_to_git: false,
        git_remote_url: None,
        git_branches: vec!["main".into(), "master".into()],
        attachments_url: None,
    }
}

/// An initialized repository in a fresh temp dir.
pub fn mk_til() -> (Til, TempDir) {
    let tmp = tempdir().unwrap();
    let mut til = Til::open(mk_config(tmp.path()));
    til.initialize().expect("initialize");
    (til, tmp)
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_opt(h, mi, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .expect("valid local time")
}

/// Records every mutating call as a line in a shared log.
pub struct RecordingVcs {
    log: Rc<RefCell<Vec<String>>>,
    initialized: Cell<bool>,
    dirty: bool,
    fail_push: bool,
}

impl RecordingVcs {
    pub fn initialized() -> Self {
        Self {
            log: Rc::default(),
            initialized: Cell::new(true),
            dirty: false,
            fail_push: false,
        }
    }

    pub fn uninitialized() -> Self {
        let vcs = Self::initialized();
        vcs.initialized.set(false);
        vcs
    }

    pub fn with_changes(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.log)
    }

    fn record(&self, line: String) {
        self.log.borrow_mut().push(line);
    }
}

impl VersionControl for RecordingVcs {
    fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn init(&self, remote_url: &str) -> Result<()> {
        self.record(format!("init {remote_url}"));
        self.initialized.set(true);
        Ok(())
    }

    fn set_remote(&self, remote_url: &str) -> Result<()> {
        self.record(format!("set_remote {remote_url}"));
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        self.record("add_all".into());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit {message}"));
        Ok(())
    }

    fn push(&self) -> Result<()> {
        if self.fail_push {
            return Err(TilError::Git("remote rejected".into()));
        }
        self.record("push".into());
        Ok(())
    }

    fn status(&self) -> Result<String> {
        Ok(if self.dirty { " M til.yml\n".into() } else { String::new() })
    }
}

/// Notion stand-in holding pushed pages in memory.
#[derive(Default)]
pub struct InMemoryRemote {
    pages: RefCell<Vec<Entry>>,
    failing: bool,
}

impl InMemoryRemote {
    pub fn with_titles(titles: &[&str]) -> Self {
        let remote = Self::default();
        for title in titles {
            let mut page = Entry::new(*title, None, vec![], Local::now());
            page.notion_synced = true;
            remote.pages.borrow_mut().push(page);
        }
        remote
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.pages.borrow().iter().map(|p| p.message.clone()).collect()
    }
}

impl RemoteDatabase for InMemoryRemote {
    fn push_entry(&self, entry: &Entry, _attachments_dir: &Path) -> Result<()> {
        if self.failing {
            return Err(TilError::Notion("503: unavailable".into()));
        }
        self.pages.borrow_mut().push(entry.clone());
        Ok(())
    }

    fn is_entry_synced(&self, entry: &Entry) -> Result<bool> {
        if self.failing {
            return Err(TilError::Notion("503: unavailable".into()));
        }
        Ok(self.pages.borrow().iter().any(|p| p.message == entry.message))
    }

    fn get_entries(&self, limit: usize) -> Result<Vec<Entry>> {
        let mut pages = self.pages.borrow().clone();
        pages.reverse();
        if limit > 0 {
            pages.truncate(limit);
        }
        Ok(pages)
    }
}
