//! `til push`: reconcile local entries with Notion and the git mirror.

use crate::entry::Entry;
use crate::error::Result;
use crate::git::VersionControl;
use crate::notion::RemoteDatabase;
use crate::til::Til;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotionPushReport {
    /// Newly created pages.
    pub pushed: usize,
    /// Entries a page already existed for; only the local flag was set.
    pub already_present: usize,
    /// Entries already flagged as synced.
    pub skipped: usize,
    /// Entries that could not be checked or pushed.
    pub failed: usize,
}

/// Pushes every entry not yet flagged as synced (every entry with `force`).
/// Remote failures are counted and logged; local write failures abort.
pub fn push_to_notion(
    til: &Til,
    remote: &dyn RemoteDatabase,
    force: bool,
) -> Result<NotionPushReport> {
    til.ensure_initialized()?;
    let attachments_dir = til.paths().files_dir();
    let mut report = NotionPushReport::default();

    for entry in til.list_latest(0)? {
        if entry.notion_synced && !force {
            report.skipped += 1;
            continue;
        }

        match remote.is_entry_synced(&entry) {
            Ok(true) => {
                tracing::debug!("'{}' already exists in Notion", entry.message);
                mark_synced(til, entry)?;
                report.already_present += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("could not check '{}' in Notion: {e}", entry.message);
                report.failed += 1;
                continue;
            }
        }

        match remote.push_entry(&entry, &attachments_dir) {
            Ok(()) => {
                mark_synced(til, entry)?;
                report.pushed += 1;
            }
            Err(e) => {
                tracing::warn!("failed to push '{}' to Notion: {e}", entry.message);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

fn mark_synced(til: &Til, mut entry: Entry) -> Result<()> {
    if entry.notion_synced {
        return Ok(());
    }
    entry.notion_synced = true;
    til.update_sync_flag(&entry)
}

/// Commits and pushes the data dir. A missing repository is created first
/// when `remote_url` is known. Returns whether a new commit was made.
pub fn push_to_git(
    vcs: &dyn VersionControl,
    remote_url: Option<&str>,
    message: &str,
) -> Result<bool> {
    if !vcs.is_initialized() {
        match remote_url {
            Some(url) => vcs.init(url)?,
            None => {
                return Err(crate::error::TilError::Git(
                    "no repository and no remote configured; run 'til init --git-remote <url>'"
                        .into(),
                ));
            }
        }
    } else if let Some(url) = remote_url {
        vcs.set_remote(url)?;
    }

    let committed = if vcs.has_changes()? {
        vcs.add_all()?;
        vcs.commit(message)?;
        true
    } else {
        false
    };
    vcs.push()?;
    Ok(committed)
}
