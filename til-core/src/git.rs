//! Git mirror of the journal data directory.
//!
//! The `til/` directory is its own repository. Everything goes through the
//! `git` binary; failures carry git's stderr.

use crate::error::{Result, TilError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Branches tried, in order, when checking out and pushing.
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

pub trait VersionControl {
    fn is_initialized(&self) -> bool;

    /// Creates the repository and tracks `remote_url`'s default branch.
    fn init(&self, remote_url: &str) -> Result<()>;

    fn set_remote(&self, remote_url: &str) -> Result<()>;

    fn add_all(&self) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    fn push(&self) -> Result<()>;

    /// Porcelain status; empty when the tree is clean.
    fn status(&self) -> Result<String>;

    fn has_changes(&self) -> Result<bool> {
        Ok(!self.status()?.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct GitRepo {
    work_dir: PathBuf,
    branches: Vec<String>,
}

impl GitRepo {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_branches(work_dir, DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect())
    }

    pub fn with_branches(work_dir: impl Into<PathBuf>, branches: Vec<String>) -> Self {
        let branches = if branches.is_empty() {
            DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect()
        } else {
            branches
        };
        Self {
            work_dir: work_dir.into(),
            branches,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| TilError::Git(format!("failed to run git {}: {e}", args[0])))?;

        if !output.status.success() {
            return Err(TilError::Git(format!(
                "git {} failed: {}",
                args[0],
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn require_repo(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(TilError::Git(format!(
                "{} is not a git repository",
                self.work_dir.display()
            )))
        }
    }
}

impl VersionControl for GitRepo {
    fn is_initialized(&self) -> bool {
        self.work_dir.join(".git").exists()
    }

    fn init(&self, remote_url: &str) -> Result<()> {
        if self.is_initialized() {
            return Err(TilError::Git("repository already initialized".into()));
        }
        std::fs::create_dir_all(&self.work_dir).map_err(|e| {
            TilError::Git(format!("creating {}: {e}", self.work_dir.display()))
        })?;

        self.run(&["init"])?;
        self.run(&["remote", "add", "origin", remote_url])?;
        self.run(&["fetch", "origin"])?;

        for branch in &self.branches {
            let upstream = format!("origin/{branch}");
            match self.run(&["checkout", "-B", branch.as_str(), upstream.as_str(), "--force"]) {
                Ok(_) => return Ok(()),
                Err(e) => tracing::debug!("no {upstream}: {e}"),
            }
        }

        // Empty remote: start the first branch locally, the first push creates it.
        let first = &self.branches[0];
        tracing::warn!(
            "remote has no {} branch; starting {first} locally",
            self.branches.join("/")
        );
        self.run(&["checkout", "-B", first.as_str()])?;
        Ok(())
    }

    fn set_remote(&self, remote_url: &str) -> Result<()> {
        self.require_repo()?;
        let remotes = self.run(&["remote"])?;
        if remotes.lines().any(|remote| remote.trim() == "origin") {
            self.run(&["remote", "set-url", "origin", remote_url])?;
        } else {
            self.run(&["remote", "add", "origin", remote_url])?;
        }
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        self.require_repo()?;
        self.run(&["add", "."]).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.require_repo()?;
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    fn push(&self) -> Result<()> {
        self.require_repo()?;
        let mut last_error = None;
        for branch in &self.branches {
            match self.run(&["push", "origin", branch.as_str()]) {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::debug!("push to {branch} failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| TilError::Git("no branch to push".into())))
    }

    fn status(&self) -> Result<String> {
        self.require_repo()?;
        self.run(&["status", "--porcelain"])
    }
}

/// Web URL for a remote: ssh remotes (`git@host:owner/repo.git`) become
/// `https://host/owner/repo`, and a trailing `.git` is dropped.
pub fn browse_url(remote_url: &str) -> String {
    let trimmed = remote_url.trim().trim_end_matches(".git");
    match trimmed.strip_prefix("git@").and_then(|rest| rest.split_once(':')) {
        Some((host, path)) => format!("https://{host}/{path}"),
        None => trimmed.to_string(),
    }
}
