//! Error types for the TIL store.
//!
//! Every failure maps onto one [`ErrorKind`]. Local failures (`NotInitialized`,
//! `InvalidInput`, `NotFound`, `StorageCorruption`, `Io`, `Config`) abort a command.
//! `ExternalFailure` comes from git or Notion and is downgraded to a warning
//! whenever it happens as a side effect of a local write.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for TIL operations.
pub type Result<T> = std::result::Result<T, TilError>;

/// Coarse category of a [`TilError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotInitialized,
    InvalidInput,
    NotFound,
    ExternalFailure,
    StorageCorruption,
    Io,
    Config,
}

#[derive(Debug, Error)]
pub enum TilError {
    #[error("TIL repository not initialized. Run 'til init' first.")]
    NotInitialized,

    #[error("TIL repository already initialized")]
    AlreadyInitialized,

    #[error("commit message cannot be empty")]
    EmptyMessage,

    #[error("message {0:?} would be read back as log markup; the Markdown log cannot store it")]
    UnrepresentableMessage(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot add directory: {}", .0.display())]
    IsDirectory(PathBuf),

    #[error("file too large: {} ({} bytes, max is {} bytes)", .path.display(), .size, .max)]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("no entries found to amend")]
    NoEntries,

    #[error("entry not found")]
    EntryNotFound,

    #[error("no Markdown entries found to migrate")]
    NothingToMigrate,

    #[error("{} already holds entries; merge or remove it before migrating", .0.display())]
    MigrationConflict(PathBuf),

    #[error("could not parse {}: {}", .path.display(), .source)]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {}", .path.display(), .message)]
    Config { path: PathBuf, message: String },

    #[error("git: {0}")]
    Git(String),

    #[error("notion: {0}")]
    Notion(String),
}

impl TilError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized => ErrorKind::NotInitialized,
            Self::EmptyMessage
            | Self::UnrepresentableMessage(_)
            | Self::FileNotFound(_)
            | Self::IsDirectory(_)
            | Self::FileTooLarge { .. }
            | Self::MigrationConflict(_) => ErrorKind::InvalidInput,
            Self::NoEntries | Self::EntryNotFound | Self::NothingToMigrate => ErrorKind::NotFound,
            Self::Git(_) | Self::Notion(_) => ErrorKind::ExternalFailure,
            Self::Corrupt { .. } => ErrorKind::StorageCorruption,
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// True for git/Notion failures, which never invalidate local state.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.kind(), ErrorKind::ExternalFailure)
    }
}

/// Attaches a human-readable context to `io::Result`s, in the spirit of
/// `anyhow::Context`.
pub(crate) trait IoContext<T> {
    fn with_context<F: FnOnce() -> String>(self, context: F) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_context<F: FnOnce() -> String>(self, context: F) -> Result<T> {
        self.map_err(|source| TilError::Io {
            context: context(),
            source,
        })
    }
}
