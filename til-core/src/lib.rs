pub mod config;
pub mod entry;
pub mod error;
pub mod git;
mod migration;
pub mod notion;
pub mod parse_entries;
pub mod paths;
pub mod readme;
pub mod render;
pub mod staging;
pub mod storage;
pub mod sync;
pub mod til;

pub use config::Config;
pub use entry::Entry;
pub use error::{ErrorKind, Result, TilError};
pub use git::{GitRepo, VersionControl};
pub use notion::{NotionClient, RemoteDatabase};
pub use storage::{EntryStore, StorageFormat};
pub use sync::{NotionPushReport, push_to_git, push_to_notion};
pub use til::Til;
