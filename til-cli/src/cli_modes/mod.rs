mod add_mode;
mod commit_mode;
mod editor_utils;
mod init_mode;
mod log_mode;
mod migrate_mode;
mod prompt;
mod push_mode;
mod status_mode;

pub use add_mode::add_mode;
pub use commit_mode::{CommitOptions, commit_mode};
pub use init_mode::{InitOptions, init_mode};
pub use log_mode::log_mode;
pub use migrate_mode::migrate_mode;
pub use push_mode::{PushOptions, push_mode};
pub use status_mode::status_mode;
