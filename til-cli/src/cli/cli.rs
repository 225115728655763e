use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::render::ColorMode;

/// til: a Today I Learned journal with a git-like workflow
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Repository root. Defaults to the current directory.
    #[arg(long, short = 'C', global = true, env = "TIL_ROOT")]
    pub root: Option<PathBuf>,
    /// Control ANSI colors in output.
    /// By default, colors are disabled when output is redirected (e.g with `>` or `|`).
    #[arg(long, value_enum, global = true, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
    /// Show debug logs on stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new TIL repository.
    /// Pass Notion credentials and/or a git remote to enable syncing.
    Init {
        /// Notion integration token; enables Notion sync together with `--notion-db-id`.
        #[arg(long, env = "TIL_NOTION_API_KEY", hide_env_values = true)]
        notion_api_key: Option<String>,
        /// Notion database id.
        #[arg(long, env = "TIL_NOTION_DB_ID")]
        notion_db_id: Option<String>,
        /// Git remote to mirror `til/` into (e.g. `git@github.com:me/til.git`).
        #[arg(long)]
        git_remote: Option<String>,
    },
    /// Stage files for the next entry (max 10 MiB each).
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Record a new entry. Without `-m`, opens your $EDITOR.
    Commit {
        /// Entry title. The body can only be written through the editor.
        #[arg(long, short)]
        message: Option<String>,
        /// Rewrite the most recent entry instead.
        #[arg(long)]
        amend: bool,
        /// Don't ask before adding a second entry for today.
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the latest entries.
    Log {
        /// How many entries to show; 0 shows all.
        #[arg(long = "number", short = 'n', default_value_t = 10)]
        number: usize,
    },
    /// Show the latest entry, staged files and sync state.
    Status,
    /// Sync entries to Notion and/or push the git mirror.
    /// Without flags, pushes to every enabled destination.
    Push {
        /// Only push to Notion.
        #[arg(long, conflicts_with = "git")]
        notion: bool,
        /// Only push the git mirror.
        #[arg(long)]
        git: bool,
        /// Re-check entries already marked as synced. Entries whose title is
        /// already present in Notion are still skipped, never pushed twice.
        #[arg(long)]
        force: bool,
    },
    /// Convert a legacy `til.md` repository to `til.yml`.
    Migrate {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}
