mod cli;
mod cli_modes;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use cli_modes::{CommitOptions, InitOptions, PushOptions};
use render::{RenderOptions, Renderer};
use std::process::ExitCode;
use til_core::{Config, Til};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("til: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("reading current directory")?,
    };
    let config = Config::load(&root)?;
    let renderer = Renderer::new(RenderOptions {
        use_color: cli.color.use_color(),
    });

    match cli.command {
        Command::Init {
            notion_api_key,
            notion_db_id,
            git_remote,
        } => cli_modes::init_mode(
            config,
            InitOptions {
                notion_api_key,
                notion_db_id,
                git_remote,
            },
            &renderer,
        ),
        Command::Add { files } => cli_modes::add_mode(&Til::open(config), &files, &renderer),
        Command::Commit {
            message,
            amend,
            yes,
        } => cli_modes::commit_mode(
            &Til::open(config),
            CommitOptions {
                message,
                amend,
                yes,
            },
            &renderer,
        ),
        Command::Log { number } => cli_modes::log_mode(&Til::open(config), number, &renderer),
        Command::Status => cli_modes::status_mode(&Til::open(config), &renderer),
        Command::Push { notion, git, force } => cli_modes::push_mode(
            &Til::open(config),
            PushOptions { notion, git, force },
            &renderer,
        ),
        Command::Migrate { yes } => cli_modes::migrate_mode(&mut Til::open(config), yes, &renderer),
    }
}
