use crate::render::Renderer;
use anyhow::{Context, Result};
use til_core::{GitRepo, NotionClient, Til, TilError, push_to_git, push_to_notion};

pub struct PushOptions {
    pub notion: bool,
    pub git: bool,
    pub force: bool,
}

pub fn push_mode(til: &Til, opts: PushOptions, renderer: &Renderer) -> Result<()> {
    if !til.is_initialized() {
        return Err(TilError::NotInitialized.into());
    }
    let config = &til.config;
    // No flag: every destination the repository has enabled.
    let (to_notion, to_git) = if opts.notion || opts.git {
        (opts.notion, opts.git)
    } else {
        (config.sync_to_notion, config.sync_to_git)
    };
    if !to_notion && !to_git {
        renderer.print_info("Nothing to push: neither Notion nor git sync is enabled.");
        return Ok(());
    }

    if to_notion {
        let client = NotionClient::from_config(config)?;
        let report = push_to_notion(til, &client, opts.force)?;
        renderer.print_info(&format!(
            "Notion: {} pushed, {} already present, {} up to date",
            report.pushed, report.already_present, report.skipped
        ));
        if report.failed > 0 {
            renderer.print_warning(&format!(
                "{} entries could not be pushed to Notion",
                report.failed
            ));
        }
    }

    if to_git {
        let git = GitRepo::with_branches(til.paths().data_dir(), config.git_branches.clone());
        til.refresh_readme().context("updating README.md")?;
        let committed = push_to_git(&git, config.git_remote_url.as_deref(), "Sync TIL entries")?;
        let note = if committed { "committed and pushed" } else { "pushed" };
        renderer.print_info(&format!("Git: {note}"));
    }
    Ok(())
}
