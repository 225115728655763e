use crate::render::Renderer;
use anyhow::{Context, Result};
use til_core::{Config, GitRepo, Til, VersionControl};

pub struct InitOptions {
    pub notion_api_key: Option<String>,
    pub notion_db_id: Option<String>,
    pub git_remote: Option<String>,
}

pub fn init_mode(mut config: Config, opts: InitOptions, renderer: &Renderer) -> Result<()> {
    match (opts.notion_api_key, opts.notion_db_id) {
        (Some(key), Some(db)) => {
            config.sync_to_notion = true;
            config.notion_api_key = Some(key);
            config.notion_db_id = Some(db);
        }
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("Notion sync needs both --notion-api-key and --notion-db-id");
        }
        (None, None) => {}
    }
    if let Some(remote) = opts.git_remote {
        config.sync_to_git = true;
        config.git_remote_url = Some(remote);
    }

    let mut til = Til::open(config.clone());
    til.initialize()?;
    config.save().context("saving repository config")?;
    renderer.print_info(&format!(
        "Initialized TIL repository in {}",
        til.paths().root().display()
    ));

    if let Some(remote) = config.git_remote_url.as_deref() {
        init_git_mirror(&til, &config, remote, renderer);
    }
    if config.sync_to_notion {
        renderer.print_info("Notion sync enabled. Run 'til push' to upload entries.");
    }
    Ok(())
}

/// Local initialization already succeeded; git problems are reported, not fatal.
fn init_git_mirror(til: &Til, config: &Config, remote: &str, renderer: &Renderer) {
    let git = GitRepo::with_branches(til.paths().data_dir(), config.git_branches.clone());
    let result = if git.is_initialized() {
        git.set_remote(remote)
    } else {
        git.init(remote)
    };
    if let Err(e) = result {
        renderer.print_warning(&format!("could not set up the git mirror: {e}"));
        return;
    }

    let first_commit = til
        .refresh_readme()
        .map_err(anyhow::Error::from)
        .and_then(|()| git.add_all().map_err(Into::into))
        .and_then(|()| git.commit("Initial commit: Add README.md").map_err(Into::into));
    match first_commit {
        Ok(()) => renderer.print_info(&format!("Git mirror tracks {remote}")),
        Err(e) => renderer.print_warning(&format!("could not create the initial git commit: {e}")),
    }
}
