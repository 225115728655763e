use crate::render::Renderer;
use anyhow::Result;
use til_core::{Til, git::browse_url};

pub fn log_mode(til: &Til, number: usize, renderer: &Renderer) -> Result<()> {
    if !til.is_initialized() {
        return Err(til_core::TilError::NotInitialized.into());
    }
    let entries = til.list_latest(number)?;
    if entries.is_empty() {
        renderer.print_info("No entries found");
        return Ok(());
    }

    renderer.print_entries(&entries);

    if til.config.sync_to_git {
        if let Some(remote) = til.config.git_remote_url.as_deref() {
            println!();
            renderer.print_info(&format!("Git repository: {}", browse_url(remote)));
        }
    }
    Ok(())
}
