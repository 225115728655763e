use super::editor_utils::{
    COMMIT_TEMPLATE, create_editor_buffer, resolve_editor, split_commit_message, strip_comments,
};
use super::prompt::confirm;
use crate::render::Renderer;
use anyhow::Result;
use chrono::Local;
use til_core::{Til, TilError};

pub struct CommitOptions {
    pub message: Option<String>,
    pub amend: bool,
    pub yes: bool,
}

pub fn commit_mode(til: &Til, opts: CommitOptions, renderer: &Renderer) -> Result<()> {
    if opts.amend {
        return amend(til, opts.message, renderer);
    }
    if !til.is_initialized() {
        return Err(TilError::NotInitialized.into());
    }

    let (message, body) = match opts.message {
        Some(message) => (message, None),
        None => match edit_message(til, "")? {
            Some((title, body)) => (title, Some(body)),
            None => {
                renderer.print_info("Aborting commit due to empty message");
                return Ok(());
            }
        },
    };

    if !opts.yes && til.collides_with_existing(Local::now())? {
        renderer.print_warning("You already have an entry for today. Consider using --amend.");
        if !confirm("Do you want to continue?")? {
            renderer.print_info("Commit aborted");
            return Ok(());
        }
    }

    let entry = til.commit(&message, body.as_deref())?;
    renderer.print_entry_line(&entry);
    report_mirror(til, renderer);
    Ok(())
}

fn amend(til: &Til, message: Option<String>, renderer: &Renderer) -> Result<()> {
    let entry = match message {
        // Only the title changes; the body is kept.
        Some(message) => til.amend(&message, None)?,
        None => {
            let latest = til
                .list_latest(1)?
                .into_iter()
                .next()
                .ok_or(TilError::NoEntries)?;
            let mut current = latest.message.clone();
            if let Some(body) = &latest.message_body {
                current.push_str("\n\n");
                current.push_str(body);
            }
            match edit_message(til, &current)? {
                Some((title, body)) => til.amend(&title, Some(&body))?,
                None => {
                    renderer.print_info("Aborting commit due to empty message");
                    return Ok(());
                }
            }
        }
    };
    renderer.print_info("Commit amended");
    renderer.print_entry_line(&entry);
    report_mirror(til, renderer);
    Ok(())
}

/// Opens the editor prefilled with `current`. `None` means the user left it empty.
fn edit_message(til: &Til, current: &str) -> Result<Option<(String, String)>> {
    let editor = resolve_editor(til.config.editor.as_deref());
    let initial = format!("{current}\n{COMMIT_TEMPLATE}");
    let content = strip_comments(&create_editor_buffer(&editor, &initial)?);
    if content.is_empty() {
        return Ok(None);
    }
    Ok(Some(split_commit_message(&content)))
}

fn report_mirror(til: &Til, renderer: &Renderer) {
    if !til.config.sync_to_git {
        return;
    }
    if let Some(remote) = til.config.git_remote_url.as_deref() {
        renderer.print_info(&format!(
            "View your TIL repository at: {}",
            til_core::git::browse_url(remote)
        ));
    }
}
