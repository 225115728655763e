use crate::render::{Renderer, preview};
use anyhow::Result;
use chrono::Local;
use til_core::{Til, TilError};

pub fn status_mode(til: &Til, renderer: &Renderer) -> Result<()> {
    if !til.is_initialized() {
        return Err(TilError::NotInitialized.into());
    }
    let config = &til.config;
    let mut md = format!("# TIL status\n\nStorage: `{}`\n", til.format());

    let entries = til.list_latest(0)?;
    match entries.first() {
        Some(latest) => {
            let today = if latest.day() == Local::now().date_naive() {
                " (Today)"
            } else {
                ""
            };
            md.push_str("\n## Latest entry\n\n");
            md.push_str(&format!("* Date: {}{today}\n", latest.day_string()));
            md.push_str(&format!("* Message: {}\n", latest.message));
            let body = latest
                .message_body
                .as_deref()
                .map(preview)
                .unwrap_or_else(|| "None".into());
            md.push_str(&format!("* Body: {body}\n"));
            let files = if latest.files.is_empty() {
                "None".to_string()
            } else {
                latest.files.join(", ")
            };
            md.push_str(&format!("* Files: {files}\n"));
            if config.sync_to_notion {
                let synced = if latest.notion_synced { "Synced" } else { "Not synced" };
                md.push_str(&format!("* Notion: {synced}\n"));
            }
        }
        None => md.push_str("\nNo entries found.\n"),
    }

    md.push_str("\n## Staged files\n\n");
    let staged = til.staged_files()?;
    if staged.is_empty() {
        md.push_str("No files staged for commit.\n");
    }
    for name in &staged {
        md.push_str(&format!("* {name}\n"));
    }

    if config.sync_to_git {
        md.push_str("\n## Git\n\n");
        match til.vcs() {
            Some(vcs) if vcs.is_initialized() => {
                match vcs.status() {
                    Ok(status) if status.trim().is_empty() => {
                        md.push_str("Working tree clean, no changes to commit.\n")
                    }
                    Ok(status) => md.push_str(&format!("```\n{}\n```\n", status.trim_end())),
                    Err(e) => renderer.print_warning(&format!("could not read git status: {e}")),
                }
                let remote = config.git_remote_url.as_deref().unwrap_or("none");
                md.push_str(&format!("\nRemote: {remote}\n"));
            }
            _ => md.push_str("Git not initialized in the TIL repository.\n"),
        }
    }

    if config.sync_to_notion {
        let synced = entries.iter().filter(|e| e.notion_synced).count();
        md.push_str("\n## Notion\n\n");
        md.push_str(&format!(
            "* API key: {}\n",
            mask_string(config.notion_api_key.as_deref().unwrap_or_default())
        ));
        md.push_str(&format!(
            "* DB id: {}\n",
            mask_string(config.notion_db_id.as_deref().unwrap_or_default())
        ));
        md.push_str(&format!("* Synced: {synced}/{} entries\n", entries.len()));
    }

    md.push_str("\n## Commands\n\n");
    md.push_str("* `til add <file>` stages files\n");
    md.push_str("* `til commit -m \"message\"` creates a new entry\n");
    md.push_str("* `til push` syncs with Notion and git\n");

    renderer.print_md(&md);
    Ok(())
}

/// Keeps the first and last four characters of a secret.
pub fn mask_string(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
