use anyhow::{Context, Result};
use std::io::Write;
use std::{fs, path::Path, process::Command};

pub const COMMIT_TEMPLATE: &str = "
# Enter your TIL message. The first line is the title, the rest is the body.
# Lines starting with '#' are ignored.
# An empty message aborts the commit.
";

pub fn resolve_editor(editor: Option<&str>) -> String {
    editor
        .map(str::to_string)
        .or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vim".into())
}

/// Opens `editor_cmd` on a temp file holding `initial` and returns what was saved.
pub fn create_editor_buffer(editor_cmd: &str, initial: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("til")
        .suffix(".md")
        .tempfile()
        .context("creating editor buffer")?;
    file.write_all(initial.as_bytes())
        .context("writing editor buffer")?;

    let path = file.path().to_path_buf();
    open_file_in_editor(editor_cmd, &path)?;
    fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

pub fn open_file_in_editor(editor_cmd: &str, path: &Path) -> Result<()> {
    // Editors configured with arguments, e.g. `code --wait`.
    let mut parts = editor_cmd.split_whitespace();
    let program = parts.next().context("editor command is empty")?;
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("launching editor '{editor_cmd}'"))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}

/// Drops `#` comment lines and surrounding whitespace.
pub fn strip_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// First line is the title; the remainder, trimmed, is the body.
pub fn split_commit_message(content: &str) -> (String, String) {
    match content.trim().split_once('\n') {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (content.trim().to_string(), String::new()),
    }
}
