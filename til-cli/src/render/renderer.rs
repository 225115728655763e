use super::theme::OneDark;
use til_core::Entry;
use termimad::{MadSkin, crossterm::style::Stylize};

const BODY_PREVIEW_CHARS: usize = 50;

#[derive(Clone, Copy)]
pub struct RenderOptions {
    pub use_color: bool,
}

pub struct Renderer {
    skin: MadSkin,
    opts: RenderOptions,
}

impl Renderer {
    pub fn new(opts: RenderOptions) -> Self {
        Self {
            skin: OneDark::skin(),
            opts,
        }
    }

    pub fn print_md(&self, md: &str) {
        if self.opts.use_color {
            self.skin.print_text(md);
        } else {
            println!("{}", md.trim_end());
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.opts.use_color {
            println!("{}", message.with(OneDark::CYAN));
        } else {
            println!("{message}");
        }
    }

    /// Warnings go to stderr so they never end up in piped output.
    pub fn print_warning(&self, message: &str) {
        if self.opts.use_color {
            eprintln!("{}", format!("warning: {message}").with(OneDark::YELLOW));
        } else {
            eprintln!("warning: {message}");
        }
    }

    /// `2025-08-15 a1b2c3d4e5f6 Title [files]`
    pub fn print_entry_line(&self, entry: &Entry) {
        let mut date = entry.day_string();
        let mut id = entry.commit_id.clone();
        let mut title = entry.message.clone();
        let mut files = String::new();
        if !entry.files.is_empty() {
            files = format!(" [{}]", entry.files.join(", "));
        }
        if self.opts.use_color {
            date = date.with(OneDark::CYAN).to_string();
            id = id.with(OneDark::COMMENT).to_string();
            title = title.with(OneDark::YELLOW).to_string();
            files = files.with(OneDark::GREEN).to_string();
        }
        println!("{date} {id} {title}{files}");
    }

    pub fn print_entries(&self, entries: &[Entry]) {
        for (i, entry) in entries.iter().enumerate() {
            let mut md = format!("## {} {}\n", entry.day_string(), entry.message.trim());
            if let Some(body) = &entry.message_body {
                md.push_str(&format!("*{}*\n", preview(body)));
            }
            if !entry.files.is_empty() {
                let files: Vec<_> = entry.files.iter().map(|f| format!("`{f}`")).collect();
                md.push_str(&format!("files: {}\n", files.join(", ")));
            }
            self.print_md(&md);
            if i + 1 < entries.len() {
                println!();
            }
        }
    }
}

/// First line of `body`, cut to a short preview.
pub fn preview(body: &str) -> String {
    let first = body.trim().lines().next().unwrap_or_default();
    if first.chars().count() > BODY_PREVIEW_CHARS {
        let cut: String = first.chars().take(BODY_PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}
