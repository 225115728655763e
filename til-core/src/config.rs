use crate::error::{IoContext, Result, TilError};
use crate::git::{DEFAULT_BRANCHES, browse_url};
use crate::paths::RepoPaths;
use crate::storage::atomic_write;
use directories::BaseDirs;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const NOTION_API_KEY_ENV: &str = "TIL_NOTION_API_KEY";
pub const NOTION_DB_ID_ENV: &str = "TIL_NOTION_DB_ID";

/// `KEY=VALUE` lines written by older versions of the repository config.
static LEGACY_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9_]*)\s*=\s*(.*)$").unwrap());

#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root; holds `.til/` and `til/`.
    pub root: PathBuf,
    /// Preferred editor binary. Optional; the CLI falls back to $VISUAL/$EDITOR.
    pub editor: Option<String>,
    pub sync_to_notion: bool,
    pub notion_api_key: Option<String>,
    pub notion_db_id: Option<String>,
    pub sync_to_git: bool,
    pub git_remote_url: Option<String>,
    /// Branches tried in order when checking out and pushing.
    pub git_branches: Vec<String>,
    /// Public URL under which `til/files/` is served, used for Notion attachments.
    pub attachments_url: Option<String>,
}

/// Both config files share this shape; the repository file wins field by field.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    editor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_to_notion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notion_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notion_db_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_to_git: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_branches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments_base_url: Option<String>,
}

impl FileConfig {
    fn merge(self, over: FileConfig) -> FileConfig {
        FileConfig {
            editor: over.editor.or(self.editor),
            sync_to_notion: over.sync_to_notion.or(self.sync_to_notion),
            notion_api_key: over.notion_api_key.or(self.notion_api_key),
            notion_db_id: over.notion_db_id.or(self.notion_db_id),
            sync_to_git: over.sync_to_git.or(self.sync_to_git),
            git_remote_url: over.git_remote_url.or(self.git_remote_url),
            git_branches: over.git_branches.or(self.git_branches),
            attachments_base_url: over.attachments_base_url.or(self.attachments_base_url),
        }
    }
}

impl Config {
    /// Defaults for `root`, without reading anything from disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_file_config(root.into(), FileConfig::default())
    }

    /// Public entrypoint: user defaults (first XDG path, then native), then the
    /// repository's `.til/config`, then environment overrides.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let user = Self::read_user_config()?;
        let repo = Self::read_file(&RepoPaths::new(&root).config_file())?.unwrap_or_default();

        let mut config = Self::from_file_config(root, user.merge(repo));
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file_config(root: PathBuf, file: FileConfig) -> Self {
        let git_branches = file
            .git_branches
            .filter(|branches| !branches.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect());
        Self {
            root,
            editor: file.editor,
            sync_to_notion: file.sync_to_notion.unwrap_or(false),
            notion_api_key: file.notion_api_key.filter(|v| !v.is_empty()),
            notion_db_id: file.notion_db_id.filter(|v| !v.is_empty()),
            sync_to_git: file.sync_to_git.unwrap_or(false),
            git_remote_url: file.git_remote_url.filter(|v| !v.is_empty()),
            git_branches,
            attachments_url: file.attachments_base_url.filter(|v| !v.is_empty()),
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(NOTION_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.notion_api_key = Some(key);
        }
        if let Some(id) = var(NOTION_DB_ID_ENV).filter(|v| !v.is_empty()) {
            self.notion_db_id = Some(id);
        }
    }

    pub fn paths(&self) -> RepoPaths {
        RepoPaths::new(&self.root)
    }

    /// Where attachment copies are served from: the configured URL, or the
    /// git remote's `files/` directory on the first branch.
    pub fn attachments_base_url(&self) -> Option<String> {
        if let Some(url) = &self.attachments_url {
            return Some(url.clone());
        }
        let remote = self.git_remote_url.as_deref()?;
        let branch = self.git_branches.first()?;
        Some(format!("{}/raw/{branch}/files", browse_url(remote)))
    }

    /// Writes the repository-level settings to `.til/config` as TOML.
    pub fn save(&self) -> Result<()> {
        let file = FileConfig {
            editor: None,
            sync_to_notion: Some(self.sync_to_notion),
            notion_api_key: self.notion_api_key.clone(),
            notion_db_id: self.notion_db_id.clone(),
            sync_to_git: Some(self.sync_to_git),
            git_remote_url: self.git_remote_url.clone(),
            git_branches: None,
            attachments_base_url: self.attachments_url.clone(),
        };
        let path = self.paths().config_file();
        let content = toml::to_string(&file).map_err(|e| TilError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        atomic_write(&path, &content)
    }

    pub fn config_file_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Some(b) = BaseDirs::new() {
            let xdg = b.home_dir().join(".config").join("til").join("config.toml");
            v.push(xdg);
            let native = b.config_dir().join("til").join("config.toml");
            if !v.contains(&native) {
                v.push(native);
            }
        }
        v
    }

    /// Read the first existing user config file.
    fn read_user_config() -> Result<FileConfig> {
        for path in Self::config_file_paths() {
            if let Some(file) = Self::read_file(&path)? {
                tracing::debug!("loaded user config {}", path.display());
                return Ok(file);
            }
        }
        Ok(FileConfig::default())
    }

    fn read_file(path: &Path) -> Result<Option<FileConfig>> {
        if !path.is_file() {
            return Ok(None);
        }
        let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse_file(&s)
            .map(Some)
            .map_err(|message| TilError::Config {
                path: path.to_path_buf(),
                message,
            })
    }

    /// Parses TOML, or the older `KEY=VALUE` format when every setting line
    /// looks like one.
    fn parse_file(s: &str) -> std::result::Result<FileConfig, String> {
        let mut settings = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .peekable();
        let is_legacy = settings.peek().is_some()
            && settings.all(|line| LEGACY_LINE_RE.is_match(line));
        if is_legacy {
            return Ok(Self::parse_legacy(s));
        }
        toml::from_str::<FileConfig>(s).map_err(|e| e.to_string())
    }

    fn parse_legacy(s: &str) -> FileConfig {
        let mut file = FileConfig::default();
        for caps in s.lines().filter_map(|line| LEGACY_LINE_RE.captures(line.trim())) {
            let value = caps[2].trim().to_string();
            match &caps[1] {
                "SYNC_TO_NOTION" => file.sync_to_notion = Some(value == "true"),
                "NOTION_API_KEY" => file.notion_api_key = Some(value),
                "NOTION_DB_ID" => file.notion_db_id = Some(value),
                "SYNC_TO_GIT" => file.sync_to_git = Some(value == "true"),
                "GIT_REMOTE_URL" => file.git_remote_url = Some(value),
                other => tracing::debug!("ignoring unknown config key {other}"),
            }
        }
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::write_file;
    use tempfile::tempdir;

    #[test]
    fn candidates_prioritize_xdg_then_native() {
        if let Some(b) = BaseDirs::new() {
            let expected_xdg = b.home_dir().join(".config").join("til").join("config.toml");
            let c = Config::config_file_paths();
            assert_eq!(c.first(), Some(&expected_xdg));
            assert!(c.contains(&b.config_dir().join("til").join("config.toml")));
        }
    }

    #[test]
    fn parse_file_accepts_toml() {
        let toml = r#"
            sync_to_notion = true
            notion_api_key = "secret_abc"
            notion_db_id = "db1"
            sync_to_git = true
            git_remote_url = "git@github.com:me/til.git"
            git_branches = ["trunk"]
        "#;
        let fc = Config::parse_file(toml).unwrap();
        assert_eq!(fc.sync_to_notion, Some(true));
        assert_eq!(fc.notion_api_key.as_deref(), Some("secret_abc"));
        assert_eq!(fc.git_branches, Some(vec!["trunk".to_string()]));
    }

    #[test]
    fn parse_file_accepts_legacy_key_value() {
        let legacy = "SYNC_TO_NOTION=true\nNOTION_API_KEY=secret_abc\nNOTION_DB_ID=db1\nSYNC_TO_GIT=false\n";
        let fc = Config::parse_file(legacy).unwrap();
        assert_eq!(fc.sync_to_notion, Some(true));
        assert_eq!(fc.notion_api_key.as_deref(), Some("secret_abc"));
        assert_eq!(fc.notion_db_id.as_deref(), Some("db1"));
        assert_eq!(fc.sync_to_git, Some(false));
    }

    #[test]
    fn parse_file_rejects_garbage() {
        assert!(Config::parse_file("sync_to_git = [").is_err());
    }

    #[test]
    fn repository_file_overrides_user_defaults() {
        let user = FileConfig {
            editor: Some("hx".into()),
            notion_api_key: Some("user-key".into()),
            ..FileConfig::default()
        };
        let repo = FileConfig {
            notion_api_key: Some("repo-key".into()),
            sync_to_git: Some(true),
            ..FileConfig::default()
        };
        let config = Config::from_file_config(PathBuf::from("/tmp/j"), user.merge(repo));
        assert_eq!(config.editor.as_deref(), Some("hx"));
        assert_eq!(config.notion_api_key.as_deref(), Some("repo-key"));
        assert!(config.sync_to_git);
        assert_eq!(config.git_branches, ["main", "master"]);
    }

    #[test]
    fn env_overrides_credentials() {
        let mut config = Config::new("/tmp/j");
        config.notion_api_key = Some("file-key".into());
        config.apply_env(|key| match key {
            NOTION_API_KEY_ENV => Some("env-key".into()),
            NOTION_DB_ID_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.notion_api_key.as_deref(), Some("env-key"));
        assert_eq!(config.notion_db_id, None);
    }

    #[test]
    fn save_then_load_round_trips_repository_settings() {
        let tmp = tempdir().unwrap();
        let mut config = Config::new(tmp.path());
        config.sync_to_notion = true;
        config.notion_api_key = Some("secret_abc".into());
        config.notion_db_id = Some("db1".into());
        config.sync_to_git = true;
        config.git_remote_url = Some("git@github.com:me/til.git".into());
        config.save().unwrap();

        let text = fs::read_to_string(config.paths().config_file()).unwrap();
        let fc = Config::parse_file(&text).unwrap();
        let reloaded = Config::from_file_config(tmp.path().to_path_buf(), fc);
        assert!(reloaded.sync_to_notion);
        assert!(reloaded.sync_to_git);
        assert_eq!(reloaded.notion_db_id.as_deref(), Some("db1"));
        assert_eq!(reloaded.git_remote_url, config.git_remote_url);
    }

    #[test]
    fn legacy_repository_file_is_read_by_read_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config");
        write_file(&path, "SYNC_TO_NOTION=false\n");
        let fc = Config::read_file(&path).unwrap().unwrap();
        assert_eq!(fc.sync_to_notion, Some(false));
        assert!(Config::read_file(&tmp.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn attachments_url_falls_back_to_git_remote() {
        let mut config = Config::new("/tmp/j");
        assert_eq!(config.attachments_base_url(), None);

        config.git_remote_url = Some("git@github.com:me/til.git".into());
        assert_eq!(
            config.attachments_base_url().as_deref(),
            Some("https://github.com/me/til/raw/main/files")
        );

        config.attachments_url = Some("https://cdn.example.com/til".into());
        assert_eq!(
            config.attachments_base_url().as_deref(),
            Some("https://cdn.example.com/til")
        );
    }
}
