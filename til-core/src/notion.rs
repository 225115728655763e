//! Notion database as a push target.
//!
//! Each entry becomes one page: the message is the `TIL` title property, the
//! body is split on blank lines into paragraph blocks, and attachments are
//! linked from the `Attachments` files property when a public base URL is
//! configured.

use crate::config::Config;
use crate::entry::Entry;
use crate::error::{Result, TilError};
use crate::paths::locate_attachment;
use chrono::{DateTime, Local};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
const TITLE_PROPERTY: &str = "TIL";
const FILES_PROPERTY: &str = "Attachments";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub trait RemoteDatabase {
    /// Creates a page for `entry`. Attachments are looked up in `attachments_dir`.
    fn push_entry(&self, entry: &Entry, attachments_dir: &Path) -> Result<()>;

    /// Whether a page titled with the entry's message already exists.
    fn is_entry_synced(&self, entry: &Entry) -> Result<bool>;

    /// Most recent pages first. `limit` of 0 lets the server pick the page size.
    fn get_entries(&self, limit: usize) -> Result<Vec<Entry>>;
}

pub struct NotionClient {
    http: Client,
    api_url: String,
    api_key: String,
    database_id: String,
    attachments_base_url: Option<String>,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("api_url", &self.api_url)
            .field("database_id", &self.database_id)
            .field("attachments_base_url", &self.attachments_base_url)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TilError::Notion(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: NOTION_API_URL.to_string(),
            api_key: api_key.into(),
            database_id: database_id.into(),
            attachments_base_url: None,
        })
    }

    /// Client for the database named in `config`, which must carry both
    /// Notion credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (Some(api_key), Some(database_id)) =
            (config.notion_api_key.as_deref(), config.notion_db_id.as_deref())
        else {
            return Err(TilError::Notion(
                "missing Notion API key or database id; run 'til init --notion-api-key ... --notion-db-id ...'".into(),
            ));
        };
        let mut client = Self::new(api_key, database_id)?;
        client.attachments_base_url = config.attachments_base_url();
        Ok(client)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_attachments_base_url(mut self, base_url: Option<String>) -> Self {
        self.attachments_base_url = base_url;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| TilError::Notion(format!("request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| TilError::Notion(format!("reading response: {e}")))?;
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(TilError::Notion(format!("{status}: {message}")));
        }
        Ok(body)
    }

    fn query(&self, payload: &Value) -> Result<Value> {
        let url = format!("{}/databases/{}/query", self.api_url, self.database_id);
        self.send(self.http.post(url).json(payload))
    }

    fn attachment_links(&self, entry: &Entry, attachments_dir: &Path) -> Vec<(String, String)> {
        let Some(base) = self.attachments_base_url.as_deref() else {
            if !entry.files.is_empty() {
                tracing::debug!("no attachments base URL configured; not linking files");
            }
            return Vec::new();
        };
        entry
            .files
            .iter()
            .filter_map(|name| {
                let Some(path) = locate_attachment(attachments_dir, entry, name) else {
                    tracing::warn!("attachment {name} of '{}' is missing", entry.message);
                    return None;
                };
                let stored = path.file_name()?.to_string_lossy().into_owned();
                Some((name.clone(), format!("{}/{stored}", base.trim_end_matches('/'))))
            })
            .collect()
    }
}

impl RemoteDatabase for NotionClient {
    fn push_entry(&self, entry: &Entry, attachments_dir: &Path) -> Result<()> {
        let links = self.attachment_links(entry, attachments_dir);
        let payload = page_payload(&self.database_id, entry, &links);
        let url = format!("{}/pages", self.api_url);
        self.send(self.http.post(url).json(&payload))?;
        tracing::debug!("pushed '{}' to Notion", entry.message);
        Ok(())
    }

    fn is_entry_synced(&self, entry: &Entry) -> Result<bool> {
        let response = self.query(&json!({
            "filter": {
                "property": TITLE_PROPERTY,
                "title": { "equals": entry.message },
            },
            "page_size": 100,
        }))?;
        Ok(parse_pages(&response)
            .iter()
            .any(|remote| remote.message == entry.message))
    }

    fn get_entries(&self, limit: usize) -> Result<Vec<Entry>> {
        let mut payload = json!({
            "sorts": [{ "timestamp": "created_time", "direction": "descending" }],
        });
        if limit > 0 {
            payload["page_size"] = json!(limit.min(100));
        }
        let response = self.query(&payload)?;
        Ok(parse_pages(&response))
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Paragraph blocks for a body: one per blank-line separated chunk.
pub fn body_blocks(body: &str) -> Vec<Value> {
    body.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(paragraph) },
            })
        })
        .collect()
}

/// `POST /pages` payload. `attachments` are (display name, public URL) pairs.
pub fn page_payload(database_id: &str, entry: &Entry, attachments: &[(String, String)]) -> Value {
    let mut properties = json!({
        TITLE_PROPERTY: { "title": rich_text(&entry.message) },
    });
    if !attachments.is_empty() {
        let files: Vec<Value> = attachments
            .iter()
            .map(|(name, url)| {
                json!({ "name": name, "type": "external", "external": { "url": url } })
            })
            .collect();
        properties[FILES_PROPERTY] = json!({ "files": files });
    }

    let mut payload = json!({
        "parent": { "type": "database_id", "database_id": database_id },
        "properties": properties,
    });
    let children = entry.message_body.as_deref().map(body_blocks).unwrap_or_default();
    if !children.is_empty() {
        payload["children"] = Value::Array(children);
    }
    payload
}

/// Entries from a database query response. Pages without a title are skipped.
pub fn parse_pages(response: &Value) -> Vec<Entry> {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|page| {
            let properties = page.get("properties")?;
            let message = properties
                .get(TITLE_PROPERTY)?
                .get("title")?
                .as_array()?
                .first()?
                .get("plain_text")?
                .as_str()?
                .to_string();
            let date = page
                .get("created_time")
                .and_then(Value::as_str)
                .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
                .map(|date| date.with_timezone(&Local))
                .unwrap_or_else(Local::now);
            let files = properties
                .get(FILES_PROPERTY)
                .and_then(|prop| prop.get("files"))
                .and_then(Value::as_array)
                .map(|files| {
                    files
                        .iter()
                        .filter_map(|file| file.get("name")?.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            let mut entry = Entry::new(message, None, files, date);
            entry.notion_synced = true;
            Some(entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{at, write_file};
    use tempfile::tempdir;

    #[test]
    fn payload_carries_title_and_paragraphs() {
        let entry = Entry::new(
            "Rust lifetimes",
            Some("First para.\n\n\n\nSecond para.\n".into()),
            vec![],
            at(2025, 8, 15, 12, 0),
        );
        let payload = page_payload("db123", &entry, &[]);

        assert_eq!(payload["parent"]["database_id"], "db123");
        assert_eq!(
            payload["properties"]["TIL"]["title"][0]["text"]["content"],
            "Rust lifetimes"
        );
        assert!(payload["properties"].get("Attachments").is_none());

        let children = payload["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[1]["paragraph"]["rich_text"][0]["text"]["content"],
            "Second para."
        );
    }

    #[test]
    fn payload_without_body_has_no_children() {
        let entry = Entry::new("Bare", None, vec![], at(2025, 8, 15, 12, 0));
        assert!(page_payload("db", &entry, &[]).get("children").is_none());
    }

    #[test]
    fn payload_links_attachments_as_external_files() {
        let entry = Entry::new("Pics", None, vec!["a.png".into()], at(2025, 8, 15, 12, 0));
        let links = vec![("a.png".to_string(), "https://host/files/x_a.png".to_string())];
        let payload = page_payload("db", &entry, &links);

        let file = &payload["properties"]["Attachments"]["files"][0];
        assert_eq!(file["name"], "a.png");
        assert_eq!(file["type"], "external");
        assert_eq!(file["external"]["url"], "https://host/files/x_a.png");
    }

    #[test]
    fn attachment_links_use_stored_names_under_base_url() {
        let tmp = tempdir().unwrap();
        let entry = Entry::new(
            "Pics",
            None,
            vec!["a.png".into(), "gone.png".into()],
            at(2025, 8, 15, 12, 0),
        );
        write_file(&tmp.path().join(format!("{}_a.png", entry.commit_id)), "png");

        let client = NotionClient::new("key", "db")
            .unwrap()
            .with_attachments_base_url(Some("https://raw.example.com/files/".into()));
        let links = client.attachment_links(&entry, tmp.path());
        assert_eq!(
            links,
            [(
                "a.png".to_string(),
                format!("https://raw.example.com/files/{}_a.png", entry.commit_id)
            )]
        );

        let unlinked = NotionClient::new("key", "db").unwrap();
        assert!(unlinked.attachment_links(&entry, tmp.path()).is_empty());
    }

    #[test]
    fn parse_pages_reads_titles_dates_and_files() {
        let response = json!({
            "results": [
                {
                    "created_time": "2025-08-15T10:00:00.000Z",
                    "properties": {
                        "TIL": { "title": [{ "plain_text": "Remote one" }] },
                        "Attachments": { "files": [{ "name": "a.png" }] },
                    },
                },
                { "properties": { "TIL": { "title": [] } } },
            ],
        });
        let entries = parse_pages(&response);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Remote one");
        assert_eq!(entries[0].files, ["a.png"]);
        assert!(entries[0].notion_synced);
        assert_eq!(
            entries[0].date,
            DateTime::parse_from_rfc3339("2025-08-15T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn from_config_requires_credentials() {
        let tmp = tempdir().unwrap();
        let config = Config::new(tmp.path());
        assert!(NotionClient::from_config(&config).unwrap_err().is_external());
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let client = NotionClient::new("secret_abc123", "db").unwrap();
        let shown = format!("{client:?}");
        assert!(shown.contains("\"db\""));
        assert!(!shown.contains("secret_abc123"));
    }
}
