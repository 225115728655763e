use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Day granularity used for headings, legacy file names and identity.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const COMMIT_ID_LEN: usize = 12;

/// One journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: DateTime<Local>,
    pub message: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_committed: bool,
    #[serde(default)]
    pub notion_synced: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit_id: String,
}

impl Entry {
    /// Builds a committed entry and derives its commit id.
    pub fn new(
        message: impl Into<String>,
        message_body: Option<String>,
        files: Vec<String>,
        date: DateTime<Local>,
    ) -> Self {
        let message = message.into();
        let commit_id = derive_commit_id(&message, &date);
        Self {
            date,
            message,
            message_body: message_body.filter(|body| !body.trim().is_empty()),
            files,
            is_committed: true,
            notion_synced: false,
            commit_id,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    pub fn day_string(&self) -> String {
        self.date.format(DAY_FORMAT).to_string()
    }

    pub fn has_body(&self) -> bool {
        self.message_body.is_some()
    }

    /// Fills in a missing commit id. Records written before ids existed get
    /// one derived from their stored message and date.
    pub fn ensure_commit_id(&mut self) {
        if self.commit_id.is_empty() {
            self.commit_id = derive_commit_id(&self.message, &self.date);
        }
    }

    /// Whether `other` refers to the same stored record.
    ///
    /// The commit id is the key; (day, message) only decides when one side
    /// has no id.
    pub fn is_same_record(&self, other: &Entry) -> bool {
        if !self.commit_id.is_empty() && !other.commit_id.is_empty() {
            return self.commit_id == other.commit_id;
        }
        self.day() == other.day() && self.message == other.message
    }
}

/// Content-derived id: first 12 hex chars of SHA-256 over the message and the
/// UTC timestamp at nanosecond precision.
pub fn derive_commit_id(message: &str, date: &DateTime<Local>) -> String {
    let stamp = date
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Nanos, true);
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(b"\n");
    hasher.update(stamp.as_bytes());
    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(COMMIT_ID_LEN);
    id
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let body = Option::<String>::deserialize(deserializer)?;
    Ok(body.filter(|body| !body.is_empty()))
}
