//! Error log value types.
//!
//! An entry records one irrecoverable engine reply. The export is the whole
//! ordered log serialized as a JSON array of `{date, content, error}` objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// One irrecoverable parse failure. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    #[serde(rename = "date")]
    timestamp: Timestamp,

    /// The complete reply as received from the engine.
    #[serde(rename = "content")]
    raw_content: String,

    #[serde(rename = "error")]
    error_message: String,
}

impl ErrorLogEntry {
    pub fn new(
        timestamp: Timestamp,
        raw_content: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            raw_content: raw_content.into(),
            error_message: error_message.into(),
        }
    }

    /// Entry stamped with the current time.
    pub fn now(raw_content: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::new(Timestamp::now(), raw_content, error_message)
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

/// A serialized export of the full log and its suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogExport {
    pub file_name: String,
    pub contents: String,
    pub entry_count: usize,
}

impl ErrorLogExport {
    /// Builds an export, or `None` when there is nothing to export.
    pub fn from_entries(
        entries: &[ErrorLogEntry],
        exported_at: &Timestamp,
    ) -> Result<Option<Self>, serde_json::Error> {
        if entries.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            file_name: export_file_name(exported_at),
            contents: serde_json::to_string_pretty(entries)?,
            entry_count: entries.len(),
        }))
    }
}

/// `eep_errors_<unix millis>.json`
pub fn export_file_name(at: &Timestamp) -> String {
    format!("eep_errors_{}.json", at.as_unix_millis())
}
