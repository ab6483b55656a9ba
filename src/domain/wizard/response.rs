//! Structured wizard response model.
//!
//! Mirrors the JSON document the engine is asked to produce:
//!
//! ```text
//! { "status": "OK" | "INSUFFICIENT_INFORMATION",
//!   "missing_information": [string, ...],
//!   "phases": [ { "phase_id", "title", "steps": [ { "step_id", "label", "content" } ] } ] }
//! ```
//!
//! Deserialization is lenient. Only `status` drives dispatch, so nothing else
//! can reject a reply that is syntactically valid JSON: a list field holding
//! anything but an array reads as empty, list items of the wrong shape are
//! dropped, and scalar text fields accept any JSON value (`null` reads as empty,
//! numbers and booleans as their literal, arrays and objects as JSON text).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Label that marks a step whose content is source code.
pub const IMPLEMENTATION_LABEL: &str = "IMPLEMENTATION";

/// Top-level outcome reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseStatus {
    /// The protocol document is complete.
    Ok,
    /// The engine needs answers to `missing_information` first.
    InsufficientInformation,
    /// Anything else, kept verbatim for diagnostics.
    Unrecognized(String),
}

impl ResponseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::InsufficientInformation => "INSUFFICIENT_INFORMATION",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl Default for ResponseStatus {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for ResponseStatus {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "OK" => Self::Ok,
            "INSUFFICIENT_INFORMATION" => Self::InsufficientInformation,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<ResponseStatus> for String {
    fn from(status: ResponseStatus) -> Self {
        status.as_str().to_string()
    }
}

/// The validated structured result of one engine turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ResponseStatus,

    /// Questions to put to the user, in order. Meaningful when status is insufficient.
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub missing_information: Vec<String>,

    /// Protocol phases, in order. Meaningful when status is `OK`.
    #[serde(default, deserialize_with = "lenient_list")]
    pub phases: Vec<Phase>,
}

impl WizardResponse {
    pub fn is_complete(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn needs_more_information(&self) -> bool {
        self.status == ResponseStatus::InsufficientInformation
    }

    /// Applies [`unescape_content`] to every step, in place.
    pub fn normalize_step_content(mut self) -> Self {
        for step in self.phases.iter_mut().flat_map(|p| p.steps.iter_mut()) {
            step.content = unescape_content(&step.content);
        }
        self
    }
}

/// One stage of the protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(default, deserialize_with = "lenient_text")]
    pub phase_id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,

    /// Ordered; the order is significant and preserved through rendering.
    #[serde(default, deserialize_with = "lenient_list")]
    pub steps: Vec<Step>,
}

/// A labeled content item inside a phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "lenient_text")]
    pub step_id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub label: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub content: String,
}

impl Step {
    /// True when the content is source code rather than prose.
    pub fn is_implementation(&self) -> bool {
        self.label == IMPLEMENTATION_LABEL
    }
}

/// Turns literal `\n` sequences into line breaks and `\"` into plain quotes.
pub fn unescape_content(content: &str) -> String {
    content.replace("\\n", "\n").replace("\\\"", "\"")
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<ResponseStatus, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(ResponseStatus::from)
}

/// Any non-array reads as empty; items that do not deserialize are dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

fn lenient_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(value_to_text)
            .collect()),
        _ => Ok(Vec::new()),
    }
}
