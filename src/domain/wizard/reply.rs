//! Raw text received from the engine for one request/response cycle.

use std::fmt;

/// Opaque, immutable engine reply. Consumed by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEngineReply(String);

impl RawEngineReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// True when the reply holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// True when the reply carries the opening brace the extractor looks for.
    ///
    /// A reply without it is treated as not yet settled and triggers the
    /// fallback retrieval path.
    pub fn has_json_marker(&self) -> bool {
        self.0.contains('{')
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawEngineReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RawEngineReply {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawEngineReply {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(RawEngineReply::new("  \n\t").is_blank());
        assert!(!RawEngineReply::new(" x ").is_blank());
    }

    #[test]
    fn json_marker_requires_open_brace() {
        assert!(RawEngineReply::new("Sure: {\"status\":\"OK\"}").has_json_marker());
        assert!(!RawEngineReply::new("Still thinking...").has_json_marker());
    }
}
