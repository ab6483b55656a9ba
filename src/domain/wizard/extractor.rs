//! Response extraction.
//!
//! Locates the JSON-shaped part of a free-text engine reply.

use super::errors::ExtractionError;

/// Returns the span from the first `{` to the last `}` of the reply, inclusive.
///
/// This is a greedy bracket-span match, not a balanced-brace scan: a `}` in
/// prose after the JSON object is included, and the sanitizer/parser must
/// cope with whatever it drags along.
pub fn extract_json_candidate(reply: &str) -> Result<&str, ExtractionError> {
    if reply.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let start = reply.find('{').ok_or(ExtractionError::NoJsonStructure)?;
    let end = reply.rfind('}').ok_or(ExtractionError::NoJsonStructure)?;
    if end < start {
        return Err(ExtractionError::NoJsonStructure);
    }

    Ok(&reply[start..=end])
}
