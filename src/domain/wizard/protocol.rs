//! Protocol composer.
//!
//! Appends the fixed engineering-execution contract to the session transcript.
//! The contract tells the engine the JSON shape, the four phase identifiers,
//! the refinement rules and the escaping rules it must follow.

/// Language used for explanatory output when none is configured.
pub const DEFAULT_OUTPUT_LANGUAGE: &str = "Spanish";

const CONTRACT_HEADER: &str = "ENGINEERING EXECUTION PROTOCOL - STRICT MODE (WIZARD JSON EDITION)

Execution is sequential and mandatory.
Do not skip phases.
Do not generate code before PHASE 3.";

const CONTRACT_BODY: &str = r#"Output MUST be a single valid JSON object.
No text is allowed outside the JSON.

JSON SCHEMA: {
    "status": "OK | INSUFFICIENT_INFORMATION",
    "missing_information": [ "string" ],
    "phases": [
        { "phase_id": "PHASE_1", "title": "PROBLEM MODELING", "steps": [ { "step_id": "1", "label": "string", "content": "string" } ] },
        { "phase_id": "PHASE_2", "title": "DESIGN", "steps": [ { "step_id": "5", "label": "string", "content": "string" } ] },
        { "phase_id": "PHASE_3", "title": "IMPLEMENTATION", "steps": [ { "step_id": "9", "label": "IMPLEMENTATION", "content": "FULL_CODE" } ] },
        { "phase_id": "PHASE_4", "title": "VALIDATION", "steps": [ { "step_id": "10", "label": "string", "content": "string" } ] }
    ]
}

If the project description is not enough to proceed, answer with
"status": "INSUFFICIENT_INFORMATION" and list one question per missing item
in "missing_information".

REFINEMENT MODE RULES:
1. If the user provides feedback, focus on updating "PHASE_3 - IMPLEMENTATION".
2. The "content" in PHASE_3 must always contain the FULL updated code, never a diff.
3. Always return the complete document with every phase.

CRITICAL ESCAPING:
- Escape every double quote inside "content" with a backslash (\").
- Never put a real line break inside a string. Use the two characters \n.

GLOBAL RULES:
- No text outside JSON. No markdown."#;

/// Builds outbound requests. Stateless apart from the output language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolComposer {
    output_language: String,
}

impl ProtocolComposer {
    pub fn new(output_language: impl Into<String>) -> Self {
        Self {
            output_language: output_language.into(),
        }
    }

    pub fn output_language(&self) -> &str {
        &self.output_language
    }

    /// The contract text appended to every request.
    pub fn contract(&self) -> String {
        format!(
            "{CONTRACT_HEADER}\nAll explanatory output MUST be in {}.\n{CONTRACT_BODY}",
            self.output_language
        )
    }

    /// Returns the transcript followed by the contract.
    pub fn compose(&self, transcript: &str) -> String {
        format!("{transcript}\n\n{}", self.contract())
    }
}

impl Default for ProtocolComposer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_LANGUAGE)
    }
}
