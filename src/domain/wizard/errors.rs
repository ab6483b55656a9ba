//! Error types for the wizard domain.

use thiserror::Error;

use super::state::WizardState;

/// Failures locating a JSON candidate inside a raw engine reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The reply was empty or whitespace only.
    #[error("empty response from engine")]
    EmptyResponse,

    /// The reply contains no `{ ... }` span.
    #[error("no JSON structure found in engine reply")]
    NoJsonStructure,
}

/// Failures turning a raw engine reply into a [`WizardResponse`](super::WizardResponse).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Both the strict parse and the parse after sanitizing failed.
    #[error("persistent JSON parse failure: {strict_error}; after repair: {sanitized_error}")]
    Persistent {
        /// The complete reply as received from the engine.
        raw_reply: String,
        /// Error from the first, strict parse.
        strict_error: String,
        /// Error from the parse of the sanitized candidate.
        sanitized_error: String,
    },
}

impl ParseError {
    /// Message stored in the error log for this failure.
    pub fn log_message(&self) -> String {
        match self {
            Self::Persistent {
                strict_error,
                sanitized_error,
                ..
            } => format!("strict parse: {strict_error}; sanitized parse: {sanitized_error}"),
            other => other.to_string(),
        }
    }
}

/// Failures raised by the wizard state machine itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("describe the project before starting")]
    EmptyIntent,

    #[error("answer at least one question")]
    NoAnswerProvided,

    #[error("engine returned unrecognized status '{0}'")]
    UnrecognizedStatus(String),

    #[error("action not allowed while {from:?} (needs {to:?})")]
    InvalidTransition { from: WizardState, to: WizardState },
}
