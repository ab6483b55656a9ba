//! Wizard domain module.
//!
//! Pure logic for one EEP wizard run: composing requests, pulling JSON out of
//! free-text replies, repairing and parsing it, and the session state machine
//! that sequences turns.

mod context;
mod error_log;
mod errors;
mod extractor;
mod parser;
mod protocol;
mod reply;
mod response;
pub mod sanitizer;
mod session;
mod state;

pub use context::SessionContext;
pub use error_log::{export_file_name, ErrorLogEntry, ErrorLogExport};
pub use errors::{ExtractionError, ParseError, SessionError};
pub use extractor::extract_json_candidate;
pub use parser::{parse_wizard_response, ParsedReply};
pub use protocol::{ProtocolComposer, DEFAULT_OUTPUT_LANGUAGE};
pub use reply::RawEngineReply;
pub use response::{
    unescape_content, Phase, ResponseStatus, Step, WizardResponse, IMPLEMENTATION_LABEL,
};
pub use sanitizer::sanitize;
pub use session::{Notice, WizardSession};
pub use state::WizardState;
