//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod wizard;

pub use wizard::{ExportErrorLogHandler, OrchestratorTiming, WizardError, WizardOrchestrator};
