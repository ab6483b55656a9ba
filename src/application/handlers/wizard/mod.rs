//! Wizard handlers.
//!
//! - `WizardOrchestrator` - runs start, reply and refine turns against the engine
//! - `ExportErrorLogHandler` - produces the downloadable error log

mod export_error_log;
mod orchestrator;

pub use export_error_log::ExportErrorLogHandler;
pub use orchestrator::{OrchestratorTiming, WizardError, WizardOrchestrator};
