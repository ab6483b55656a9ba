//! Wizard behaviour configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Wizard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WizardConfig {
    /// Wait after a reply before reading it, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// How long a failure is shown before reverting, in milliseconds
    #[serde(default = "default_revert_delay")]
    pub revert_delay_ms: u64,

    /// Language the engine must write explanations in
    #[serde(default = "default_output_language")]
    pub output_language: String,

    /// Where irrecoverable replies are recorded
    #[serde(default = "default_error_log_path")]
    pub error_log_path: PathBuf,
}

impl WizardConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms)
    }

    /// Validate wizard configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.revert_delay_ms == 0 {
            return Err(ValidationError::InvalidRevertDelay);
        }
        if self.output_language.trim().is_empty() {
            return Err(ValidationError::MissingRequired("WIZARD__OUTPUT_LANGUAGE"));
        }
        if self.error_log_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("WIZARD__ERROR_LOG_PATH"));
        }
        Ok(())
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            revert_delay_ms: default_revert_delay(),
            output_language: default_output_language(),
            error_log_path: default_error_log_path(),
        }
    }
}

fn default_settle_delay() -> u64 {
    1000
}

fn default_revert_delay() -> u64 {
    4000
}

fn default_output_language() -> String {
    "Spanish".to_string()
}

fn default_error_log_path() -> PathBuf {
    PathBuf::from("eep_errors.json")
}
