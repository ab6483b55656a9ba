//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `EEP_WIZARD` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use eep_wizard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Talking to {:?}", config.engine.provider);
//! ```

mod engine;
mod error;
mod logging;
mod wizard;

pub use engine::{EngineConfig, EngineProvider};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use wizard::WizardConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine channel configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Wizard timing, output language and error log location
    #[serde(default)]
    pub wizard: WizardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EEP_WIZARD` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `EEP_WIZARD__ENGINE__PROVIDER=anthropic` -> `engine.provider = Anthropic`
    /// - `EEP_WIZARD__WIZARD__REVERT_DELAY_MS=2000` -> `wizard.revert_delay_ms = 2000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EEP_WIZARD")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.wizard.validate()?;
        Ok(())
    }
}
