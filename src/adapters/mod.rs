//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `engine` - Engine channels (OpenAI, Anthropic, scripted mock)
//! - `error_log` - Error log stores (JSON file, in-memory)

pub mod engine;
pub mod error_log;

pub use engine::{
    AnthropicEngine, AnthropicEngineConfig, MockEngine, OpenAiEngine, OpenAiEngineConfig,
};
pub use error_log::{FileErrorLogStore, InMemoryErrorLogStore};
