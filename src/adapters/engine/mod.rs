//! Engine Channel Adapters.
//!
//! Implementations of the EngineChannel port.
//!
//! ## Available Adapters
//!
//! - `MockEngine` - Scripted engine for testing
//! - `OpenAiEngine` - OpenAI-compatible chat completions API
//! - `AnthropicEngine` - Anthropic Messages API

mod anthropic_engine;
mod backoff;
mod mock_engine;
mod openai_engine;

pub use anthropic_engine::{AnthropicEngine, AnthropicEngineConfig};
pub use mock_engine::{MockEngine, MockReply};
pub use openai_engine::{OpenAiEngine, OpenAiEngineConfig};
