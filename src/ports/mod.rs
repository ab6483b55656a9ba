//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EngineChannel` - Sends a composed request to the engine and returns its raw reply
//! - `ErrorLogStore` - Append-only, durable record of irrecoverable replies

mod engine_channel;
mod error_log_store;

pub use engine_channel::{ChannelInfo, EngineChannel, TransportError};
pub use error_log_store::{ErrorLogError, ErrorLogStore};
