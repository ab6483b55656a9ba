//! Error Log Adapters
//!
//! Implementations of the ErrorLogStore port.
//!
//! ## Available Adapters
//!
//! - **FileErrorLogStore** - Stores the log as a JSON array file on disk
//! - **InMemoryErrorLogStore** - Stores the log in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::error_log::{FileErrorLogStore, InMemoryErrorLogStore};
//!
//! // Production: survives across runs
//! let store = FileErrorLogStore::new("./eep_errors.json");
//!
//! // Testing
//! let store = InMemoryErrorLogStore::new();
//! ```

mod file_error_log_store;
mod in_memory_error_log_store;

pub use file_error_log_store::FileErrorLogStore;
pub use in_memory_error_log_store::InMemoryErrorLogStore;
