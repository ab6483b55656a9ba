//! Engine Channel Port - Interface to the external reply-producing engine.
//!
//! The wizard core hands a single composed request string to the channel and
//! gets back either the raw reply text or a transport failure. Delivery,
//! readiness and authentication are the adapter's business.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoEngine;
//!
//! #[async_trait]
//! impl EngineChannel for EchoEngine {
//!     async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError> {
//!         Ok(RawEngineReply::new(request))
//!     }
//!
//!     fn channel_info(&self) -> ChannelInfo {
//!         ChannelInfo::new("echo", "none")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::wizard::RawEngineReply;

/// Port for the engine interaction channel.
#[async_trait]
pub trait EngineChannel: Send + Sync {
    /// Sends one composed request and waits for the complete reply.
    async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError>;

    /// Alternative retrieval path for the most recent reply.
    ///
    /// Consulted when the primary reply looks unsettled (blank, or without the
    /// JSON opening marker). Channels without such a path return `Ok(None)`.
    async fn last_reply(&self) -> Result<Option<RawEngineReply>, TransportError> {
        Ok(None)
    }

    /// Channel name and model, for logs.
    fn channel_info(&self) -> ChannelInfo;
}

/// Channel identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name (e.g., "openai", "anthropic", "mock").
    pub name: String,
    /// Model identifier the channel talks to.
    pub model: String,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Transport failures: the engine could not be reached or did not answer usefully.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Engine is unavailable (5xx, overloaded).
    #[error("engine unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Rate limited by the engine.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// The engine rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport envelope could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Returns true if the adapter may retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Unavailable { .. }
                | Self::Network(_)
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    #[async_trait]
    impl EngineChannel for EchoEngine {
        async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError> {
            Ok(RawEngineReply::new(request))
        }

        fn channel_info(&self) -> ChannelInfo {
            ChannelInfo::new("echo", "none")
        }
    }

    #[tokio::test]
    async fn last_reply_defaults_to_none() {
        let engine = EchoEngine;
        assert_eq!(engine.last_reply().await, Ok(None));
        assert_eq!(
            engine.send_and_wait("hi").await.unwrap().as_str(),
            "hi"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(TransportError::rate_limited(5).is_retryable());
        assert!(TransportError::unavailable("503").is_retryable());
        assert!(TransportError::network("reset").is_retryable());
        assert!(TransportError::Timeout { timeout_secs: 1 }.is_retryable());
        assert!(!TransportError::AuthenticationFailed.is_retryable());
        assert!(!TransportError::invalid_request("bad").is_retryable());
        assert!(!TransportError::invalid_response("bad").is_retryable());
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            TransportError::unavailable("overloaded").to_string(),
            "engine unavailable: overloaded"
        );
        assert_eq!(
            TransportError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
    }
}
