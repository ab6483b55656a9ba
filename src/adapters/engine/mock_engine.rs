//! Mock Engine for testing.
//!
//! Provides a scripted implementation of the EngineChannel port, allowing
//! wizard runs to be exercised without a real engine.
//!
//! # Features
//!
//! - Scripted replies, consumed in order
//! - Error injection for failure paths
//! - A scripted fallback reply for the alternative retrieval path
//! - Simulated latency
//! - Request tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let engine = MockEngine::new()
//!     .with_reply(r#"{"status":"OK","phases":[]}"#)
//!     .with_error(TransportError::unavailable("down"));
//!
//! let reply = engine.send_and_wait("PROJECT: app").await?;
//! assert_eq!(engine.call_count(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::wizard::RawEngineReply;
use crate::ports::{ChannelInfo, EngineChannel, TransportError};

/// A scripted engine outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Reply(String),
    Error(TransportError),
}

/// Scripted engine for tests and demos.
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Scripted outcomes, consumed in order.
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// What `last_reply` serves.
    fallback: Arc<Mutex<Option<String>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Request history for verification.
    requests: Arc<Mutex<Vec<String>>>,
    /// Number of times the fallback path was consulted.
    fallback_calls: Arc<Mutex<usize>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(None)),
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Queues a reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    /// Queues a transport failure.
    pub fn with_error(self, error: TransportError) -> Self {
        self.push_error(error);
        self
    }

    /// Sets the reply served by the alternative retrieval path.
    pub fn with_fallback_reply(self, text: impl Into<String>) -> Self {
        *lock(&self.fallback) = Some(text.into());
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a reply on a shared handle.
    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(MockReply::Reply(text.into()));
    }

    /// Queues a transport failure on a shared handle.
    pub fn push_error(&self, error: TransportError) {
        lock(&self.replies).push_back(MockReply::Error(error));
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// All requests received, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<String> {
        lock(&self.requests).last().cloned()
    }

    /// Number of times `last_reply` was consulted.
    pub fn fallback_calls(&self) -> usize {
        *lock(&self.fallback_calls)
    }

    fn next_reply(&self) -> MockReply {
        lock(&self.replies).pop_front().unwrap_or_else(|| {
            MockReply::Error(TransportError::unavailable("mock engine has no scripted reply"))
        })
    }
}

#[async_trait]
impl EngineChannel for MockEngine {
    async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError> {
        lock(&self.requests).push(request.to_string());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Reply(text) => Ok(RawEngineReply::new(text)),
            MockReply::Error(err) => Err(err),
        }
    }

    async fn last_reply(&self) -> Result<Option<RawEngineReply>, TransportError> {
        *lock(&self.fallback_calls) += 1;
        Ok(lock(&self.fallback).clone().map(RawEngineReply::new))
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("mock", "mock-engine-1")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
