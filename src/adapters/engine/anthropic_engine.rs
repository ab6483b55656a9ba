//! Anthropic Engine - EngineChannel over Anthropic's Messages API.
//!
//! Text blocks of the response are concatenated into the raw reply. A reply
//! cut off by `max_tokens` is still returned; the parser decides whether the
//! truncated document is usable.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

use super::backoff::backoff_delay;
use crate::domain::wizard::RawEngineReply;
use crate::ports::{ChannelInfo, EngineChannel, TransportError};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic engine.
#[derive(Debug, Clone)]
pub struct AnthropicEngineConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Upper bound on generated tokens. Required by the API.
    pub max_tokens: u32,
}

impl AnthropicEngineConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            max_tokens: 8192,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic Messages API engine.
pub struct AnthropicEngine {
    config: AnthropicEngineConfig,
    client: Client,
    last_reply: RwLock<Option<RawEngineReply>>,
}

impl AnthropicEngine {
    pub fn new(config: AnthropicEngineConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            last_reply: RwLock::new(None),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn to_anthropic_request(&self, prompt: &str) -> AnthropicRequest {
        AnthropicRequest {
            model: self.config.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        }
    }

    async fn send_request(&self, prompt: &str) -> Result<Response, TransportError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.to_anthropic_request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    TransportError::network(format!("Connection failed: {}", e))
                } else {
                    TransportError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, TransportError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(TransportError::AuthenticationFailed),
            429 => Err(TransportError::rate_limited(60)),
            400 | 404 | 413 => Err(TransportError::invalid_request(error_body)),
            // 529 is Anthropic's "overloaded"
            500..=599 => Err(TransportError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(TransportError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<RawEngineReply, TransportError> {
        let response = self.send_request(prompt).await?;
        let response = self.handle_response_status(response).await?;

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| {
                TransportError::invalid_response(format!("Failed to parse response: {}", e))
            })?;

        if body.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(
                max_tokens = self.config.max_tokens,
                "anthropic reply truncated at max_tokens"
            );
        }

        Ok(reply_from_response(body))
    }
}

#[async_trait]
impl EngineChannel for AnthropicEngine {
    async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(request).await {
                Ok(reply) => {
                    tracing::debug!(
                        model = %self.config.model,
                        reply_len = reply.len(),
                        "anthropic reply received"
                    );
                    *self.last_reply.write().await = Some(reply.clone());
                    return Ok(reply);
                }
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, retry_count, "anthropic request failed, retrying");
                }
            }

            sleep(backoff_delay(retry_count)).await;
            retry_count += 1;
        }
    }

    async fn last_reply(&self) -> Result<Option<RawEngineReply>, TransportError> {
        Ok(self.last_reply.read().await.clone())
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("anthropic", &self.config.model)
    }
}

fn reply_from_response(body: AnthropicResponse) -> RawEngineReply {
    let text = body
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    RawEngineReply::new(text)
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}
