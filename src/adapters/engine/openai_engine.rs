//! OpenAI Engine - EngineChannel over an OpenAI-compatible chat completions API.
//!
//! The composed wizard request goes out as a single user message; the first
//! choice's content comes back as the raw reply.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiEngineConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let engine = OpenAiEngine::new(config)?;
//! ```

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

/// Configuration for the OpenAI engine.
#[derive(Debug, Clone)]
pub struct OpenAiEngineConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout. Full protocol documents take a while to generate.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl OpenAiEngineConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            max_tokens: 8192,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the generated token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI chat completions engine.
pub struct OpenAiEngine {
    config: OpenAiEngineConfig,
    client: Client,
    last_reply: RwLock<Option<RawEngineReply>>,
}

impl OpenAiEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: OpenAiEngineConfig) -> Result<Self, TransportError> {
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

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_openai_request(&self, prompt: &str) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
        }
    }

    async fn send_request(&self, prompt: &str) -> Result<Response, TransportError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&self.to_openai_request(prompt))
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
            429 => Err(TransportError::rate_limited(parse_retry_after(&error_body))),
            400 | 404 | 422 => Err(TransportError::invalid_request(error_body)),
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

    async fn parse_response(&self, response: Response) -> Result<RawEngineReply, TransportError> {
        let response = self.handle_response_status(response).await?;

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| {
                TransportError::invalid_response(format!("Failed to parse response: {}", e))
            })?;

        reply_from_response(body)
    }

    async fn attempt(&self, prompt: &str) -> Result<RawEngineReply, TransportError> {
        let response = self.send_request(prompt).await?;
        self.parse_response(response).await
    }
}

#[async_trait]
impl EngineChannel for OpenAiEngine {
    async fn send_and_wait(&self, request: &str) -> Result<RawEngineReply, TransportError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(request).await {
                Ok(reply) => {
                    tracing::debug!(
                        model = %self.config.model,
                        reply_len = reply.len(),
                        "openai reply received"
                    );
                    *self.last_reply.write().await = Some(reply.clone());
                    return Ok(reply);
                }
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, retry_count, "openai request failed, retrying");
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
        ChannelInfo::new("openai", &self.config.model)
    }
}

fn reply_from_response(body: OpenAiResponse) -> Result<RawEngineReply, TransportError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::invalid_response("No choices in response"))?;

    Ok(RawEngineReply::new(choice.message.content.unwrap_or_default()))
}

/// Parses "try again in Xs" out of an OpenAI error body. Defaults to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
            let rest = &message[message.find("try again in ")? + 13..];
            let end = rest.find(|c: char| !c.is_ascii_digit())?;
            rest[..end].parse::<u32>().ok()
        })
        .unwrap_or(30)
}

// ════════════════════════════════════════════════════════════════════════════
// OpenAI API Types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}
