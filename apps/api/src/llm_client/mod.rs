/// LLM Client: the single point of entry for all Claude API calls in the coach service.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Callers depend on the [`TextGenerator`] trait and go through [`generate_text`], which
/// owns the retry policy.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
/// `stop_reason` reported when the model declines to answer.
const REFUSAL_STOP_REASON: &str = "refusal";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response was blocked: {reason}")]
    Blocked { reason: String },

    #[error("LLM call failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    /// Transport failures, rate limits, server errors and unusable replies are retried;
    /// other client errors are returned as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::EmptyContent | LlmError::Blocked { .. } => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Parse(_) | LlmError::Exhausted { .. } => false,
        }
    }
}

/// One model reply: its text, if any, and why it was withheld, if it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: Option<String>,
    pub block_reason: Option<String>,
}

impl Generation {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            block_reason: None,
        }
    }

    /// Usable text, or the reason there is none.
    pub fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.block_reason {
            return Err(LlmError::Blocked { reason });
        }
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

/// Anything that turns a prompt into free text. Implemented by [`LlmClient`] and by
/// test doubles.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// A single attempt; retries are the caller's concern.
    async fn generate(&self, prompt: &str, system: &str) -> Result<Generation, LlmError>;
}

/// Attempt budget with linear backoff: the wait after failed attempt `n` is `n × backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.backoff * failed_attempt
    }
}

/// Calls `generator` until it yields usable text, following `policy`.
pub async fn generate_text(
    generator: &dyn TextGenerator,
    policy: &RetryPolicy,
    prompt: &str,
    system: &str,
) -> Result<String, LlmError> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = LlmError::EmptyContent;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let delay = policy.delay_after(attempt - 1);
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt - 1,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match generator
            .generate(prompt, system)
            .await
            .and_then(Generation::into_text)
        {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() => {
                warn!("LLM attempt {attempt}/{attempts} failed: {e}");
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::Exhausted {
        attempts,
        last: Box::new(last_error),
    })
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

impl From<LlmResponse> for Generation {
    fn from(response: LlmResponse) -> Self {
        let block_reason = response
            .stop_reason
            .as_deref()
            .filter(|reason| *reason == REFUSAL_STOP_REASON)
            .map(str::to_string);
        Generation {
            text: response.text().map(str::to_string),
            block_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API; one request per `generate` call.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, system: &str) -> Result<Generation, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}, stop_reason={:?}",
            llm_response.usage.input_tokens,
            llm_response.usage.output_tokens,
            llm_response.stop_reason
        );

        Ok(llm_response.into())
    }
}
