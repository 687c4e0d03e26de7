//! Chat-Completions Provider
//!
//! A concrete [`CompletionCapability`] backed by an OpenAI-compatible
//! chat-completions HTTP endpoint. Owns the HTTP client, paces outgoing
//! requests (bounded concurrency plus a minimum inter-request interval),
//! and classifies transport failures into the [`CapabilityError`] taxonomy
//! the engine's retry policy keys off. Construction is explicit - the
//! caller supplies credentials and owns the lifecycle.

use crate::capability::{CapabilityError, CompletionCapability, CompletionOptions};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

/// Connection settings for one chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Endpoint root, e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Requests allowed in flight at once
    pub max_concurrent_requests: usize,
    /// Pacing floor between request starts
    pub requests_per_second: f32,
    /// Transport-level timeout. The engine enforces its own per-call budget
    /// on top, so this only guards requests issued outside it.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_concurrent_requests: 2,
            requests_per_second: 0.5,
            request_timeout: Duration::from_secs(400),
        }
    }
}

/// Completion capability over an OpenAI-compatible endpoint
pub struct ChatCompletionsProvider {
    client: Client,
    config: ProviderConfig,
    rate_limiter: RateLimiter,
}

impl ChatCompletionsProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let rate_limiter = RateLimiter::new(
            config.max_concurrent_requests,
            config.requests_per_second,
        );
        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }
}

#[async_trait]
impl CompletionCapability for ChatCompletionsProvider {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        let _permit = self.rate_limiter.acquire().await;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    CapabilityError::Timeout
                } else {
                    CapabilityError::ServerError(error.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .or_else(|| response.headers().get("x-ratelimit-reset"))
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            tracing::warn!(
                "[Provider] {} throttled us (retry-after: {:?})",
                self.config.model,
                retry_after
            );
            return Err(CapabilityError::RateLimited { retry_after });
        }
        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(CapabilityError::Timeout);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::ServerError(format!("malformed response: {error}")))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                "[Provider] {} used {} tokens",
                self.config.model,
                usage.total_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CapabilityError::ServerError("response carried no choices".into()))
    }
}

/// Map a non-success status and body to a capability error. Context-window
/// rejections arrive either as 413 or as an error body naming the context
/// length.
fn classify_failure(status: StatusCode, body: String) -> CapabilityError {
    let lowered = body.to_lowercase();
    if status == StatusCode::PAYLOAD_TOO_LARGE
        || lowered.contains("context")
        || lowered.contains("too long")
    {
        CapabilityError::ContextExceeded(body)
    } else {
        CapabilityError::ServerError(format!("{status}: {body}"))
    }
}

/// Parse a Retry-After header: either delta-seconds or an HTTP date
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    (when.with_timezone(&chrono::Utc) - chrono::Utc::now())
        .to_std()
        .ok()
}

/// Paces outgoing requests: at most `max_concurrent` in flight, and request
/// starts at least `min_interval` apart
struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    last_request: Mutex<Instant>,
}

impl RateLimiter {
    fn new(max_concurrent: usize, requests_per_second: f32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_interval: Duration::from_secs_f32(1.0 / requests_per_second.max(0.01)),
            last_request: Mutex::new(Instant::now() - Duration::from_secs(10)),
        }
    }

    /// Wait for a slot and the pacing interval. The returned permit must be
    /// held for the duration of the request.
    async fn acquire(&self) -> tokio::sync::OwnedSemaphorePermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore closed");

        let wait = {
            let mut last = self.last_request.lock().await;
            let wait = self.min_interval.saturating_sub(last.elapsed());
            *last = Instant::now() + wait;
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        permit
    }
}

// Wire types for the chat-completions endpoint

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}
