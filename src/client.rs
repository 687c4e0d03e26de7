//! Completion Client
//!
//! Wraps a single call against the injected completion capability with a
//! context-size precondition, a token-banded timeout that actively cancels
//! the in-flight request, response quality validation, and retry with
//! exponential backoff driven by the configured [`RetryPolicy`].
//!
//! Retry classes:
//! - rate limit / timeout / empty / structurally weak responses retry until
//!   the budget is exhausted, then surface the last classified error
//! - context-window violations surface immediately with zero retries

use crate::capability::{CapabilityError, CompletionCapability, CompletionOptions};
use crate::config::{ContextWindow, RetryPolicy, SummarizerConfig, ValidationConfig};
use crate::error::SummaryError;
use crate::prompts::MessagePair;
use crate::types::CompletionRequest;
use std::time::Duration;

/// Output-token ceiling for intermediate (non-final) passes
const INTERMEDIATE_OUTPUT_TOKENS: u32 = 6_000;

pub struct CompletionClient<C> {
    capability: C,
    window: ContextWindow,
    retry: RetryPolicy,
    validation: ValidationConfig,
}

impl<C: CompletionCapability> CompletionClient<C> {
    pub fn new(capability: C, config: &SummarizerConfig) -> Self {
        Self {
            capability,
            window: config.window.clone(),
            retry: config.retry.clone(),
            validation: config.validation.clone(),
        }
    }

    /// Build a request from a rendered message pair, deriving the token
    /// estimate from the content size
    pub fn build_request(
        &self,
        message: MessagePair,
        is_final: bool,
        pass_label: impl Into<String>,
    ) -> CompletionRequest {
        let estimated_tokens = self.window.estimate_tokens(message.user.len());
        CompletionRequest {
            system_prompt: message.system,
            user_content: message.user,
            is_final,
            pass_label: pass_label.into(),
            estimated_tokens,
        }
    }

    /// Execute one completion request under the full retry/timeout policy
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, SummaryError> {
        if request.estimated_tokens > self.window.safe_context_tokens {
            tracing::warn!(
                "[Client] {} request of ~{} tokens exceeds safe ceiling {}",
                request.pass_label,
                request.estimated_tokens,
                self.window.safe_context_tokens
            );
            return Err(SummaryError::ContextWindowExceeded {
                estimated_tokens: request.estimated_tokens,
                ceiling: self.window.safe_context_tokens,
            });
        }

        let budget = self.retry.timeouts.for_tokens(request.estimated_tokens);
        let options = CompletionOptions {
            temperature: if request.is_final { 0.2 } else { 0.3 },
            max_output_tokens: if request.is_final {
                self.window.output_tokens
            } else {
                self.window.output_tokens.min(INTERMEDIATE_OUTPUT_TOKENS)
            },
            ..CompletionOptions::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            tracing::info!(
                "[Client] {} attempt {}/{} (~{} tokens, {:?} timeout)",
                request.pass_label,
                attempt + 1,
                self.retry.max_retries + 1,
                request.estimated_tokens,
                budget
            );

            let error = match self.attempt(request, &options, budget).await {
                Ok(text) => {
                    tracing::info!(
                        "[Client] {} succeeded: {} chars generated",
                        request.pass_label,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(error) => error,
            };

            if !self.retry.is_retryable(&error) {
                tracing::warn!(
                    "[Client] {} failed without retry: {}",
                    request.pass_label,
                    error
                );
                return Err(error);
            }

            tracing::warn!(
                "[Client] {} attempt {} failed: {} ({})",
                request.pass_label,
                attempt + 1,
                error,
                error.code()
            );

            if attempt < self.retry.max_retries {
                // throttling gets an extra penalty on top of the standard backoff
                if let SummaryError::RateLimitExceeded { .. } = error {
                    tokio::time::sleep(self.retry.rate_limit_penalty(attempt)).await;
                }
                let delay = self.retry.backoff_delay(attempt);
                tracing::debug!("[Client] waiting {:?} before retry", delay);
                tokio::time::sleep(delay).await;
            }

            last_error = Some(error);
        }

        Err(last_error.unwrap_or(SummaryError::ProcessingFailed))
    }

    /// One attempt: invoke under timeout, classify the outcome, validate
    async fn attempt(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
        budget: Duration,
    ) -> Result<String, SummaryError> {
        let call = self
            .capability
            .invoke(&request.system_prompt, &request.user_content, options);

        // dropping the future on timeout cancels the in-flight request
        let outcome = match tokio::time::timeout(budget, call).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(SummaryError::RequestTimeout { budget }),
        };

        let text = outcome.map_err(|error| self.classify(error, request, budget))?;
        self.validate(&text)?;
        Ok(text)
    }

    fn classify(
        &self,
        error: CapabilityError,
        request: &CompletionRequest,
        budget: Duration,
    ) -> SummaryError {
        match error {
            CapabilityError::RateLimited { .. } => SummaryError::RateLimitExceeded { attempts: 1 },
            CapabilityError::ContextExceeded(_) => SummaryError::ContextWindowExceeded {
                estimated_tokens: request.estimated_tokens,
                ceiling: self.window.safe_context_tokens,
            },
            CapabilityError::Timeout => SummaryError::RequestTimeout { budget },
            CapabilityError::ServerError(message) => SummaryError::Api(message),
        }
    }

    /// Reject responses that are too short or structurally unlike a summary
    fn validate(&self, text: &str) -> Result<(), SummaryError> {
        let trimmed = text.trim();
        if trimmed.len() < self.validation.min_summary_chars {
            return Err(SummaryError::EmptyResponse {
                chars: trimmed.len(),
            });
        }

        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| s.trim().len() > self.validation.min_sentence_chars)
            .count();
        if sentences < self.validation.min_sentences {
            return Err(SummaryError::QualityCheckFailed {
                reason: format!("only {sentences} substantial sentences"),
            });
        }

        let has_structure =
            text.contains("##") || text.contains("**") || text.contains("\n\n");
        if !has_structure {
            return Err(SummaryError::QualityCheckFailed {
                reason: "no structural markup".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutTiers;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Capability that replays a scripted sequence of outcomes
    struct Scripted {
        script: Mutex<VecDeque<Result<String, CapabilityError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Result<String, CapabilityError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionCapability for Scripted {
        async fn invoke(
            &self,
            _system: &str,
            _user: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CapabilityError::ServerError("script exhausted".into())))
        }
    }

    /// Capability that never responds within any sane test budget
    struct Hanging {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionCapability for Hanging {
        async fn invoke(
            &self,
            _system: &str,
            _user: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    fn good_summary() -> String {
        "**Overview**\n\nThis section explains the topic in detail and covers the main \
         points carefully. The first finding stands out clearly in the data. The second \
         finding follows from the first one directly. The third finding adds further \
         context to the discussion. The conclusion restates what matters most here."
            .to_string()
    }

    fn fast_config() -> SummarizerConfig {
        let mut config = SummarizerConfig::default();
        config.retry.base_delay = Duration::from_millis(1);
        config.retry.timeouts = TimeoutTiers {
            small: Duration::from_millis(40),
            medium: Duration::from_millis(40),
            large: Duration::from_millis(40),
            xlarge: Duration::from_millis(40),
        };
        config
    }

    fn client_with(script: Vec<Result<String, CapabilityError>>) -> CompletionClient<Scripted> {
        CompletionClient::new(Scripted::new(script), &fast_config())
    }

    fn request(client: &CompletionClient<Scripted>, content: &str) -> CompletionRequest {
        client.build_request(
            MessagePair {
                system: "system".to_string(),
                user: content.to_string(),
            },
            false,
            "test-pass",
        )
    }

    #[tokio::test]
    async fn test_oversized_request_fails_before_any_call() {
        let client = client_with(vec![Ok(good_summary())]);
        // 525_001 chars / 3.5 > 150_000 token ceiling
        let req = request(&client, &"x".repeat(525_004));
        let err = client.complete(&req).await.unwrap_err();
        assert_eq!(err.code(), "CONTEXT_WINDOW_EXCEEDED");
        assert_eq!(client.capability.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let client = client_with(vec![
            Err(CapabilityError::RateLimited { retry_after: None }),
            Err(CapabilityError::RateLimited { retry_after: None }),
            Ok(good_summary()),
        ]);
        let req = request(&client, "summarize this document please");
        let text = client.complete(&req).await.unwrap();
        assert_eq!(text, good_summary());
        assert_eq!(client.capability.calls(), 3);
    }

    #[tokio::test]
    async fn test_context_exceeded_never_retries() {
        let client = client_with(vec![
            Err(CapabilityError::ContextExceeded("too long".into())),
            Ok(good_summary()),
        ]);
        let req = request(&client, "content");
        let err = client.complete(&req).await.unwrap_err();
        assert_eq!(err.code(), "CONTEXT_WINDOW_EXCEEDED");
        assert_eq!(client.capability.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_responses_retry_then_surface() {
        let short = || Ok("too short".to_string());
        let client = client_with(vec![short(), short(), short(), short()]);
        let req = request(&client, "content");
        let err = client.complete(&req).await.unwrap_err();
        assert_eq!(err.code(), "EMPTY_RESPONSE");
        // initial attempt + max_retries
        assert_eq!(client.capability.calls(), 4);
    }

    #[tokio::test]
    async fn test_unstructured_response_retried_once_then_ok() {
        let flat = "a plain answer with no markup at all but it does keep going on for well \
                    over two hundred characters so the length check passes while the sentence \
                    count stays at exactly one which is far below the structural minimum the \
                    validator expects from a real summary";
        let client = client_with(vec![Ok(flat.to_string()), Ok(good_summary())]);
        let req = request(&client, "content");
        let text = client.complete(&req).await.unwrap();
        assert_eq!(text, good_summary());
        assert_eq!(client.capability.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_cancels_and_retries_until_exhausted() {
        let client = CompletionClient::new(
            Hanging {
                calls: AtomicUsize::new(0),
            },
            &fast_config(),
        );
        let req = client.build_request(
            MessagePair {
                system: "system".to_string(),
                user: "content".to_string(),
            },
            false,
            "hang-pass",
        );
        let err = client.complete(&req).await.unwrap_err();
        assert_eq!(err.code(), "REQUEST_TIMEOUT");
        assert_eq!(client.capability.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_server_errors_surface_as_api_error() {
        let client = client_with(vec![
            Err(CapabilityError::ServerError("500".into())),
            Err(CapabilityError::ServerError("500".into())),
            Err(CapabilityError::ServerError("500".into())),
            Err(CapabilityError::ServerError("500".into())),
        ]);
        let req = request(&client, "content");
        let err = client.complete(&req).await.unwrap_err();
        assert_eq!(err.code(), "API_ERROR");
        assert_eq!(client.capability.calls(), 4);
    }

    #[tokio::test]
    async fn test_final_pass_uses_cooler_options() {
        let client = client_with(vec![Ok(good_summary())]);
        let req = client.build_request(
            MessagePair {
                system: "s".to_string(),
                user: "u".to_string(),
            },
            true,
            "final",
        );
        assert!(req.is_final);
        assert!(client.complete(&req).await.is_ok());
    }
}
