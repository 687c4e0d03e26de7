//! Completion Capability Seam
//!
//! The engine never talks to a model provider directly. It consumes a
//! [`CompletionCapability`] injected by the caller, which owns the client
//! lifecycle and decides what actually backs the calls (a remote API, a
//! fallback chain, a scripted fake in tests).

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Sampling and length options forwarded with every completion call
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 6_000,
            top_p: 0.85, // slightly more focused
            frequency_penalty: 0.15,
            presence_penalty: 0.1,
        }
    }
}

/// Classified transport failure from a completion capability
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Upstream throttling (HTTP 429 or equivalent), with the provider's
    /// suggested wait when it sent one
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// The provider reported the request exceeds its context window
    #[error("context window exceeded: {0}")]
    ContextExceeded(String),

    /// The transport gave up waiting for a response
    #[error("request timed out")]
    Timeout,

    /// Any other transport or server failure
    #[error("server error: {0}")]
    ServerError(String),
}

/// A single text-generation call against a remote model
///
/// Implementations must return the generated text on success and one of the
/// [`CapabilityError`] classifications on failure; the engine's retry policy
/// keys off those classifications.
#[async_trait]
pub trait CompletionCapability: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError>;
}

#[async_trait]
impl<C: CompletionCapability + ?Sized> CompletionCapability for Arc<C> {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        (**self).invoke(system_prompt, user_content, options).await
    }
}

/// Primary/secondary capability pair with fallback on failure
///
/// The secondary is only consulted when the primary fails outright; it does
/// not participate in per-call retries (those happen above this seam).
pub struct FallbackCapability<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackCapability<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P, S> CompletionCapability for FallbackCapability<P, S>
where
    P: CompletionCapability,
    S: CompletionCapability,
{
    async fn invoke(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: &CompletionOptions,
    ) -> Result<String, CapabilityError> {
        match self.primary.invoke(system_prompt, user_content, options).await {
            Ok(text) => Ok(text),
            Err(primary_err) => {
                tracing::warn!(
                    "[Capability] Primary provider failed ({}), falling back to secondary",
                    primary_err
                );
                self.secondary
                    .invoke(system_prompt, user_content, options)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(Result<&'static str, fn() -> CapabilityError>, AtomicUsize);

    impl Fixed {
        fn ok(text: &'static str) -> Self {
            Self(Ok(text), AtomicUsize::new(0))
        }

        fn failing(err: fn() -> CapabilityError) -> Self {
            Self(Err(err), AtomicUsize::new(0))
        }

        fn calls(&self) -> usize {
            self.1.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionCapability for Fixed {
        async fn invoke(
            &self,
            _system: &str,
            _user: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            match &self.0 {
                Ok(text) => Ok((*text).to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn test_fallback_skips_secondary_on_success() {
        let capability = FallbackCapability::new(Fixed::ok("primary"), Fixed::ok("secondary"));
        let text = capability
            .invoke("sys", "user", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "primary");
        assert_eq!(capability.secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_uses_secondary_on_failure() {
        let capability = FallbackCapability::new(
            Fixed::failing(|| CapabilityError::ServerError("boom".into())),
            Fixed::ok("secondary"),
        );
        let text = capability
            .invoke("sys", "user", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "secondary");
        assert_eq!(capability.primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_surfaces_secondary_error() {
        let capability = FallbackCapability::new(
            Fixed::failing(|| CapabilityError::ServerError("first".into())),
            Fixed::failing(|| CapabilityError::Timeout),
        );
        let err = capability
            .invoke("sys", "user", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout));
    }
}
