//! Error taxonomy for the summarization engine
//!
//! Callers receive either a complete summary or exactly one of these
//! classified errors; partial results are never returned silently.

use std::time::Duration;

/// Classified failure surfaced by the summarization engine
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Upstream throttling persisted through every retry
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// A request was built that exceeds the safe context ceiling. This is a
    /// chunk-sizing bug, never retried.
    #[error("request of ~{estimated_tokens} tokens exceeds the safe context ceiling of {ceiling}")]
    ContextWindowExceeded {
        estimated_tokens: usize,
        ceiling: usize,
    },

    /// No response arrived within the timeout budget, through every retry
    #[error("no response within {budget:?}")]
    RequestTimeout { budget: Duration },

    /// Every attempt produced a response below the minimum character floor
    #[error("response too short ({chars} chars)")]
    EmptyResponse { chars: usize },

    /// Every attempt produced a response without summary structure
    #[error("response structurally insufficient: {reason}")]
    QualityCheckFailed { reason: String },

    /// Generic transport or server failure from the completion capability
    #[error("completion API error: {0}")]
    Api(String),

    /// Retries exhausted with no more specific classification
    #[error("summarization failed after exhausting retries")]
    ProcessingFailed,
}

impl SummaryError {
    /// Stable machine-readable code for logging and client dispatch
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::ContextWindowExceeded { .. } => "CONTEXT_WINDOW_EXCEEDED",
            Self::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            Self::EmptyResponse { .. } => "EMPTY_RESPONSE",
            Self::QualityCheckFailed { .. } => "QUALITY_CHECK_FAILED",
            Self::Api(_) => "API_ERROR",
            Self::ProcessingFailed => "PROCESSING_FAILED",
        }
    }
}
