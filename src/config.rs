//! Engine Configuration
//!
//! Tuned constants for the completion context window, the per-strategy
//! chunking parameters, the retry/timeout policy, and response validation.
//! Defaults are calibrated for a ~164k-token context model with an 8k-token
//! output ceiling; every threshold here is a heuristic default, not a
//! guarantee, and callers may override any of them.

use std::time::Duration;

/// Context-window accounting for the completion model
#[derive(Debug, Clone)]
pub struct ContextWindow {
    /// Hard context limit of the model
    pub max_context_tokens: usize,

    /// Ceiling we actually allow a single request to reach (92% of the hard
    /// limit). Exceeding this is a chunking bug, not a transient failure.
    pub safe_context_tokens: usize,

    /// Maximum output tokens per completion
    pub output_tokens: u32,

    /// Calibration ratio for estimating tokens from character counts
    pub chars_per_token: f64,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            max_context_tokens: 163_840,
            safe_context_tokens: 150_000,
            output_tokens: 8_192,
            chars_per_token: 3.5,
        }
    }
}

impl ContextWindow {
    /// Estimate the token count of a text from its character count
    pub fn estimate_tokens(&self, char_count: usize) -> usize {
        (char_count as f64 / self.chars_per_token).ceil() as usize
    }
}

/// Parameters for processing an entire document in one request
#[derive(Debug, Clone)]
pub struct SinglePassConfig {
    /// Largest document (in estimated tokens) eligible for a single pass
    pub max_tokens: usize,
    /// Character equivalent of `max_tokens`
    pub max_chars: usize,
}

impl Default for SinglePassConfig {
    fn default() -> Self {
        Self {
            max_tokens: 140_000, // conservative single-pass limit
            max_chars: 490_000,
        }
    }
}

/// Parameters for the map-reduce strategy
#[derive(Debug, Clone)]
pub struct MapReduceConfig {
    /// Characters per chunk during the MAP phase
    pub chunk_chars: usize,
    /// Characters of trailing context copied onto the next chunk
    pub overlap_chars: usize,
}

impl Default for MapReduceConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 157_500, // ~45k tokens per chunk
            overlap_chars: 2_500,
        }
    }
}

/// Parameters for the hierarchical strategy
#[derive(Debug, Clone)]
pub struct HierarchicalConfig {
    /// Characters per chunk at level 1 (smaller than map-reduce chunks)
    pub chunk_chars: usize,
    /// Level-1 summaries grouped per level-2 synthesis call
    pub batch_size: usize,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 122_500, // ~35k tokens per chunk
            batch_size: 3,
        }
    }
}

/// Request timeout budgets by estimated token count
#[derive(Debug, Clone)]
pub struct TimeoutTiers {
    pub small: Duration,
    pub medium: Duration,
    pub large: Duration,
    pub xlarge: Duration,
}

impl Default for TimeoutTiers {
    fn default() -> Self {
        Self {
            small: Duration::from_secs(60),
            medium: Duration::from_secs(120),
            large: Duration::from_secs(240),
            xlarge: Duration::from_secs(360),
        }
    }
}

impl TimeoutTiers {
    /// Pick the timeout budget for a request of the given estimated size
    pub fn for_tokens(&self, estimated_tokens: usize) -> Duration {
        match estimated_tokens {
            0..=50_000 => self.small,
            50_001..=100_000 => self.medium,
            100_001..=130_000 => self.large,
            _ => self.xlarge,
        }
    }
}

/// Retry policy consumed by the completion client
///
/// Decouples backoff mechanics from call-site logic: the client asks this
/// object how long to wait, it never computes delays inline.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// First backoff delay
    pub base_delay: Duration,
    /// Exponential growth factor per attempt
    pub backoff_multiplier: u32,
    /// Timeout budgets by request size
    pub timeouts: TimeoutTiers,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2_000),
            backoff_multiplier: 2,
            timeouts: TimeoutTiers::default(),
        }
    }
}

impl RetryPolicy {
    /// Standard exponential backoff before the next attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * self.backoff_multiplier.pow(attempt)
    }

    /// Extra penalty applied when the upstream reports throttling, growing
    /// with the attempt number
    pub fn rate_limit_penalty(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 3)
    }

    /// Whether an error class is worth another attempt. Context-window
    /// violations are chunk-sizing bugs and never retried.
    pub fn is_retryable(&self, error: &crate::error::SummaryError) -> bool {
        !matches!(error, crate::error::SummaryError::ContextWindowExceeded { .. })
    }
}

/// Thresholds a completion response must clear before it is accepted
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Responses shorter than this are treated as empty
    pub min_summary_chars: usize,
    /// Minimum sentence count for a structurally sound summary
    pub min_sentences: usize,
    /// Sentences shorter than this (trimmed) are ignored when counting
    pub min_sentence_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_summary_chars: 200,
            min_sentences: 5,
            min_sentence_chars: 15,
        }
    }
}

/// Quality targets used for diagnostics (never for control flow)
#[derive(Debug, Clone)]
pub struct QualityTargets {
    /// Overall score below which a warning is logged
    pub min_overall_score: u32,
}

impl Default for QualityTargets {
    fn default() -> Self {
        Self {
            min_overall_score: 95,
        }
    }
}

/// Top-level configuration for the summarization engine
#[derive(Debug, Clone, Default)]
pub struct SummarizerConfig {
    pub window: ContextWindow,
    pub single_pass: SinglePassConfig,
    pub map_reduce: MapReduceConfig,
    pub hierarchical: HierarchicalConfig,
    pub retry: RetryPolicy,
    pub validation: ValidationConfig,
    pub quality: QualityTargets,
    pub pipeline: PipelineConfig,
}

/// Flow-control knobs for the strategy executors
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent per-chunk completion calls during MAP / LEVEL-1 fan-out.
    /// 1 means strictly sequential processing.
    pub max_concurrent_requests: usize,

    /// Documents above this page count (when classified complex) get an
    /// executive refinement pass
    pub refinement_min_pages: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 1, // sequential is the safe default
            refinement_min_pages: 20,
        }
    }
}
