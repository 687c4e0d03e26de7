//! Adaptive Multi-Strategy Document Summarization
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  1. ANALYZE: profile size, structure, complexity, key topics   │
//! │  2. SELECT: single-pass / map-reduce / hierarchical by tokens  │
//! │  3. EXECUTE: chunk + completion calls per the chosen strategy  │
//! │  4. REFINE: executive rewrite for complex 20+ page documents   │
//! │  5. ASSESS: multi-factor quality score (diagnostics only)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine consumes an injected [`CompletionCapability`]; a ready-made
//! adapter for OpenAI-compatible chat-completions endpoints lives in
//! [`provider`]. Every completion call runs under a token-banded timeout
//! with retry/backoff, and callers receive either a complete summary or one
//! classified [`SummaryError`] - never a silent partial result.

pub mod analyzer;
pub mod capability;
pub mod chunker;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod quality;
pub mod strategy;
pub mod types;

// Public API - a capability in, a Summarizer out
pub use capability::{
    CapabilityError, CompletionCapability, CompletionOptions, FallbackCapability,
};
pub use config::SummarizerConfig;
pub use error::SummaryError;
pub use orchestrator::Summarizer;
pub use provider::{ChatCompletionsProvider, ProviderConfig};
pub use types::{
    Chunk, Complexity, DocumentProfile, Language, ProcessingStats, QualityMetrics, StrategyKind,
};
