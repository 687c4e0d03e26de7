//! Summarization Orchestrator
//!
//! Top-level entry point: profiles the document, picks and runs the
//! recommended strategy, optionally applies an executive refinement pass,
//! scores the result for diagnostics, and returns the summary. Refinement
//! is the single phase whose failure is absorbed; everything else surfaces
//! as one classified [`SummaryError`].

use crate::analyzer::DocumentAnalyzer;
use crate::capability::CompletionCapability;
use crate::client::CompletionClient;
use crate::config::SummarizerConfig;
use crate::error::SummaryError;
use crate::quality;
use crate::strategy::StrategyRunner;
use crate::types::{Complexity, ProcessingStats};
use std::time::Instant;

/// Adaptive multi-strategy document summarizer
///
/// Owns a completion client around the injected capability; everything else
/// is per-call value state, so one instance can serve many sequential
/// requests.
pub struct Summarizer<C> {
    client: CompletionClient<C>,
    analyzer: DocumentAnalyzer,
    config: SummarizerConfig,
}

impl<C: CompletionCapability> Summarizer<C> {
    pub fn new(capability: C) -> Self {
        Self::with_config(capability, SummarizerConfig::default())
    }

    pub fn with_config(capability: C, config: SummarizerConfig) -> Self {
        Self {
            client: CompletionClient::new(capability, &config),
            analyzer: DocumentAnalyzer::new(&config),
            config,
        }
    }

    /// Summarize a document, returning only the summary text
    pub async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        self.summarize_with_report(text)
            .await
            .map(|(summary, _)| summary)
    }

    /// Summarize a document, returning the summary together with the
    /// processing statistics gathered along the way
    pub async fn summarize_with_report(
        &self,
        text: &str,
    ) -> Result<(String, ProcessingStats), SummaryError> {
        let started = Instant::now();

        let profile = self.analyzer.analyze(text);
        let strategy = profile.recommended_strategy;
        tracing::info!(
            "[Orchestrator] ~{} tokens across ~{} pages, {} complexity, strategy={}",
            profile.estimated_tokens,
            profile.estimated_pages,
            profile.complexity.as_str(),
            strategy.as_str(),
        );

        let runner = StrategyRunner::new(&self.client, &self.config);
        let outcome = runner.execute(strategy, text, &profile).await?;
        let mut summary = outcome.summary;
        let mut strategy_label = strategy.as_str().to_string();

        if self.wants_refinement(&profile) {
            match runner.refine(&summary).await {
                Ok(refined) => {
                    summary = refined;
                    strategy_label.push_str(" with executive refinement");
                }
                Err(error) => {
                    // the one absorbed failure: keep the unrefined summary
                    tracing::warn!(
                        "[Orchestrator] Executive refinement failed ({}), keeping base summary",
                        error
                    );
                }
            }
        }

        let metrics = quality::assess(text, &summary, &profile, &strategy_label);
        if metrics.overall_quality < self.config.quality.min_overall_score {
            tracing::warn!(
                "[Orchestrator] Quality {} below target {} (coverage {}, coherence {}, \
                 detail {}, structure {})",
                metrics.overall_quality,
                self.config.quality.min_overall_score,
                metrics.coverage_score,
                metrics.coherence_score,
                metrics.detail_retention,
                metrics.structure_score,
            );
        }

        let stats = ProcessingStats {
            input_chars: text.len(),
            output_chars: summary.len(),
            input_tokens: profile.estimated_tokens,
            output_tokens: self.config.window.estimate_tokens(summary.len()),
            processing_ms: started.elapsed().as_millis() as u64,
            chunks_processed: outcome.chunks_processed,
            quality_metrics: metrics,
        };
        tracing::info!(
            "[Orchestrator] Done in {}ms: {} -> {} chars over {} chunks, quality {}",
            stats.processing_ms,
            stats.input_chars,
            stats.output_chars,
            stats.chunks_processed,
            stats.quality_metrics.overall_quality,
        );

        Ok((summary, stats))
    }

    fn wants_refinement(&self, profile: &crate::types::DocumentProfile) -> bool {
        profile.complexity == Complexity::Complex
            && profile.estimated_pages > self.config.pipeline.refinement_min_pages
    }
}
