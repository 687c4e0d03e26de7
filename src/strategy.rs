//! Strategy Executors
//!
//! Drives the completion client according to the strategy the analyzer
//! recommended: one call for single-pass documents, chunked MAP followed by
//! one REDUCE synthesis for large documents, and a three-level hierarchy for
//! documents too large for a single reduce. Per-chunk calls may fan out up
//! to the configured concurrency (default sequential); every synthesis
//! phase waits for all of its inputs. Any unrecoverable client failure
//! aborts the whole strategy - partial summaries are never returned.

use crate::capability::CompletionCapability;
use crate::chunker::chunk_text;
use crate::client::CompletionClient;
use crate::config::SummarizerConfig;
use crate::error::SummaryError;
use crate::prompts;
use crate::types::{Chunk, DocumentProfile, StrategyKind};
use futures::stream::{self, StreamExt, TryStreamExt};

/// Result of running one strategy, with the chunk count for diagnostics
#[derive(Debug)]
pub struct StrategyOutcome {
    pub summary: String,
    pub chunks_processed: usize,
}

pub struct StrategyRunner<'a, C> {
    client: &'a CompletionClient<C>,
    config: &'a SummarizerConfig,
}

impl<'a, C: CompletionCapability> StrategyRunner<'a, C> {
    pub fn new(client: &'a CompletionClient<C>, config: &'a SummarizerConfig) -> Self {
        Self { client, config }
    }

    /// Run the given strategy over the document
    pub async fn execute(
        &self,
        kind: StrategyKind,
        text: &str,
        profile: &DocumentProfile,
    ) -> Result<StrategyOutcome, SummaryError> {
        match kind {
            StrategyKind::SinglePass => self.single_pass(text, profile).await,
            StrategyKind::MapReduce => self.map_reduce(text, profile).await,
            StrategyKind::Hierarchical => self.hierarchical(text, profile).await,
        }
    }

    /// The whole document in one comprehensive request
    async fn single_pass(
        &self,
        text: &str,
        profile: &DocumentProfile,
    ) -> Result<StrategyOutcome, SummaryError> {
        tracing::info!(
            "[Strategy] Single-pass over ~{} tokens",
            profile.estimated_tokens
        );
        let message = prompts::compose(&prompts::single_pass_instruction(profile), text);
        let request = self.client.build_request(message, true, "SINGLE-PASS");
        let summary = self.client.complete(&request).await?;
        Ok(StrategyOutcome {
            summary,
            chunks_processed: 1,
        })
    }

    /// MAP each chunk to a detailed summary, then REDUCE them into one
    async fn map_reduce(
        &self,
        text: &str,
        profile: &DocumentProfile,
    ) -> Result<StrategyOutcome, SummaryError> {
        let chunks = chunk_text(
            text,
            self.config.map_reduce.chunk_chars,
            self.config.map_reduce.overlap_chars,
        );
        tracing::info!("[Strategy] Map-reduce over {} chunks", chunks.len());

        let total = chunks.len();
        let summaries = self
            .fan_out(&chunks, |chunk| {
                let message = prompts::compose(
                    &prompts::map_instruction(chunk.index + 1, total, profile),
                    &chunk.full_text(),
                );
                self.client
                    .build_request(message, false, format!("MAP-{}", chunk.index + 1))
            })
            .await?;

        let combined = summaries
            .iter()
            .enumerate()
            .map(|(i, summary)| format!("## SECTION {} DETAILED SUMMARY\n\n{summary}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let message = prompts::compose(
            &prompts::reduce_instruction(summaries.len(), profile),
            &combined,
        );
        let request = self.client.build_request(message, true, "REDUCE-FINAL");
        let summary = self.client.complete(&request).await?;

        Ok(StrategyOutcome {
            summary,
            chunks_processed: total,
        })
    }

    /// Three-level reduction for documents too large for one REDUCE pass
    async fn hierarchical(
        &self,
        text: &str,
        profile: &DocumentProfile,
    ) -> Result<StrategyOutcome, SummaryError> {
        let chunks = chunk_text(text, self.config.hierarchical.chunk_chars, 0);
        let batch_size = self.config.hierarchical.batch_size.max(1);
        tracing::info!(
            "[Strategy] Hierarchical over {} chunks in batches of {}",
            chunks.len(),
            batch_size
        );

        // LEVEL 1: summarize each chunk independently
        let total = chunks.len();
        let level_one = self
            .fan_out(&chunks, |chunk| {
                let message = prompts::compose(
                    &prompts::level1_instruction(chunk.index + 1, total, profile),
                    &chunk.full_text(),
                );
                self.client
                    .build_request(message, false, format!("LEVEL1-{}", chunk.index + 1))
            })
            .await?;

        // LEVEL 2: synthesize fixed-size batches; singleton batches pass
        // through unchanged
        let mut level_two = Vec::with_capacity(level_one.len().div_ceil(batch_size));
        for (batch_index, batch) in level_one.chunks(batch_size).enumerate() {
            if batch.len() == 1 {
                level_two.push(batch[0].clone());
                continue;
            }

            let combined = batch
                .iter()
                .enumerate()
                .map(|(i, summary)| {
                    let section = batch_index * batch_size + i + 1;
                    format!("## SECTION {section} SUMMARY\n\n{summary}")
                })
                .collect::<Vec<_>>()
                .join("\n\n---\n\n");

            let message = prompts::compose(
                &prompts::level2_instruction(batch.len(), profile),
                &combined,
            );
            let request = self.client.build_request(
                message,
                false,
                format!("LEVEL2-{}", batch_index + 1),
            );
            level_two.push(self.client.complete(&request).await?);
        }

        // LEVEL 3: final integration over all major sections
        let combined = level_two
            .iter()
            .enumerate()
            .map(|(i, summary)| format!("## MAJOR SECTION {}\n\n{summary}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n==========\n\n");

        let message = prompts::compose(
            &prompts::level3_instruction(level_two.len(), profile),
            &combined,
        );
        let request = self.client.build_request(message, true, "LEVEL3-FINAL");
        let summary = self.client.complete(&request).await?;

        Ok(StrategyOutcome {
            summary,
            chunks_processed: total,
        })
    }

    /// Executive rewrite of an already-produced summary. The caller absorbs
    /// failures and keeps the unrefined summary.
    pub async fn refine(&self, summary: &str) -> Result<String, SummaryError> {
        tracing::info!("[Strategy] Applying executive refinement pass");
        let message = prompts::compose(&prompts::refinement_instruction(), summary);
        let request = self.client.build_request(message, true, "REFINEMENT");
        self.client.complete(&request).await
    }

    /// Issue one completion per chunk, preserving chunk order, at most
    /// `max_concurrent_requests` in flight. The first failure aborts the
    /// stream and surfaces.
    async fn fan_out(
        &self,
        chunks: &[Chunk],
        build: impl Fn(&Chunk) -> crate::types::CompletionRequest,
    ) -> Result<Vec<String>, SummaryError> {
        let concurrency = self.config.pipeline.max_concurrent_requests.max(1);
        stream::iter(chunks.iter().map(|chunk| {
            let request = build(chunk);
            async move { self.client.complete(&request).await }
        }))
        .buffered(concurrency)
        .try_collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DocumentAnalyzer;
    use crate::capability::{CapabilityError, CompletionOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Capability that records the instruction tail of every accepted call
    /// and returns a valid summary
    struct Recording {
        labels: Mutex<Vec<String>>,
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl Recording {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                labels: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_after: None,
            })
        }

        fn failing_after(calls: usize) -> Arc<Self> {
            Arc::new(Self {
                labels: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_after: Some(calls),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn labels(&self) -> Vec<String> {
            self.labels.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl crate::capability::CompletionCapability for Recording {
        async fn invoke(
            &self,
            system: &str,
            _user: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CapabilityError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| call >= limit) {
                return Err(CapabilityError::ServerError("injected failure".into()));
            }
            // the per-phase instruction ends the system prompt
            let label = system.lines().last().unwrap_or("").to_string();
            self.labels.lock().unwrap().push(label);
            Ok(valid_summary())
        }
    }

    fn valid_summary() -> String {
        "**Overview**\n\nThe document covers several themes in order and in depth. \
         The first section sets out the problem space clearly. The middle sections \
         develop the argument with supporting data. The later sections weigh the \
         evidence against alternatives. The closing section draws the conclusions \
         together into one statement."
            .to_string()
    }

    fn fast_config() -> SummarizerConfig {
        let mut config = SummarizerConfig::default();
        config.retry.base_delay = Duration::from_millis(1);
        config
    }

    fn profile_for(text: &str, config: &SummarizerConfig) -> DocumentProfile {
        DocumentAnalyzer::new(config).analyze(text)
    }

    #[tokio::test]
    async fn test_single_pass_issues_exactly_one_call() {
        let config = fast_config();
        let capability = Recording::new();
        let client = CompletionClient::new(Arc::clone(&capability), &config);
        let runner = StrategyRunner::new(&client, &config);

        let text = "A short report about harvest yields across the region. ".repeat(40);
        let profile = profile_for(&text, &config);
        let outcome = runner
            .execute(StrategyKind::SinglePass, &text, &profile)
            .await
            .unwrap();

        assert_eq!(capability.calls(), 1);
        assert_eq!(outcome.chunks_processed, 1);
        assert!(!outcome.summary.is_empty());
    }

    #[tokio::test]
    async fn test_map_reduce_calls_match_chunk_count_plus_reduce() {
        let config = fast_config();
        let capability = Recording::new();
        let client = CompletionClient::new(Arc::clone(&capability), &config);
        let runner = StrategyRunner::new(&client, &config);

        let text = "Paragraphs of steady prose fill the document, one after another, \
                    each ending with a clean stop.\n\n"
            .repeat(5_200); // ~530k chars, above the single-pass ceiling
        let profile = profile_for(&text, &config);
        assert_eq!(profile.recommended_strategy, StrategyKind::MapReduce);

        let expected_chunks = chunk_text(
            &text,
            config.map_reduce.chunk_chars,
            config.map_reduce.overlap_chars,
        )
        .len();

        let outcome = runner
            .execute(StrategyKind::MapReduce, &text, &profile)
            .await
            .unwrap();

        assert_eq!(capability.calls(), expected_chunks + 1);
        assert_eq!(outcome.chunks_processed, expected_chunks);
    }

    #[tokio::test]
    async fn test_hierarchical_runs_three_levels() {
        let config = fast_config();
        let capability = Recording::new();
        let client = CompletionClient::new(Arc::clone(&capability), &config);
        let runner = StrategyRunner::new(&client, &config);

        let text = "Long-form material keeps arriving in orderly paragraphs that close \
                    with a period and a break.\n\n"
            .repeat(7_600); // ~720k chars, above the map-reduce ceiling
        let profile = profile_for(&text, &config);
        assert_eq!(profile.recommended_strategy, StrategyKind::Hierarchical);

        let level_one = chunk_text(&text, config.hierarchical.chunk_chars, 0).len();
        let multi_member_batches = (0..level_one)
            .collect::<Vec<_>>()
            .chunks(config.hierarchical.batch_size)
            .filter(|batch| batch.len() > 1)
            .count();

        let outcome = runner
            .execute(StrategyKind::Hierarchical, &text, &profile)
            .await
            .unwrap();

        assert_eq!(capability.calls(), level_one + multi_member_batches + 1);
        assert_eq!(outcome.chunks_processed, level_one);

        // the last call was the LEVEL-3 integration
        let labels = capability.labels();
        assert!(labels
            .last()
            .unwrap()
            .contains("complete scope and insights"));
    }

    #[tokio::test]
    async fn test_map_failure_aborts_without_reduce() {
        let mut config = fast_config();
        config.retry.max_retries = 0;
        let capability = Recording::failing_after(1);
        let client = CompletionClient::new(Arc::clone(&capability), &config);
        let runner = StrategyRunner::new(&client, &config);

        let text = "Sentences march on toward the chunk boundary without pause.\n\n"
            .repeat(9_000); // several chunks
        let profile = profile_for(&text, &config);

        let err = runner
            .execute(StrategyKind::MapReduce, &text, &profile)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "API_ERROR");
        // only MAP calls were accepted before the abort; no REDUCE ran
        assert!(capability
            .labels()
            .iter()
            .all(|label| label.contains("Topics include")));
    }

    #[tokio::test]
    async fn test_refine_returns_rewritten_summary() {
        let config = fast_config();
        let capability = Recording::new();
        let client = CompletionClient::new(Arc::clone(&capability), &config);
        let runner = StrategyRunner::new(&client, &config);

        let refined = runner.refine("## Draft\n\nBase summary text.").await.unwrap();
        assert_eq!(refined, valid_summary());
        assert_eq!(capability.calls(), 1);
    }
}
