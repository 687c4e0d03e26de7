//! Quality Assessor
//!
//! Scores a produced summary against the original text and its profile:
//! topic coverage, coherence, detail retention, structure preservation, and
//! compression fitness, combined into a weighted overall score. Pure and
//! synchronous, total over any input pair, and diagnostic only - a low
//! score is logged upstream, never raised as an error.

use crate::types::{DocumentProfile, QualityMetrics};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Capitalized words, numbers, and numbers with unit/currency suffixes
static DETAIL_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+|\b\d+(?:\.\d+)?(?:%|km|kg|USD|million|billion)?\b").unwrap()
});

/// Heading markers considered for structure preservation
static HEADING_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}|Chapter|Section").unwrap());

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Words long enough to count as topic mentions in the summary
static TOPIC_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{5,}\b").unwrap());

/// Target mean sentence length for the coherence score, in chars
const TARGET_SENTENCE_LENGTH: f64 = 100.0;

/// Compression band treated as appropriate (summary/original word ratio)
const COMPRESSION_BAND: (f64, f64) = (0.05, 0.3);

/// Score a summary against its source document
pub fn assess(
    original: &str,
    summary: &str,
    profile: &DocumentProfile,
    strategy_label: &str,
) -> QualityMetrics {
    let original_words = WORDS.find_iter(original).count();
    let summary_words = WORDS.find_iter(summary).count();

    let coverage_score = coverage(summary, profile);
    let coherence_score = coherence(summary);

    let compression = if original_words == 0 {
        0.0
    } else {
        summary_words as f64 / original_words as f64
    };

    let original_details = DETAIL_TOKENS.find_iter(original).count();
    let summary_details = DETAIL_TOKENS.find_iter(summary).count();
    let detail_retention =
        (summary_details as f64 / original_details.max(1) as f64 * 100.0).min(100.0);

    let structure_score = structure(original, summary);

    let compression_credit =
        if compression > COMPRESSION_BAND.0 && compression < COMPRESSION_BAND.1 {
            95.0
        } else {
            75.0
        };

    let overall_quality = (coverage_score * 0.35
        + coherence_score * 0.25
        + detail_retention * 0.20
        + structure_score * 0.15
        + compression_credit * 0.05)
        .round() as u32;

    QualityMetrics {
        coverage_score: coverage_score.round() as u32,
        coherence_score: coherence_score.round() as u32,
        compression_ratio: (compression * 1000.0).round() / 10.0,
        detail_retention: detail_retention.round() as u32,
        structure_score: structure_score.round() as u32,
        overall_quality,
        processing_strategy: strategy_label.to_string(),
    }
}

/// Fraction of the profile's key topics that reappear as whole words
fn coverage(summary: &str, profile: &DocumentProfile) -> f64 {
    if profile.key_topics.is_empty() {
        // nothing to miss
        return 100.0;
    }
    let topics: HashSet<&str> = profile.key_topics.iter().map(String::as_str).collect();
    let summary_lower = summary.to_lowercase();
    let mentioned: HashSet<&str> = TOPIC_WORDS
        .find_iter(&summary_lower)
        .map(|m| m.as_str())
        .filter_map(|word| topics.get(word).copied())
        .collect();
    (mentioned.len() as f64 / topics.len() as f64 * 100.0).min(100.0)
}

/// Penalize mean sentence lengths far from the target band, floor 60
fn coherence(summary: &str) -> f64 {
    let mut total = 0usize;
    let mut count = 0usize;
    for sentence in summary.split(['.', '!', '?']) {
        if sentence.trim().len() > 10 {
            total += sentence.len();
            count += 1;
        }
    }
    let avg = if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    };
    (100.0 - (avg - TARGET_SENTENCE_LENGTH).abs() / 2.0)
        .max(60.0)
        .min(100.0)
}

/// Heading preservation ratio, or a fixed markup score when the original
/// has no headings
fn structure(original: &str, summary: &str) -> f64 {
    let original_headers = HEADING_MARKERS.find_iter(original).count();
    if original_headers > 0 {
        let summary_headers = HEADING_MARKERS.find_iter(summary).count();
        (summary_headers as f64 / original_headers as f64 * 100.0).min(100.0)
    } else if summary.contains("##") || summary.contains("**") {
        85.0
    } else {
        70.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DocumentAnalyzer;
    use crate::config::SummarizerConfig;

    fn profile_of(text: &str) -> DocumentProfile {
        DocumentAnalyzer::new(&SummarizerConfig::default()).analyze(text)
    }

    #[test]
    fn test_scores_bounded_for_empty_inputs() {
        let profile = profile_of("");
        let metrics = assess("", "", &profile, "single_pass");
        assert!(metrics.overall_quality <= 100);
        assert!(metrics.coverage_score <= 100);
        assert_eq!(metrics.coherence_score, 60);
        assert_eq!(metrics.compression_ratio, 0.0);
    }

    #[test]
    fn test_scores_bounded_for_summary_longer_than_original() {
        let profile = profile_of("tiny");
        let metrics = assess("tiny", &"Giant Words 42 ".repeat(500), &profile, "single_pass");
        assert!(metrics.detail_retention <= 100);
        assert!(metrics.overall_quality <= 100);
    }

    #[test]
    fn test_topic_coverage_counts_reappearing_topics() {
        let original = "climate climate climate policy policy budget budget airport airport \
                        tunnel tunnel harbor harbor railway railway bridge bridge museum museum \
                        library library stadium stadium"
            .to_string();
        let profile = profile_of(&original);
        let covered = assess(&original, "The climate policy and budget align.", &profile, "s");
        let uncovered = assess(&original, "Nothing relevant appears here at all.", &profile, "s");
        assert!(covered.coverage_score > uncovered.coverage_score);
        assert_eq!(uncovered.coverage_score, 0);
    }

    #[test]
    fn test_compression_band_earns_full_credit() {
        let original = "word ".repeat(1_000);
        let profile = profile_of(&original);
        // 100 / 1000 words = 10%, inside the band
        let inside = assess(&original, &"word ".repeat(100), &profile, "s");
        // 600 / 1000 words = 60%, outside the band
        let outside = assess(&original, &"word ".repeat(600), &profile, "s");
        assert_eq!(inside.compression_ratio, 10.0);
        assert!(inside.overall_quality >= outside.overall_quality);
    }

    #[test]
    fn test_structure_ratio_when_original_has_headings() {
        let original = "# One\ntext\n# Two\ntext\n# Three\ntext\n# Four\ntext";
        let profile = profile_of(original);
        let metrics = assess(original, "# One\ncondensed\n# Two\ncondensed", &profile, "s");
        assert_eq!(metrics.structure_score, 50);
    }

    #[test]
    fn test_structure_fixed_scores_without_original_headings() {
        let original = "plain prose without any heading markers at all";
        let profile = profile_of(original);
        let marked = assess(original, "**Bold** summary text", &profile, "s");
        let plain = assess(original, "flat summary text", &profile, "s");
        assert_eq!(marked.structure_score, 85);
        assert_eq!(plain.structure_score, 70);
    }

    #[test]
    fn test_strategy_label_recorded() {
        let profile = profile_of("text");
        let metrics = assess("text", "summary", &profile, "hierarchical");
        assert_eq!(metrics.processing_strategy, "hierarchical");
    }
}
