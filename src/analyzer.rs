//! Document Analyzer
//!
//! Inspects raw extracted text and produces a [`DocumentProfile`]: size
//! estimates, structural-element counts, a complexity classification, key
//! topics, and the recommended processing strategy. Pure and synchronous;
//! the heuristics are regex scans, inherently approximate, and every
//! threshold is a tunable default.

use crate::config::SummarizerConfig;
use crate::types::{Complexity, DocumentProfile, Language, StrategyKind, StructuralElements};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Documents above this estimated token count skip map-reduce and go
/// straight to hierarchical processing
const MAP_REDUCE_TOKEN_CEILING: usize = 200_000;

/// Assumed characters per printed page
const CHARS_PER_PAGE: usize = 2_000;

/// Function words whose density marks ordinary English prose
static ENGLISH_FUNCTION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:the|and|or|but|in|on|at|to|for|of|with|by)\b").unwrap()
});

/// Heading-like lines: markdown hashes, chapter/section labels, numbered
/// headings, or shouting all-caps runs
static HEADING_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:#{1,6}|Chapter|Section|\d+\.|[A-Z][A-Z\s]{5,})").unwrap()
});

/// Pipe-delimited table rows
static TABLE_ROWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\|.*?\|").unwrap());

/// Tab-separated rows, the fallback table marker
static TAB_ROWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t.*\t").unwrap());

/// Bulleted or numbered list lines
static LIST_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:\s*[-*•]\s+|\s*\d+\.\s+)").unwrap());

/// Fenced code blocks
static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());

/// Inline code spans, the fallback code marker
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());

/// Acronyms and tokens containing digits
static TECHNICAL_TERMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}|\b\w*[0-9]+\w*\b").unwrap());

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Common words excluded from topic extraction
const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "will", "would", "could", "should",
];

/// Heuristic document analyzer
///
/// Carries the calibration constants it needs from the engine config so the
/// token estimate and strategy thresholds stay consistent with the client.
pub struct DocumentAnalyzer {
    chars_per_token: f64,
    single_pass_ceiling: usize,
}

impl DocumentAnalyzer {
    pub fn new(config: &SummarizerConfig) -> Self {
        Self {
            chars_per_token: config.window.chars_per_token,
            single_pass_ceiling: config.single_pass.max_tokens,
        }
    }

    /// Profile a document. Always succeeds; empty input yields a simple
    /// profile with zero counts.
    pub fn analyze(&self, text: &str) -> DocumentProfile {
        let char_count = text.len();
        let estimated_tokens = (char_count as f64 / self.chars_per_token).ceil() as usize;
        let estimated_pages = char_count.div_ceil(CHARS_PER_PAGE);

        let structural_elements = scan_structure(text);
        let has_structure = structural_elements.total() >= 3;

        let words: Vec<&str> = WORDS.find_iter(text).map(|m| m.as_str()).collect();
        let technical_terms = TECHNICAL_TERMS.find_iter(text).count();
        let avg_sentence_length = average_sentence_length(text);
        let vocabulary_richness = vocabulary_richness(&words);

        let complexity = if avg_sentence_length > 120.0
            || technical_terms > 100
            || vocabulary_richness > 0.7
        {
            Complexity::Complex
        } else if avg_sentence_length > 80.0 || technical_terms > 50 || vocabulary_richness > 0.5 {
            Complexity::Moderate
        } else {
            Complexity::Simple
        };

        let key_topics = extract_key_topics(&words);

        let english_words = ENGLISH_FUNCTION_WORDS.find_iter(text).count();
        let language = if english_words as f64 > words.len() as f64 * 0.05 {
            Language::English
        } else if structural_elements.code_blocks > 5 || technical_terms > 50 {
            Language::Technical
        } else {
            Language::Mixed
        };

        let recommended_strategy = if estimated_tokens <= self.single_pass_ceiling {
            StrategyKind::SinglePass
        } else if estimated_tokens <= MAP_REDUCE_TOKEN_CEILING {
            StrategyKind::MapReduce
        } else {
            StrategyKind::Hierarchical
        };

        tracing::debug!(
            "[Analyzer] {} chars, ~{} tokens, ~{} pages, {} structure markers, \
             complexity={}, language={}, strategy={}",
            char_count,
            estimated_tokens,
            estimated_pages,
            structural_elements.total(),
            complexity.as_str(),
            language.as_str(),
            recommended_strategy.as_str(),
        );

        DocumentProfile {
            estimated_tokens,
            estimated_pages,
            structural_elements,
            has_structure,
            complexity,
            key_topics,
            language,
            recommended_strategy,
        }
    }
}

fn scan_structure(text: &str) -> StructuralElements {
    let tables = match TABLE_ROWS.find_iter(text).count() {
        0 => TAB_ROWS.find_iter(text).count(),
        n => n,
    };
    let code_blocks = match FENCED_CODE.find_iter(text).count() {
        0 => INLINE_CODE.find_iter(text).count(),
        n => n,
    };

    StructuralElements {
        headers: HEADING_LINES.find_iter(text).count(),
        tables,
        lists: LIST_LINES.find_iter(text).count(),
        code_blocks,
    }
}

/// Mean length of sentences at least 10 trimmed chars long, in chars
fn average_sentence_length(text: &str) -> f64 {
    let mut total = 0usize;
    let mut count = 0usize;
    for sentence in text.split(['.', '!', '?']) {
        if sentence.trim().len() > 10 {
            total += sentence.len();
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Unique-word ratio, case-folded
fn vocabulary_richness(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let unique: std::collections::HashSet<String> =
        words.iter().map(|w| w.to_lowercase()).collect();
    unique.len() as f64 / words.len() as f64
}

/// Top 10 recurring content words, frequency descending, ties broken by
/// first occurrence
fn extract_key_topics(words: &[&str]) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for word in words {
        if word.len() <= 4 {
            continue;
        }
        let lower = word.to_lowercase();
        if STOP_WORDS.contains(&lower.as_str()) {
            continue;
        }
        match index.get(&lower) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(lower.clone(), order.len());
                order.push((lower, 1));
            }
        }
    }

    // stable sort keeps first-occurrence order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().take(10).map(|(word, _)| word).collect()
}
