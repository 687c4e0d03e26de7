//! Shared types for the summarization pipeline

use serde::Serialize;

/// Counts of structural markers found in a document
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElements {
    pub headers: usize,
    pub tables: usize,
    pub lists: usize,
    pub code_blocks: usize,
}

impl StructuralElements {
    pub fn total(&self) -> usize {
        self.headers + self.tables + self.lists + self.code_blocks
    }
}

/// Complexity classification of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

/// Detected language/register of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Technical,
    Mixed,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Technical => "technical",
            Self::Mixed => "mixed",
        }
    }
}

/// Processing strategy recommended for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    SinglePass,
    MapReduce,
    Hierarchical,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SinglePass => "single_pass",
            Self::MapReduce => "map_reduce",
            Self::Hierarchical => "hierarchical",
        }
    }
}

/// Structural and complexity profile of an input document
///
/// Produced once per summarization request by the analyzer; immutable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProfile {
    /// Estimated token count (chars / calibration ratio, rounded up)
    pub estimated_tokens: usize,

    /// Estimated page count at ~2000 chars per page
    pub estimated_pages: usize,

    /// Counts of headings, tables, lists, and code spans
    pub structural_elements: StructuralElements,

    /// Whether the document carries enough markers to count as structured
    pub has_structure: bool,

    /// Complexity classification from sentence length, technical-term
    /// density, and vocabulary richness
    pub complexity: Complexity,

    /// Top recurring content words, frequency order, ties by first occurrence
    pub key_topics: Vec<String>,

    /// Language/register classification
    pub language: Language,

    /// Strategy recommended from the estimated token count alone
    pub recommended_strategy: StrategyKind,
}

/// A bounded slice of the source document produced by the chunker
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position of this chunk in the sequence
    pub index: usize,
    /// Byte offset where the core slice starts in the source
    pub start: usize,
    /// Byte offset one past the end of the core slice
    pub end: usize,
    /// Context copied from before `start` (empty for the first chunk)
    pub overlap: String,
    /// The core slice itself, exactly `source[start..end]`
    pub body: String,
}

impl Chunk {
    /// The text sent to the model: overlap context followed by the body
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(self.overlap.len() + self.body.len());
        text.push_str(&self.overlap);
        text.push_str(&self.body);
        text
    }

    /// Length of the prompt text (overlap included)
    pub fn prompt_len(&self) -> usize {
        self.overlap.len() + self.body.len()
    }
}

/// One completion call as seen by the completion client
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_content: String,
    /// Final-synthesis calls run cooler and may use the full output budget
    pub is_final: bool,
    /// Free-form tag identifying the pass, for logging only
    pub pass_label: String,
    /// Estimated size of the full request in tokens
    pub estimated_tokens: usize,
}

/// Multi-factor quality score for a produced summary
///
/// Pure function of (original, summary, profile); diagnostic only and
/// never consulted for control flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// % of key topics that reappear in the summary
    pub coverage_score: u32,
    /// Readability, from closeness to a target sentence length
    pub coherence_score: u32,
    /// Output/input word ratio as a percentage, one decimal
    pub compression_ratio: f64,
    /// % of detail-bearing tokens preserved
    pub detail_retention: u32,
    /// % of heading structure preserved
    pub structure_score: u32,
    /// Weighted combination of the sub-scores
    pub overall_quality: u32,
    /// Strategy label the summary was produced with
    pub processing_strategy: String,
}

/// Per-request processing statistics, for logging only
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub input_chars: usize,
    pub output_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub processing_ms: u64,
    pub chunks_processed: usize,
    pub quality_metrics: QualityMetrics,
}
