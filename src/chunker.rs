//! Semantic Chunker
//!
//! Splits a document into bounded-size chunks at linguistically meaningful
//! boundaries. Candidate break points near the size target are ranked by
//! boundary class (heading > bold label > triple break > paragraph break >
//! sentence > semicolon > comma); when nothing qualifies the cut falls back
//! to the raw size limit. Deterministic for a given input and parameters.

use crate::types::Chunk;
use once_cell::sync::Lazy;
use regex::Regex;

/// Chunks whose trimmed prompt text is at or below this length are assumed
/// to be harmless trailing fragments and dropped
const MIN_CHUNK_CHARS: usize = 200;

/// Major heading lines
static MAJOR_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*(?:#{1,6}|Chapter|Section|\d+\.)\s+").unwrap());

/// Bold or underscored label lines
static BOLD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*(?:\*\*|__)[^*_]+(?:\*\*|__)\s*\n").unwrap());

/// Triple blank separation
static TRIPLE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

/// Paragraph break
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Period followed by whitespace; the start of the next sentence is checked
/// separately because the regex crate has no lookahead
static PERIOD_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());

/// Any sentence-ending punctuation
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

static SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s+").unwrap());

static COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s+").unwrap());

/// Split `text` into chunks of at most roughly `max_chars` characters, each
/// chunk after the first prefixed with the trailing `overlap_chars` of
/// context preceding it.
///
/// Chunk bodies cover the source in order with no gaps; only a trailing
/// fragment below the minimum floor is ever discarded.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<Chunk> {
    if text.len() <= max_chars {
        return vec![Chunk {
            index: 0,
            start: 0,
            end: text.len(),
            overlap: String::new(),
            body: text.to_string(),
        }];
    }

    let mut chunks = Vec::new();
    let mut position = 0usize;

    while position < text.len() {
        let mut chunk_end = prev_boundary(text, (position + max_chars).min(text.len()));

        if chunk_end < text.len() {
            let search_start = prev_boundary(text, chunk_end.saturating_sub(max_chars / 4));
            let search_end = prev_boundary(text, (chunk_end + max_chars / 10).min(text.len()));
            let min_break = position + max_chars * 6 / 10;

            if let Some(break_pos) = best_break(text, search_start, search_end, min_break) {
                chunk_end = break_pos;
            }
        }

        if chunk_end <= position {
            // degenerate boundary clamp; force forward progress on the raw cut
            chunk_end = next_boundary(text, (position + max_chars).min(text.len()));
        }

        let overlap_start = if position > 0 {
            prev_boundary(text, position.saturating_sub(overlap_chars))
        } else {
            0
        };

        let chunk = Chunk {
            index: chunks.len(),
            start: position,
            end: chunk_end,
            overlap: text[overlap_start..position].to_string(),
            body: text[position..chunk_end].to_string(),
        };

        if chunk.full_text().trim().len() > MIN_CHUNK_CHARS {
            chunks.push(chunk);
        }

        position = chunk_end;
    }

    tracing::debug!(
        "[Chunker] Split {} chars into {} chunks (max {}, overlap {})",
        text.len(),
        chunks.len(),
        max_chars,
        overlap_chars
    );
    chunks
}

/// Find the break position of the highest-priority boundary class that lands
/// inside `[min_break, search_end]`, scanning `[search_start, search_end)`
fn best_break(text: &str, search_start: usize, search_end: usize, min_break: usize) -> Option<usize> {
    let window = &text[search_start..search_end];
    let qualifies = |pos: usize| pos >= min_break && pos <= search_end;

    // boundary classes in priority order; the first class with a qualifying
    // candidate wins, and within a class the first candidate wins
    for regex in [&MAJOR_HEADING, &BOLD_HEADING, &TRIPLE_BREAK, &PARAGRAPH_BREAK] {
        if let Some(pos) = regex
            .find_iter(window)
            .map(|m| search_start + m.end())
            .find(|&p| qualifies(p))
        {
            return Some(pos);
        }
    }

    // sentence boundary followed by a capitalized sentence start
    if let Some(pos) = PERIOD_GAP
        .find_iter(window)
        .map(|m| search_start + m.end())
        .find(|&p| qualifies(p) && next_char_is_uppercase(text, p))
    {
        return Some(pos);
    }

    for regex in [&SENTENCE_END, &SEMICOLON, &COMMA] {
        if let Some(pos) = regex
            .find_iter(window)
            .map(|m| search_start + m.end())
            .find(|&p| qualifies(p))
        {
            return Some(pos);
        }
    }

    None
}

fn next_char_is_uppercase(text: &str, pos: usize) -> bool {
    text[pos..].chars().next().is_some_and(|c| c.is_uppercase())
}

/// Largest char boundary at or below `i`
fn prev_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or above `i`
fn next_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
