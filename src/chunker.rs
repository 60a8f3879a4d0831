//! Text chunking: splits document content into the smaller units that get
//! embedded and indexed.
//!
//! Two strategies, matching the two the catalog's chunking factory supports:
//! fixed character-count windows, and sentence-boundary splitting. Neither
//! strategy overlaps chunks — a document's chunks partition its text.

use serde::{Deserialize, Serialize};

/// Which splitting strategy a [`Chunker`] applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum ChunkingStrategy {
    /// Fixed-size character windows, `chunk_size` characters each.
    FixedSize {
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
    },
    /// Split on sentence boundaries (`.`, `!`, `?` followed by whitespace).
    Sentence,
}

fn default_chunk_size() -> usize {
    200
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        ChunkingStrategy::FixedSize {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Splits document text into chunks according to a [`ChunkingStrategy`].
pub struct Chunker {
    strategy: ChunkingStrategy,
}

impl Chunker {
    pub fn new(strategy: ChunkingStrategy) -> Self {
        Self { strategy }
    }

    /// Split `text` into an ordered list of non-overlapping chunks. Empty
    /// input yields no chunks; chunks are never empty strings.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        match &self.strategy {
            ChunkingStrategy::FixedSize { chunk_size } => chunk_fixed(text, (*chunk_size).max(1)),
            ChunkingStrategy::Sentence => chunk_sentences(trimmed),
        }
    }
}

/// Fixed-size character windows over the original (untrimmed) text, matching
/// a simple `text[i:i+chunk_size]` slide with no overlap — counted in
/// characters, not bytes, so multibyte input partitions the same way the
/// original `text[i:i+chunk_size]` slice does.
fn chunk_fixed(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|window| window.iter().collect())
        .collect()
}

/// Split on sentence-ending punctuation followed by whitespace, keeping the
/// terminator attached to the sentence that precedes it.
fn chunk_sentences(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            // Only split if followed by whitespace or end of input —
            // mirrors splitting on `(?<=[.!?])\s+`.
            match chars.peek() {
                None => break,
                Some(next) if next.is_whitespace() => {
                    chunks.push(current.trim().to_string());
                    current.clear();
                    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                        chars.next();
                    }
                }
                _ => {}
            }
        }
    }

    let remainder = current.trim();
    if !remainder.is_empty() {
        chunks.push(remainder.to_string());
    }
    chunks.retain(|c| !c.is_empty());
    chunks
}
