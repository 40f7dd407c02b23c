//! Recursive character chunking with overlap
//!
//! Splits on the coarsest separator present (paragraphs, then lines, then
//! words, then graphemes), recursing only into pieces still larger than the
//! target size, and merges small pieces back into windows that share up to
//! `overlap` characters with their predecessor. Lengths are in characters.

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::types::Chunk;

use super::loader::PageText;

/// Separators tried in order; the empty separator splits into graphemes
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Chunk pages in order, numbering chunks 1, 2, ... within each source
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        let mut counters: HashMap<&str, u32> = HashMap::new();
        let mut chunks = Vec::new();

        for page in pages {
            for text in self.split_text(&page.text) {
                let counter = counters.entry(page.source.as_str()).or_insert(0);
                *counter += 1;
                chunks.push(Chunk::new(text, page.source.as_str(), Some(page.page), *counter));
            }
        }

        tracing::debug!("Chunked {} pages into {} chunks", pages.len(), chunks.len());
        chunks
    }

    /// Split one text into trimmed, non-empty windows
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator present in the text; "" always matches
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()))
            .unwrap_or(separators.len().saturating_sub(1));
        let (separator, rest) = match separators.get(position) {
            Some(sep) => (sep.as_str(), &separators[position + 1..]),
            None => ("", &separators[..0]),
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if rest.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(&piece, rest));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    /// Greedily pack pieces into windows of at most `chunk_size`, carrying
    /// trailing pieces worth at most `overlap` into the next window.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut window_start = 0usize;
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && window.len() > window_start {
                push_joined(&mut out, &window[window_start..]);

                while total > self.overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    total -= char_len(window[window_start]);
                    window_start += 1;
                }
            }

            window.push(piece);
            total += len;
        }

        push_joined(&mut out, &window[window_start..]);
        out
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(900, 120)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_joined(out: &mut Vec<String>, pieces: &[&str]) {
    let joined = pieces.concat();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching it to the start of the following piece
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.graphemes(true).map(str::to_string).collect();
    }

    let mut pieces = Vec::new();
    let mut parts = text.split(separator);
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }
    pieces
}
