//! Chunk types with source tracking for citations

use serde::{Deserialize, Serialize};

/// A unit of retrievable text.
///
/// Created once during ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content
    pub text: String,
    /// Document identifier (the PDF file name)
    pub source: String,
    /// 0-based page index, when the loader knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// 1-based position of this chunk within its source
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        page: Option<u32>,
        chunk_index: u32,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page,
            chunk_index,
        }
    }

    /// Case-insensitive exact match against the source name
    pub fn is_from(&self, source: &str) -> bool {
        self.source.to_lowercase() == source.to_lowercase()
    }

    /// User-facing citation: `source` or `source | p.N` with a 1-based page
    pub fn citation(&self) -> String {
        match self.page {
            Some(page) => format!("{} | p.{}", self.source, u64::from(page) + 1),
            None => self.source.clone(),
        }
    }
}

/// A chunk paired with its distance to the query (lower = more similar)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, distance: f32) -> Self {
        Self { chunk, distance }
    }
}

/// Sort ascending by distance; NaN distances sort last
pub fn sort_by_distance(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}
