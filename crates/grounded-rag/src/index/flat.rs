//! Exact (brute-force) L2 index over chunk embeddings

use async_trait::async_trait;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{chunk::sort_by_distance, Chunk, ScoredChunk};

use super::VectorIndex;

/// A chunk with its stored embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Flat index: every search scans all entries.
///
/// Distances are squared Euclidean (L2²), matching a flat L2 index, so
/// `max_distance` thresholds tuned against one carry over.
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl FlatIndex {
    /// Assemble an index from pre-computed entries, checking dimensions
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let dimensions = entries.first().map(|e| e.vector.len()).unwrap_or(0);
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimensions) {
            return Err(Error::vector_db(format!(
                "Inconsistent embedding size for {} chunk {}: {} != {}",
                bad.chunk.source,
                bad.chunk.chunk_index,
                bad.vector.len(),
                dimensions
            )));
        }
        Ok(Self {
            entries,
            dimensions,
            embedder,
        })
    }

    /// Embed every chunk and build the index.
    ///
    /// `on_batch` is called with the number of chunks embedded so far.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
        mut on_batch: impl FnMut(usize) + Send,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::vector_db("Cannot build an index from zero chunks"));
        }

        let batch_size = batch_size.max(1);
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(chunk, vector)| IndexEntry { chunk, vector }),
            );
            on_batch(entries.len());
        }

        tracing::info!(
            "Built flat index with {} chunks using {}",
            entries.len(),
            embedder.model()
        );

        Self::from_entries(entries, embedder)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Nearest `k` entries to an already-embedded query
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .par_iter()
            .enumerate()
            .map(|(i, entry)| (i, squared_l2(query, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        let mut results: Vec<ScoredChunk> = scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk::new(self.entries[i].chunk.clone(), distance))
            .collect();
        sort_by_distance(&mut results);
        Ok(results)
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query).await?;
        self.search_vector(&embedding, k)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
