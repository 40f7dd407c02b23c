//! Similarity search with optional per-document filtering

use crate::error::Result;
use crate::index::VectorIndex;
use crate::types::{chunk::sort_by_distance, RetrievalQuery, ScoredChunk};

/// Runs similarity searches against a read-only index.
///
/// Holds no mutable state, so one retriever can serve concurrent questions.
pub struct Retriever<'a> {
    index: &'a dyn VectorIndex,
    /// Over-fetch multiplier applied when a source filter is set
    oversample: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a dyn VectorIndex, oversample: usize) -> Self {
        Self {
            index,
            oversample: oversample.max(1),
        }
    }

    /// Up to `k` chunks closest to the query, ascending by distance.
    ///
    /// The index has no native per-document filter, so a filtered query
    /// over-fetches `oversample * k` candidates and filters afterwards.
    /// Index errors propagate: a broken index is fatal for the question.
    pub async fn retrieve(&self, query: &RetrievalQuery, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut results = match &query.source_filter {
            Some(source) => {
                let fetch_k = k.saturating_mul(self.oversample).max(k);
                let candidates = self.index.similarity_search(&query.text, fetch_k).await?;
                let fetched = candidates.len();
                let kept: Vec<ScoredChunk> = candidates
                    .into_iter()
                    .filter(|r| r.chunk.is_from(source))
                    .collect();
                tracing::debug!(
                    "Source filter {:?} kept {}/{} candidates",
                    source,
                    kept.len(),
                    fetched
                );
                kept
            }
            None => self.index.similarity_search(&query.text, k).await?,
        };

        // Index ordering is not trusted
        sort_by_distance(&mut results);
        results.truncate(k);

        if let Some(best) = results.first() {
            tracing::debug!(
                "Retrieved {} chunks, best distance {:.4} ({})",
                results.len(),
                best.distance,
                best.chunk.source
            );
        }
        Ok(results)
    }
}
