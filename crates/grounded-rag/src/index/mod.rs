//! Vector index: read-only nearest-neighbour search over embedded chunks

pub mod flat;
pub mod handle;
pub mod store;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ScoredChunk;

pub use flat::FlatIndex;
pub use handle::IndexHandle;

/// Nearest-neighbour search over embedded chunks.
///
/// Implementations must be safe to query from many tasks at once and must
/// never mutate themselves during a search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` closest chunks to `query`, with distances (lower = closer)
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of indexed chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
