//! Shared index handle with exclusive rebuilds
//!
//! Queries take a cheap `Arc` snapshot of the current index. A rebuild marks
//! the handle busy; while busy, `acquire` reports the index as unavailable
//! instead of reading files that are being rewritten.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::flat::FlatIndex;
use super::store::{self, IndexManifest};

pub struct IndexHandle {
    dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    current: RwLock<Option<Arc<FlatIndex>>>,
    rebuilding: Arc<AtomicBool>,
    /// Why the persisted index could not be loaded, until a rebuild succeeds
    load_error: RwLock<Option<String>>,
}

/// Exclusive claim on the handle for one rebuild.
///
/// Owned, so it can be taken in a request handler and moved into the task
/// that does the embedding. Dropping it clears the rebuilding flag.
pub struct RebuildGuard(Arc<AtomicBool>);

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IndexHandle {
    /// Create a handle; nothing is loaded yet
    pub fn new(dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            dir: dir.into(),
            embedder,
            current: RwLock::new(None),
            rebuilding: Arc::new(AtomicBool::new(false)),
            load_error: RwLock::new(None),
        }
    }

    /// Wrap an index that is already in memory
    pub fn with_index(
        dir: impl Into<PathBuf>,
        index: FlatIndex,
    ) -> Self {
        let embedder = Arc::clone(index.embedder());
        let handle = Self::new(dir, embedder);
        *handle.current.write() = Some(Arc::new(index));
        handle
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::Acquire)
    }

    /// Ready to serve queries
    pub fn is_ready(&self) -> bool {
        !self.is_rebuilding() && self.current.read().is_some()
    }

    /// Last failure to load the persisted index, if no rebuild has replaced it
    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().clone()
    }

    /// Load the persisted index if present. A missing index is not an error here.
    ///
    /// A load failure is kept and reported by `acquire` until a rebuild succeeds.
    pub fn load_if_present(&self) -> Result<bool> {
        if !store::exists(&self.dir) {
            tracing::warn!("No persisted index at {}", self.dir.display());
            return Ok(false);
        }
        let _guard = self.try_begin_rebuild()?;
        match store::load(&self.dir, Arc::clone(&self.embedder)) {
            Ok(index) => {
                *self.current.write() = Some(Arc::new(index));
                *self.load_error.write() = None;
                Ok(true)
            }
            Err(e) => {
                *self.load_error.write() = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot of the current index for one question
    pub fn acquire(&self) -> Result<Arc<FlatIndex>> {
        if self.is_rebuilding() {
            return Err(Error::unavailable("index is being rebuilt"));
        }
        if let Some(index) = self.current.read().clone() {
            return Ok(index);
        }
        match self.load_error() {
            Some(cause) => Err(Error::unavailable(format!(
                "persisted index failed to load: {}",
                cause
            ))),
            None => Err(Error::unavailable("index has not been built yet")),
        }
    }

    /// Claim the handle for a rebuild; fails if one is already running
    pub fn try_begin_rebuild(&self) -> Result<RebuildGuard> {
        self.rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::unavailable("another index rebuild is in progress"))?;
        Ok(RebuildGuard(Arc::clone(&self.rebuilding)))
    }

    /// Build a new index from `chunks`, persist it and swap it in.
    ///
    /// Fails fast if another rebuild is already running.
    pub async fn rebuild(
        &self,
        chunks: Vec<Chunk>,
        batch_size: usize,
        on_batch: impl FnMut(usize) + Send,
    ) -> Result<IndexManifest> {
        let guard = self.try_begin_rebuild()?;
        self.rebuild_claimed(guard, chunks, batch_size, on_batch).await
    }

    /// Rebuild under a claim already taken with `try_begin_rebuild`
    pub async fn rebuild_claimed(
        &self,
        guard: RebuildGuard,
        chunks: Vec<Chunk>,
        batch_size: usize,
        on_batch: impl FnMut(usize) + Send,
    ) -> Result<IndexManifest> {
        if !Arc::ptr_eq(&guard.0, &self.rebuilding) {
            return Err(Error::internal("rebuild claim belongs to another index"));
        }
        tracing::info!("Rebuilding index from {} chunks", chunks.len());

        let index =
            FlatIndex::build(chunks, Arc::clone(&self.embedder), batch_size, on_batch).await?;
        let manifest = store::persist(&index, &self.dir)?;
        *self.current.write() = Some(Arc::new(index));
        *self.load_error.write() = None;
        drop(guard);
        Ok(manifest)
    }
}
