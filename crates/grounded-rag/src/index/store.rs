//! On-disk persistence for the flat index
//!
//! Layout of an index directory:
//! - `index.json`: chunks and their vectors
//! - `manifest.json`: dimensions, counts, embedding model and a SHA-256 of `index.json`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::flat::{FlatIndex, IndexEntry};

const INDEX_FILE: &str = "index.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Metadata written next to the index payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub dimensions: usize,
    pub chunk_count: usize,
    pub source_count: usize,
    pub embed_model: String,
    pub built_at: DateTime<Utc>,
    /// Hex SHA-256 of `index.json`
    pub checksum: String,
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// True when `dir` holds a persisted index
pub fn exists(dir: &Path) -> bool {
    dir.join(INDEX_FILE).is_file() && dir.join(MANIFEST_FILE).is_file()
}

/// Write the index to `dir`, replacing any previous one
pub fn persist(index: &FlatIndex, dir: &Path) -> Result<IndexManifest> {
    std::fs::create_dir_all(dir)?;

    let payload = serde_json::to_vec(index.entries())?;
    let mut sources: Vec<&str> = index
        .entries()
        .iter()
        .map(|e| e.chunk.source.as_str())
        .collect();
    sources.sort_unstable();
    sources.dedup();

    let manifest = IndexManifest {
        dimensions: index.dimensions(),
        chunk_count: index.entries().len(),
        source_count: sources.len(),
        embed_model: index.embedder().model().to_string(),
        built_at: Utc::now(),
        checksum: checksum(&payload),
    };

    // Payload first, manifest last: a crash in between leaves a checksum mismatch
    // that `load` reports as corruption.
    let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
    std::fs::write(&tmp, &payload)?;
    std::fs::rename(&tmp, dir.join(INDEX_FILE))?;
    std::fs::write(
        dir.join(MANIFEST_FILE),
        serde_json::to_vec_pretty(&manifest)?,
    )?;

    tracing::info!(
        "Persisted index to {} ({} chunks from {} sources)",
        dir.display(),
        manifest.chunk_count,
        manifest.source_count
    );
    Ok(manifest)
}

/// Read the manifest only
pub fn read_manifest(dir: &Path) -> Result<IndexManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(Error::unavailable(format!(
            "No index manifest at {}",
            path.display()
        )));
    }
    let raw = std::fs::read(&path)?;
    serde_json::from_slice(&raw)
        .map_err(|e| Error::vector_db(format!("Corrupt manifest {}: {}", path.display(), e)))
}

/// Load a persisted index, verifying checksum and dimensions
pub fn load(dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<FlatIndex> {
    if !exists(dir) {
        return Err(Error::unavailable(format!(
            "No index found at {}; run ingestion first",
            dir.display()
        )));
    }

    let manifest = read_manifest(dir)?;
    let payload = std::fs::read(dir.join(INDEX_FILE))?;
    if checksum(&payload) != manifest.checksum {
        return Err(Error::vector_db(format!(
            "Index checksum mismatch in {}",
            dir.display()
        )));
    }

    let entries: Vec<IndexEntry> = serde_json::from_slice(&payload)
        .map_err(|e| Error::vector_db(format!("Corrupt index payload: {}", e)))?;
    if entries.len() != manifest.chunk_count {
        return Err(Error::vector_db(format!(
            "Manifest lists {} chunks, payload has {}",
            manifest.chunk_count,
            entries.len()
        )));
    }

    if manifest.embed_model != embedder.model() {
        tracing::warn!(
            "Index was built with {} but queries will use {}",
            manifest.embed_model,
            embedder.model()
        );
    }

    let index = FlatIndex::from_entries(entries, embedder)?;
    if index.dimensions() != manifest.dimensions {
        return Err(Error::vector_db(format!(
            "Manifest dimensions {} do not match stored vectors ({})",
            manifest.dimensions,
            index.dimensions()
        )));
    }

    tracing::info!(
        "Loaded index from {} ({} chunks, built {})",
        dir.display(),
        manifest.chunk_count,
        manifest.built_at
    );
    Ok(index)
}
