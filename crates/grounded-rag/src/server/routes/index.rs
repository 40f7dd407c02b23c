//! Index maintenance endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::store;
use crate::ingestion;
use crate::server::state::AppState;

/// POST /api/index/rebuild - Re-ingest the PDF folder and rebuild in the background
///
/// PDFs are loaded and chunked before responding, so a missing folder is
/// reported to the caller. Embedding runs after the response; queries get
/// 503 until it finishes.
pub async fn rebuild_index(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>)> {
    // Claimed before loading so concurrent requests cannot both be accepted
    let guard = match state.index().try_begin_rebuild() {
        Ok(guard) => guard,
        Err(_) => {
            return Ok((
                StatusCode::CONFLICT,
                Json(json!({ "status": "already_rebuilding" })),
            ))
        }
    };

    let config = state.config().clone();
    let chunks = tokio::task::spawn_blocking(move || ingestion::load_corpus(&config))
        .await
        .map_err(|e| Error::internal(format!("Ingestion task failed: {}", e)))??;
    let chunk_count = chunks.len();

    let index = Arc::clone(state.index());
    let batch_size = state.config().embeddings.batch_size;
    tokio::spawn(async move {
        let result = index
            .rebuild_claimed(guard, chunks, batch_size, |done| {
                tracing::debug!("Embedded {}/{} chunks", done, chunk_count);
            })
            .await;
        match result {
            Ok(manifest) => tracing::info!(
                "Index rebuilt: {} chunks from {} sources",
                manifest.chunk_count,
                manifest.source_count
            ),
            Err(e) => tracing::error!("Index rebuild failed: {}", e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "rebuilding", "chunks": chunk_count })),
    ))
}

/// GET /api/index - Manifest of the persisted index
pub async fn index_status(State(state): State<AppState>) -> Json<Value> {
    let handle = state.index();
    let manifest = store::read_manifest(handle.dir()).ok();
    Json(json!({
        "ready": handle.is_ready(),
        "rebuilding": handle.is_rebuilding(),
        "load_error": handle.load_error(),
        "manifest": manifest,
    }))
}
