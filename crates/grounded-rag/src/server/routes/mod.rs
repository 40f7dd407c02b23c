//! API routes for the RAG server

pub mod index;
pub mod query;
pub mod sessions;

use axum::{
    routing::{delete, get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Questions
        .route("/query", post(query::query_rag))
        // Conversation sessions
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", delete(sessions::delete_session))
        // Index maintenance
        .route("/index/rebuild", post(index::rebuild_index))
        .route("/index", get(index::index_status))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "grounded-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering strictly grounded in an indexed PDF collection",
        "endpoints": {
            "POST /api/query": "Ask a question (optional session_id, source_filter)",
            "POST /api/sessions": "Start a conversation session",
            "DELETE /api/sessions/:id": "End a conversation session",
            "POST /api/index/rebuild": "Rebuild the index from the PDF folder",
            "GET /api/index": "Index manifest and readiness"
        },
        "no_answer": crate::config::NO_ANSWER,
    }))
}
