//! Conversation session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Restrict every question in the session to one document
    #[serde(default)]
    pub source_filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// POST /api/sessions - Start a session
pub async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionCreated>) {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let session_id = state.create_session(request.source_filter);
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// DELETE /api/sessions/:id - End a session and forget its memory
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.remove_session(&id)?;
    tracing::debug!("Deleted session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
