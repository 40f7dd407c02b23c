//! Query endpoint with grounded answers and citations

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::pipeline::AskParams;
use crate::server::state::AppState;
use crate::session::{greeting_reply, is_greeting};
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer a question from the indexed documents
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let question = request.question.trim();
    if question.is_empty() {
        return Err(Error::Config("question must not be empty".into()));
    }

    tracing::info!("Query: \"{}\"", question);

    if is_greeting(question) {
        return Ok(Json(QueryResponse::canned(greeting_reply())));
    }

    // Snapshot the session; its lock is not held while the pipeline runs
    let session = request
        .session_id
        .map(|id| state.session(&id))
        .transpose()?;
    let memory_text = session.as_ref().and_then(|s| s.memory_text());
    let source_filter = request
        .source_filter
        .clone()
        .or_else(|| session.as_ref().and_then(|s| s.source_filter.clone()));

    let index = state.index().acquire()?;
    let params = AskParams::from_config(&state.config().retrieval)
        .with_source(source_filter.as_deref())
        .with_memory(memory_text.as_deref());

    let result = state
        .pipeline()
        .answer_question(&*index, question, &params)
        .await?;

    if let Some(id) = request.session_id {
        state.update_session(&id, |s| s.record(question, &result));
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Answered in {}ms (answered: {}, citations: {})",
        processing_time_ms,
        !result.is_no_answer(),
        result.citations.len()
    );

    Ok(Json(QueryResponse::from_result(result, processing_time_ms)))
}
