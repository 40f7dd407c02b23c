//! Error types for the grounded RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error (corrupt or inconsistent index)
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Index missing, not yet built, or being rebuilt
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// Unknown chat session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Chat model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// External call exceeded its deadline
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an index-unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::IndexUnavailable(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Serving outages: the question cannot be answered because a
    /// dependency is down, not because the documents lack the answer.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_)
                | Error::VectorDb(_)
                | Error::IndexUnavailable(_)
                | Error::Timeout(_)
                | Error::Io(_)
                | Error::Http(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::FileParse { filename, message } => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("Failed to parse '{}': {}", filename, message),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Toml(err) => (StatusCode::BAD_REQUEST, "config_error", err.to_string()),
            Error::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Session not found: {}", id),
            ),
            Error::Llm(msg) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error", msg.clone()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            // Everything else is an outage of the retrieval stack
            other => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                other.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_classification() {
        assert!(Error::unavailable("rebuilding").is_infrastructure());
        assert!(Error::embedding("connection refused").is_infrastructure());
        assert!(Error::Timeout(30).is_infrastructure());
        assert!(!Error::llm("rate limited").is_infrastructure());
        assert!(!Error::Config("bad".into()).is_infrastructure());
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let response = Error::unavailable("index is being rebuilt").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
