//! Provider abstractions for embeddings and chat models
//!
//! Trait-based so the pipeline can run against a local Ollama server,
//! the OpenAI API, or test stubs.

pub mod embedding;
mod http;
pub mod llm;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatModel, ChatRequest};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;

/// Build the embedding provider and chat model selected by config
pub fn from_config(
    config: &LlmConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn ChatModel>)> {
    match config.backend {
        LlmBackend::Ollama => {
            tracing::info!(
                "Using Ollama at {} (chat: {}, embeddings: {})",
                config.base_url,
                config.chat_model,
                config.embed_model
            );
            let client = Arc::new(OllamaClient::new(config)?);
            Ok((client.clone(), client))
        }
        LlmBackend::OpenAi => {
            tracing::info!(
                "Using OpenAI-compatible API at {} (chat: {}, embeddings: {})",
                config.base_url,
                config.chat_model,
                config.embed_model
            );
            let client = Arc::new(OpenAiClient::new(config)?);
            Ok((client.clone(), client))
        }
    }
}
