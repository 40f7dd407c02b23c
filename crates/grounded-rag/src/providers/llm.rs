//! Chat model trait used for query rewriting and answer generation

use async_trait::async_trait;
use crate::error::Result;

/// One chat completion request
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// System instruction, if any
    pub system: Option<&'a str>,
    /// User message
    pub user: &'a str,
    pub temperature: f32,
}

/// Trait for chat-style language models
///
/// Implementations:
/// - `OllamaClient`: Local Ollama server (llama3.2, phi3, ...)
/// - `OpenAiClient`: OpenAI chat completions (gpt-4o-mini)
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run a single completion and return the raw text
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
