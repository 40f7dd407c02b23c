//! Ollama client implementing both the chat and embedding provider traits

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::http::{build_client, check_status, retry_request};
use super::llm::{ChatModel, ChatRequest};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct EmbedBody {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            embed_model: config.embed_model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String> {
        let url = self.url("/api/chat");
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.user.to_string(),
        });
        let body = ChatBody {
            model: self.chat_model.clone(),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
            },
        };

        tracing::debug!("Ollama chat with model: {}", self.chat_model);

        let (client, url, body) = (&self.client, &url, &body);
        retry_request(self.max_retries, || async move {
            let response = client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| Error::llm(format!("Chat request failed: {}", e)))?;
            let response = check_status(response, "Chat").await?;
            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse chat response: {}", e)))?;
            Ok(parsed.message.content)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.url("/api/embeddings");
        let body = EmbedBody {
            model: self.embed_model.clone(),
            prompt: text.to_string(),
        };

        let (client, url, body) = (&self.client, &url, &body);
        retry_request(self.max_retries, || async move {
            let response = client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }
            let parsed: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;
            Ok(parsed.embedding)
        })
        .await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.embed_model
    }
}
