//! Configuration for the grounded RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Sentence returned whenever the documents do not explicitly support an answer.
///
/// This literal is part of the external contract: callers compare against it to
/// suppress citations and to mark unanswered turns in conversational memory.
pub const NO_ANSWER: &str = "It is not explicitly stated in the documents.";

/// Environment variable pointing at a TOML config file
pub const CONFIG_ENV: &str = "GROUNDED_RAG_CONFIG";

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Retrieval and gating parameters
    pub retrieval: RetrievalConfig,
    /// Citation presentation policy
    pub citations: CitationConfig,
    /// Chat / embedding model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Persisted index location
    pub index: IndexConfig,
    /// PDF source folder
    pub ingestion: IngestionConfig,
    /// Conversational memory bounds
    pub memory: MemoryConfig,
    /// Server configuration
    pub server: ServerConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file. Missing sections use defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: RagConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$GROUNDED_RAG_CONFIG` if set, otherwise defaults
    pub fn from_env_or_default() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be > 0".into()));
        }
        if self.retrieval.max_contexts == 0 {
            return Err(Error::Config("retrieval.max_contexts must be > 0".into()));
        }
        let max_distance = self.retrieval.max_distance;
        if max_distance.is_nan() || max_distance < 0.0 {
            return Err(Error::Config(
                "retrieval.max_distance must be a non-negative number".into(),
            ));
        }
        if self.retrieval.oversample == 0 {
            return Err(Error::Config("retrieval.oversample must be > 0".into()));
        }
        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size
        {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

/// Retrieval gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of candidates fetched per search
    pub top_k: usize,
    /// Distance ceiling for the admission gate (lower distance = closer)
    pub max_distance: f32,
    /// Upper bound on chunks handed to the generator
    pub max_contexts: usize,
    /// Over-fetch multiplier used when a source filter is active
    pub oversample: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_distance: 1.1,
            max_contexts: 5,
            oversample: 4,
        }
    }
}

/// How many citations to show for an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    /// Citations for answers up to `short_answer_char_limit` characters
    pub max_sources_short: usize,
    /// Citations for longer answers
    pub max_sources_long: usize,
    pub short_answer_char_limit: usize,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            max_sources_short: 2,
            max_sources_long: 4,
            short_answer_char_limit: 280,
        }
    }
}

impl CitationConfig {
    /// Pick the citation cap for an answer of this length
    pub fn max_sources_for(&self, answer: &str) -> usize {
        if answer.chars().count() <= self.short_answer_char_limit {
            self.max_sources_short
        } else {
            self.max_sources_long
        }
    }
}

/// Which HTTP API the model clients talk to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI (or any OpenAI-compatible endpoint)
    OpenAi,
}

/// Chat and embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// Name of the environment variable holding the API key (OpenAI backend)
    pub api_key_env: String,
    /// Generation model name
    pub chat_model: String,
    /// Embedding model name
    pub embed_model: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            chat_model: "llama3.2:3b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Preset matching the hosted OpenAI models
    pub fn openai() -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (768 for nomic-embed-text, 1536 for text-embedding-3-small)
    pub dimensions: usize,
    /// Texts per embedding request during index builds
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 120,
        }
    }
}

/// Persisted index location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("data"))
            .join("grounded-rag")
            .join("index");
        Self { dir }
    }
}

/// Where the PDFs live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub pdf_dir: PathBuf,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("data/raw_docs"),
        }
    }
}

/// Conversational memory bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Turns kept for query rewriting
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_turns: 4 }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.max_distance, 1.1);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            [retrieval]
            max_distance = 0.8

            [llm]
            backend = "openai"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.max_distance, 0.8);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.chunking.chunk_size, 900);
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_sources_by_answer_length() {
        let citations = CitationConfig::default();
        assert_eq!(citations.max_sources_for("short answer"), 2);
        assert_eq!(citations.max_sources_for(&"x".repeat(281)), 4);
        assert_eq!(citations.max_sources_for(&"x".repeat(280)), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(&path, "[memory]\nmax_turns = 2\n").unwrap();

        let config = RagConfig::load(&path).unwrap();
        assert_eq!(config.memory.max_turns, 2);
    }
}
