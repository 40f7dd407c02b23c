//! Application state for the RAG server

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::guard::{InjectionGuard, PatternGuard};
use crate::index::IndexHandle;
use crate::pipeline::QaPipeline;
use crate::providers::{self, ChatModel};
use crate::session::ChatSession;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    /// Current index snapshot and rebuild coordination
    index: Arc<IndexHandle>,
    /// Chat model, kept for health checks
    chat: Arc<dyn ChatModel>,
    pipeline: QaPipeline,
    /// Conversation state per client; the pipeline itself keeps none
    sessions: DashMap<Uuid, ChatSession>,
}

impl AppState {
    /// Build providers from config and load the persisted index if there is one
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (backend: {:?})...",
            config.llm.backend
        );

        let (embedder, chat) = providers::from_config(&config.llm)?;

        let index = Arc::new(IndexHandle::new(config.index.dir.clone(), embedder));
        match index.load_if_present() {
            Ok(true) => tracing::info!("Index loaded from {}", config.index.dir.display()),
            Ok(false) => tracing::warn!("Index not built yet; POST /api/index/rebuild to build it"),
            Err(e) => tracing::error!("Failed to load index: {}", e),
        }

        Ok(Self::from_parts(
            config,
            index,
            chat,
            Arc::new(PatternGuard::default()),
        ))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: RagConfig,
        index: Arc<IndexHandle>,
        chat: Arc<dyn ChatModel>,
        guard: Arc<dyn InjectionGuard>,
    ) -> Self {
        let pipeline = QaPipeline::new(
            Arc::clone(&chat),
            guard,
            config.retrieval.oversample,
            config.citations.clone(),
            config.llm.timeout(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                chat,
                pipeline,
                sessions: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.inner.index
    }

    pub fn chat(&self) -> &Arc<dyn ChatModel> {
        &self.inner.chat
    }

    pub fn pipeline(&self) -> &QaPipeline {
        &self.inner.pipeline
    }

    /// Check if the server can answer questions
    pub fn is_ready(&self) -> bool {
        self.inner.index.is_ready()
    }

    /// Start a session and return its id
    pub fn create_session(&self, source_filter: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let session = ChatSession::new(self.inner.config.memory.max_turns).with_source(source_filter);
        self.inner.sessions.insert(id, session);
        tracing::debug!("Created session {}", id);
        id
    }

    pub fn remove_session(&self, id: &Uuid) -> Result<()> {
        self.inner
            .sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Copy of a session, so no map lock is held across awaits
    pub fn session(&self, id: &Uuid) -> Result<ChatSession> {
        self.inner
            .sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Apply `f` to a session if it still exists
    pub fn update_session(&self, id: &Uuid, f: impl FnOnce(&mut ChatSession)) {
        if let Some(mut session) = self.inner.sessions.get_mut(id) {
            f(&mut session);
        }
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}
