//! In-memory stand-ins for the model and index seams, shared by unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::providers::{ChatModel, ChatRequest, EmbeddingProvider};
use crate::types::{Chunk, ScoredChunk};

/// Build a scored chunk in one line
pub fn scored(text: &str, source: &str, page: Option<u32>, distance: f32) -> ScoredChunk {
    ScoredChunk::new(Chunk::new(text, source, page, 1), distance)
}

/// Hash-derived embeddings: identical text maps to identical vectors
#[derive(Default)]
pub struct StubEmbedder {
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub const DIMENSIONS: usize = 8;

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let digest = Sha256::digest(text.as_bytes());
        Ok(digest
            .iter()
            .take(Self::DIMENSIONS)
            .map(|b| f32::from(*b) / 255.0)
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-embed"
    }
}

/// One request a `StubChat` received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
}

/// Chat model that replays canned replies in order; the last one repeats
pub struct StubChat {
    replies: Mutex<Vec<std::result::Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubChat {
    pub fn scripted(replies: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::scripted(vec![Ok(reply.to_string())])
    }

    pub fn failing() -> Self {
        Self::scripted(vec![Err("stub model offline".to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Every request received, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn next_reply(&self) -> std::result::Result<String, String> {
        let mut replies = self.replies.lock();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies
                .first()
                .cloned()
                .unwrap_or_else(|| Err("no scripted reply".to_string()))
        }
    }
}

#[async_trait]
impl ChatModel for StubChat {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(RecordedRequest {
            system: request.system.map(str::to_string),
            user: request.user.to_string(),
            temperature: request.temperature,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply().map_err(Error::llm)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-chat"
    }
}

/// Index returning fixed results, optionally per query text
pub struct StubIndex {
    default: Vec<ScoredChunk>,
    by_query: HashMap<String, Vec<ScoredChunk>>,
    fail: bool,
    requests: Mutex<Vec<(String, usize)>>,
}

impl StubIndex {
    /// Returns the first `k` entries in the given order for every query
    pub fn new(results: Vec<ScoredChunk>) -> Self {
        Self {
            default: results,
            by_query: HashMap::new(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every search fails the way an unreachable embedding service does
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_query(mut self, query: &str, results: Vec<ScoredChunk>) -> Self {
        self.by_query.insert(query.to_string(), results);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requests.lock().iter().map(|(_, k)| *k).collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(q, _)| q.clone()).collect()
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.requests.lock().push((query.to_string(), k));
        if self.fail {
            return Err(Error::embedding("stub index offline"));
        }
        let results = self.by_query.get(query).unwrap_or(&self.default);
        Ok(results.iter().take(k).cloned().collect())
    }

    fn len(&self) -> usize {
        self.default.len() + self.by_query.values().map(Vec::len).sum::<usize>()
    }
}
