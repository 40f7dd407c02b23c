//! Follow-up question rewriting
//!
//! Turns "what about its side effects?" into a standalone retrieval query
//! using recent conversation turns. The rewrite only steers retrieval; the
//! original question is what the answer generator sees.

use std::time::Duration;

use crate::generation::prompt::build_rewrite_message;
use crate::guard::InjectionGuard;
use crate::providers::{ChatModel, ChatRequest};

/// Longest rewrite accepted, in characters
pub const MAX_REWRITE_CHARS: usize = 250;

/// Best-effort rewriter: every failure falls back to the original question
pub struct QueryRewriter<'a> {
    model: &'a dyn ChatModel,
    guard: &'a dyn InjectionGuard,
    timeout: Duration,
}

impl<'a> QueryRewriter<'a> {
    pub fn new(model: &'a dyn ChatModel, guard: &'a dyn InjectionGuard, timeout: Duration) -> Self {
        Self {
            model,
            guard,
            timeout,
        }
    }

    /// Standalone retrieval query for `question` given `memory_text`.
    ///
    /// Blank memory returns the question untouched without calling the model.
    pub async fn rewrite(&self, question: &str, memory_text: &str) -> String {
        if memory_text.trim().is_empty() {
            return question.to_string();
        }

        let message = build_rewrite_message(question, memory_text);
        let request = ChatRequest {
            system: None,
            user: &message,
            temperature: 0.0,
        };

        let raw = match tokio::time::timeout(self.timeout, self.model.complete(request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!("Rewrite failed, using original question: {}", e);
                return question.to_string();
            }
            Err(_) => {
                tracing::warn!(
                    "Rewrite timed out after {:?}, using original question",
                    self.timeout
                );
                return question.to_string();
            }
        };

        match self.validate(&raw) {
            Some(rewritten) => {
                tracing::info!("Rewrote query: {:?} -> {:?}", question, rewritten);
                rewritten
            }
            None => question.to_string(),
        }
    }

    fn validate(&self, raw: &str) -> Option<String> {
        let candidate = raw.trim().trim_matches('"').trim();
        if candidate.is_empty() {
            tracing::warn!("Rewrite rejected: empty");
            return None;
        }
        if candidate.chars().count() > MAX_REWRITE_CHARS {
            tracing::warn!("Rewrite rejected: longer than {} chars", MAX_REWRITE_CHARS);
            return None;
        }
        if self.guard.is_suspicious(candidate) {
            tracing::warn!("Rewrite rejected: flagged by injection guard");
            return None;
        }
        Some(candidate.to_string())
    }
}
