//! Response types for RAG queries

use serde::{Deserialize, Serialize};

use crate::config::NO_ANSWER;

/// Final outcome of one question. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagResult {
    /// Generated answer, or the no-answer sentence
    pub answer: String,
    /// `source | p.N` strings, unique, in context order
    pub citations: Vec<String>,
}

impl RagResult {
    pub(crate) fn answered(answer: String, citations: Vec<String>) -> Self {
        Self { answer, citations }
    }

    /// The safe result: sentinel answer, no citations
    pub fn no_answer() -> Self {
        Self {
            answer: NO_ANSWER.to_string(),
            citations: Vec::new(),
        }
    }

    /// True when this is the sentinel result
    pub fn is_no_answer(&self) -> bool {
        self.answer == NO_ANSWER
    }
}

/// Response from the HTTP query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub citations: Vec<String>,
    /// False when the answer is the no-answer sentence
    pub answered: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    pub fn from_result(result: RagResult, processing_time_ms: u64) -> Self {
        let answered = !result.is_no_answer();
        Self {
            // Citations are never shown next to the sentinel
            citations: if answered { result.citations } else { Vec::new() },
            answer: result.answer,
            answered,
            processing_time_ms,
        }
    }

    /// Canned reply that did not go through retrieval (greetings)
    pub fn canned(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            citations: Vec::new(),
            answered: true,
            processing_time_ms: 0,
        }
    }
}
