//! Conversation state owned by the caller
//!
//! The pipeline is stateless; front ends keep a `ChatSession` per user and
//! pass its rendered memory into each question.

use std::collections::VecDeque;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::RagResult;

/// Assistant text stored in memory for turns that had no answer
pub const NO_ANSWER_MARKER: &str = "(no answer in documents)";

/// One question and what the assistant said back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

/// Sliding window over the most recent turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    max_turns: usize,
    turns: VecDeque<Turn>,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            turns: VecDeque::with_capacity(max_turns),
        }
    }

    /// Record a finished question, dropping the oldest turn past the limit
    pub fn push(&mut self, question: &str, result: &RagResult) {
        if self.max_turns == 0 {
            return;
        }
        let assistant = if result.is_no_answer() {
            NO_ANSWER_MARKER.to_string()
        } else {
            result.answer.trim().to_string()
        };
        self.turns.push_back(Turn {
            user: question.trim().to_string(),
            assistant,
        });
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// `User: ...` / `Assistant: ...` lines, oldest first; empty with no turns
    pub fn to_memory_text(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("User: {}\nAssistant: {}", t.user, t.assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Per-user conversation: memory plus an optional document restriction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub memory: ConversationMemory,
    pub source_filter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(max_turns: usize) -> Self {
        let now = Utc::now();
        Self {
            memory: ConversationMemory::new(max_turns),
            source_filter: None,
            created_at: now,
            last_active: now,
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source_filter = source.filter(|s| !s.trim().is_empty());
        self
    }

    /// Memory text for the rewriter, `None` when there is no history
    pub fn memory_text(&self) -> Option<String> {
        if self.memory.is_empty() {
            None
        } else {
            Some(self.memory.to_memory_text())
        }
    }

    pub fn record(&mut self, question: &str, result: &RagResult) {
        self.memory.push(question, result);
        self.last_active = Utc::now();
    }
}

fn greeting_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)^\s*(hi|hello|hey|pershendetje|përshëndetje|tung|tungjatjeta)[\s!?.،,;:~\-–—_()"'🙂🙋😊👋♀♂\x{200D}\x{FE0F}]*\s*$"#,
        )
        .expect("valid regex")
    })
}

/// True for greeting-only messages, which never reach the pipeline
pub fn is_greeting(text: &str) -> bool {
    greeting_pattern().is_match(text)
}

/// Fixed reply to a greeting
pub fn greeting_reply() -> &'static str {
    "Hi! 👋\n\
     Ask me something from your PDFs.\n\n\
     Example:\n\
     - What are the main use-cases of ML in operating room management?\n\
     - Which algorithms are commonly used (e.g., XGBoost, Random Forest)?"
}
