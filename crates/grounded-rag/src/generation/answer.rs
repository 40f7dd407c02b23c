//! Answer generator adapter
//!
//! Wraps a chat model with the fixed grounding contract and turns every
//! call into a tagged outcome. Callers branch on the outcome instead of
//! comparing response text against the no-answer sentence.

use std::time::Duration;

use crate::config::NO_ANSWER;
use crate::providers::{ChatModel, ChatRequest};
use crate::types::Chunk;

use super::prompt::{build_user_message, system_instruction};

/// Why the model produced no usable answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// No response within the configured timeout
    Timeout(Duration),
    /// Transport or API error
    Error(String),
    /// Response was empty after trimming
    Empty,
}

/// How the model declined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decline {
    /// Replied with the no-answer sentence
    Explicit,
    /// Buried the no-answer phrase inside a longer reply
    Hedged,
}

/// Tagged outcome of one answer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Answered(String),
    Declined(Decline),
    Failed(GenerationFailure),
}

impl Generation {
    /// Classify raw model output
    pub fn from_response(raw: &str) -> Self {
        let answer = raw.replace("\\n", "\n");
        let answer = answer.trim();
        if answer.is_empty() {
            return Generation::Failed(GenerationFailure::Empty);
        }
        match classify_decline(answer) {
            Some(decline) => Generation::Declined(decline),
            None => Generation::Answered(answer.to_string()),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().trim_end_matches('.').trim().to_lowercase()
}

/// Case-insensitive, trailing-period-insensitive check for the no-answer sentence
fn classify_decline(answer: &str) -> Option<Decline> {
    let sentinel = normalize(NO_ANSWER);
    if normalize(answer) == sentinel {
        Some(Decline::Explicit)
    } else if answer.to_lowercase().contains(&sentinel) {
        Some(Decline::Hedged)
    } else {
        None
    }
}

/// Generator bound to a chat model, with a hard timeout. Always samples at temperature 0.
pub struct AnswerGenerator<'a> {
    model: &'a dyn ChatModel,
    timeout: Duration,
    system: String,
}

impl<'a> AnswerGenerator<'a> {
    pub fn new(model: &'a dyn ChatModel, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            system: system_instruction(),
        }
    }

    /// Ask the model to answer `question` from `contexts`. Never fails.
    pub async fn generate(&self, question: &str, contexts: &[Chunk]) -> Generation {
        let user = build_user_message(question, contexts);
        let request = ChatRequest {
            system: Some(&self.system),
            user: &user,
            temperature: 0.0,
        };

        tracing::info!(
            "Generating answer with {} ({}) from {} contexts",
            self.model.name(),
            self.model.model(),
            contexts.len()
        );

        match tokio::time::timeout(self.timeout, self.model.complete(request)).await {
            Ok(Ok(raw)) => Generation::from_response(&raw),
            Ok(Err(e)) => {
                tracing::warn!("Answer generation failed: {}", e);
                Generation::Failed(GenerationFailure::Error(e.to_string()))
            }
            Err(_) => {
                tracing::warn!("Answer generation timed out after {:?}", self.timeout);
                Generation::Failed(GenerationFailure::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubChat;

    #[test]
    fn test_exact_sentinel_variants_decline() {
        for raw in [
            NO_ANSWER,
            "it is not explicitly stated in the documents",
            "  IT IS NOT EXPLICITLY STATED IN THE DOCUMENTS.  ",
        ] {
            assert_eq!(
                Generation::from_response(raw),
                Generation::Declined(Decline::Explicit)
            );
        }
    }

    #[test]
    fn test_embedded_sentinel_is_hedging() {
        let raw = "It is not explicitly stated in the documents. However, X is probably Y.";
        assert_eq!(
            Generation::from_response(raw),
            Generation::Declined(Decline::Hedged)
        );
    }

    #[test]
    fn test_plain_answer_and_escaped_newlines() {
        assert_eq!(
            Generation::from_response("  X is defined as Y.\\nSee p.2 "),
            Generation::Answered("X is defined as Y.\nSee p.2".to_string())
        );
    }

    #[test]
    fn test_blank_response_is_failure() {
        assert_eq!(
            Generation::from_response(" \n "),
            Generation::Failed(GenerationFailure::Empty)
        );
    }

    #[tokio::test]
    async fn test_sends_fixed_system_instruction() {
        let model = StubChat::replying("X is defined as Y.");
        let generator = AnswerGenerator::new(&model, Duration::from_secs(5));
        let contexts = vec![Chunk::new("X is defined as Y.", "guide.pdf", Some(0), 1)];

        let outcome = generator.generate("What is X?", &contexts).await;
        assert_eq!(outcome, Generation::Answered("X is defined as Y.".into()));

        let sent = model.last_request().unwrap();
        assert_eq!(sent.system.as_deref(), Some(system_instruction().as_str()));
        assert!(sent.user.contains("What is X?"));
        assert_eq!(sent.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_errors_and_timeouts_become_failures() {
        let contexts = vec![Chunk::new("ctx", "a.pdf", None, 1)];

        let model = StubChat::failing();
        let outcome = AnswerGenerator::new(&model, Duration::from_secs(5))
            .generate("q", &contexts)
            .await;
        assert!(matches!(outcome, Generation::Failed(GenerationFailure::Error(_))));

        let model = StubChat::replying("late").with_delay(Duration::from_millis(200));
        let outcome = AnswerGenerator::new(&model, Duration::from_millis(20))
            .generate("q", &contexts)
            .await;
        assert!(matches!(outcome, Generation::Failed(GenerationFailure::Timeout(_))));
    }
}
