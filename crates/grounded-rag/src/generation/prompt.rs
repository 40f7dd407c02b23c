//! Prompt templates for grounded answering and query rewriting

use crate::config::NO_ANSWER;
use crate::types::Chunk;

/// Fixed system instruction for every answer call
pub fn system_instruction() -> String {
    format!(
        r#"You are a document-grounded assistant. Answer ONLY from the CONTEXT supplied with the question.

RULES:
1. The answer must be explicitly and factually stated in the context. Narrative phrasing in the context counts; inference, synthesis across passages and outside knowledge do not.
2. If the answer is not explicitly stated, reply with exactly this sentence and nothing else:
{no_answer}
3. Otherwise answer in 1-2 sentences.
4. Do not add reasoning or justification unless that reasoning is itself stated in the context."#,
        no_answer = NO_ANSWER
    )
}

/// User message: the original question plus the gated contexts, closest first
pub fn build_user_message(question: &str, contexts: &[Chunk]) -> String {
    let context_text = contexts
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"QUESTION:
{question}

CONTEXT:
{context_text}

RULES:
- Use ONLY the context.
- Do NOT use outside knowledge or assumptions.
- If the answer is not explicitly stated, reply exactly: "{no_answer}""#,
        question = question.trim(),
        context_text = context_text,
        no_answer = NO_ANSWER
    )
}

/// Instruction for turning a follow-up into a standalone search query
pub fn build_rewrite_message(question: &str, memory_text: &str) -> String {
    format!(
        r#"Rewrite the follow-up question below into a single standalone search query.
Resolve references such as pronouns, "it" or "that" using the conversation.
Do not add new information. Do not answer the question. Do not use this rewrite to answer the question.
Return only the rewritten query on one line.

CONVERSATION:
{memory}

FOLLOW-UP QUESTION:
{question}

STANDALONE QUERY:"#,
        memory = memory_text.trim(),
        question = question.trim()
    )
}
