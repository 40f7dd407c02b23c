//! Answer generation with the grounding contract and citation handling

pub mod answer;
pub mod citation;
pub mod prompt;

pub use answer::{AnswerGenerator, Decline, Generation, GenerationFailure};
pub use citation::build_citations;
