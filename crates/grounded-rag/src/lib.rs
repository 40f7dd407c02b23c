//! grounded-rag: document-grounded question answering over private PDFs
//!
//! Answers come only from retrieved document text. A distance gate decides
//! whether the corpus has relevant material at all; when it does not, or the
//! model declines, the fixed sentence [`config::NO_ANSWER`] is returned with no
//! citations. Follow-up questions are rewritten into standalone retrieval
//! queries from caller-held conversation memory.

pub mod config;
pub mod error;
pub mod generation;
pub mod guard;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::{RagConfig, NO_ANSWER};
pub use error::{Error, Result};
pub use pipeline::{AskParams, NoAnswerReason, QaOutcome, QaPipeline};
pub use types::{Chunk, QueryRequest, QueryResponse, RagResult, ScoredChunk};
