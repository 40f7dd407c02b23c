//! Core types for the RAG system

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{Chunk, ScoredChunk};
pub use query::{QueryRequest, RetrievalQuery};
pub use response::{QueryResponse, RagResult};
