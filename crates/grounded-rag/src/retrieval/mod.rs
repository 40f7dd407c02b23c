//! Retrieval: query rewriting, similarity search and the context gate

pub mod gate;
pub mod retriever;
pub mod rewrite;

pub use gate::select_contexts;
pub use retriever::Retriever;
pub use rewrite::QueryRewriter;
