//! Document ingestion: PDF pages in, chunks out

mod chunker;
mod loader;

pub use chunker::{TextChunker, DEFAULT_SEPARATORS};
pub use loader::{clean_text, list_pdfs, load_pdfs, PageText};

use crate::config::RagConfig;
use crate::error::Result;
use crate::types::Chunk;

/// Split pages into overlapping chunks with per-source numbering
pub fn chunk_pages(pages: &[PageText], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    TextChunker::new(chunk_size, chunk_overlap).chunk_pages(pages)
}

/// Load and chunk every PDF in the configured folder
pub fn load_corpus(config: &RagConfig) -> Result<Vec<Chunk>> {
    let pages = load_pdfs(&config.ingestion.pdf_dir)?;
    let chunks = chunk_pages(
        &pages,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );
    tracing::info!(
        "Ingested {} pages into {} chunks from {}",
        pages.len(),
        chunks.len(),
        config.ingestion.pdf_dir.display()
    );
    Ok(chunks)
}
