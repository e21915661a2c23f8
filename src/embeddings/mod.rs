// Embeddings module
// Word-window chunking and the embedding model behind the vector index

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, DocumentChunk, chunk_document, split_text_into_chunks};
pub use ollama::OllamaClient;

/// Turns text into vectors comparable by distance
///
/// Implementations block; async callers run them on the blocking pool.
pub trait Embedder: Send + Sync {
    /// Embed every text, returning one vector per input in the same order
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
