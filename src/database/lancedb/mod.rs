// LanceDB vector database module
// Handles vector storage and similarity search for document chunks


pub mod vector_store;

use serde::{Deserialize, Serialize};

use crate::embeddings::chunking::DocumentChunk;

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding, sized by the embedding model
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Base name of the source file
    pub filename: String,
    /// Position of this chunk within its file
    pub chunk_index: u32,
    /// Number of chunks the file produced
    pub total_chunks: u32,
    /// The chunk text
    pub content: String,
    /// Timestamp when this embedding was created
    pub created_at: String,
}

impl ChunkMetadata {
    /// Build metadata for a chunk, stamped with the given creation time
    #[inline]
    pub fn from_chunk(chunk: &DocumentChunk, created_at: impl Into<String>) -> Self {
        Self {
            filename: chunk.filename.clone(),
            chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
            total_chunks: u32::try_from(chunk.total_chunks).unwrap_or(u32::MAX),
            content: chunk.text.clone(),
            created_at: created_at.into(),
        }
    }
}
