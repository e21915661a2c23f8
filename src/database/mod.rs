// Database module
// Embedded LanceDB collection holding chunk vectors and their metadata

pub mod lancedb;

pub use lancedb::{
    ChunkMetadata, EmbeddingRecord,
    vector_store::{SearchResult, VectorStore},
};
