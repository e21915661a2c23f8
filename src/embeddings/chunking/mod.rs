
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;

/// A chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text
    pub text: String,
    /// File name of the source document
    pub filename: String,
    /// Position of this chunk within its document, starting at 0
    pub chunk_index: usize,
    /// Number of chunks produced from the source document
    pub total_chunks: usize,
}

/// Sliding window configuration, measured in whitespace-separated words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared by adjacent chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Build a window configuration, rejecting windows that cannot advance
    #[inline]
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(chunk_size));
        }
        if overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Number of words the window advances between chunks
    #[inline]
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}

/// Split text into overlapping word windows
///
/// Windows hold `chunk_size` words and start every `stride()` words. The last
/// window is the first one that reaches the final word, so it may be shorter.
#[inline]
pub fn split_text_into_chunks(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let chunk_size = config.chunk_size.max(1);
    let stride = config.stride();
    let mut chunks = Vec::with_capacity(words.len().div_ceil(stride));
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += stride;
    }

    chunks
}

/// Chunk one document and attach positional metadata
#[inline]
pub fn chunk_document(filename: &str, text: &str, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    let pieces = split_text_into_chunks(text, config);
    let total_chunks = pieces.len();

    debug!(
        "Chunked '{}' into {} chunks (size {}, overlap {})",
        filename, total_chunks, config.chunk_size, config.overlap
    );

    pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| DocumentChunk {
            text,
            filename: filename.to_string(),
            chunk_index,
            total_chunks,
        })
        .collect()
}
