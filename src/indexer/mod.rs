// Indexer module
// Embeds document chunks into the vector store and answers similarity queries

pub mod cache;


use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::database::{ChunkMetadata, EmbeddingRecord, SearchResult, VectorStore};
use crate::embeddings::Embedder;
use crate::embeddings::chunking::DocumentChunk;
use crate::{QaError, Result};

pub use cache::QueryCache;

/// Vector index over document chunks with a memoized search path
pub struct DocumentIndex {
    embedder: Arc<dyn Embedder>,
    store: RwLock<VectorStore>,
    cache: QueryCache,
    batch_size: usize,
}

impl DocumentIndex {
    /// Open the configured collection
    #[inline]
    pub async fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = VectorStore::new(config).await?;

        Ok(Self {
            embedder,
            store: RwLock::new(store),
            cache: QueryCache::new(config.retrieval.cache_capacity),
            batch_size: (config.ollama.batch_size as usize).max(1),
        })
    }

    /// Embed on the blocking pool
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed(&texts))
            .await
            .map_err(|e| QaError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| QaError::Embedding(format!("{:#}", e)))
    }

    /// Embed and store chunks, returning how many were added
    #[inline]
    pub async fn add_documents(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            debug!("No chunks to add");
            return Ok(0);
        }

        let mut added = 0;
        for batch in chunks.chunks(self.batch_size) {
            let texts = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.embed(texts).await?;
            if vectors.len() != batch.len() {
                return Err(QaError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            let created_at = Utc::now().to_rfc3339();
            let records = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddingRecord {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    metadata: ChunkMetadata::from_chunk(chunk, created_at.as_str()),
                })
                .collect();

            self.store
                .write()
                .await
                .store_embeddings_batch(records)
                .await?;
            added += batch.len();
            debug!("Indexed {}/{} chunks", added, chunks.len());
        }

        // New content can change the answer to any cached query
        self.cache.invalidate();

        info!("Added {} chunks to the index", added);
        Ok(added)
    }

    /// The `n` nearest chunks to `query`, closest first
    ///
    /// Failures are logged and yield no results; they are never cached.
    #[inline]
    pub async fn search(&self, query: &str, n: usize) -> Vec<SearchResult> {
        if let Some(hit) = self.cache.get(query, n) {
            debug!("Query cache hit for '{}'", query);
            return hit;
        }

        let generation = self.cache.generation();
        match self.search_uncached(query, n).await {
            Ok(results) => {
                if !self.cache.insert(generation, query, n, results.clone()) {
                    debug!("Index changed during search, not caching '{}'", query);
                }
                results
            }
            Err(e) => {
                warn!("Search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn search_uncached(&self, query: &str, n: usize) -> Result<Vec<SearchResult>> {
        let mut vectors = self.embed(vec![query.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| QaError::Embedding("No embedding returned for query".to_string()))?;

        self.store.read().await.search_similar(&vector, n).await
    }

    /// Remove every chunk and drop all cached results
    #[inline]
    pub async fn clear(&self) -> Result<()> {
        let mut store = self.store.write().await;
        let result = store.clear().await;
        self.cache.invalidate();
        drop(store);
        result
    }

    #[inline]
    pub async fn count(&self) -> Result<u64> {
        self.store.read().await.count_embeddings().await
    }

    /// Whether the index holds no chunks; an unreadable index counts as empty
    #[inline]
    pub async fn is_empty(&self) -> bool {
        match self.count().await {
            Ok(count) => count == 0,
            Err(e) => {
                warn!("Failed to count indexed chunks: {}", e);
                true
            }
        }
    }

    /// Name of the table currently backing the collection
    #[inline]
    pub async fn table_name(&self) -> String {
        self.store.read().await.table_name().to_string()
    }
}
