
use super::{ChunkMetadata, EmbeddingRecord};
use crate::{QaError, config::Config};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    collection: String,
    table_name: String,
    vector_dimension: usize,
    /// Records the table that replaced the collection's own after a failed clear
    active_marker: PathBuf,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

fn db_error(context: &str, e: impl std::fmt::Display) -> QaError {
    QaError::Database(format!("{}: {}", context, e))
}

impl VectorStore {
    /// Open (or create) the collection named in the configuration
    ///
    /// # Arguments
    /// * `config` - Application configuration containing the database path and collection name
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, QaError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(&db_path)
            .map_err(|e| db_error("Failed to create vector database directory", e))?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| db_error("Failed to connect to LanceDB", e))?;

        let collection = config.retrieval.collection.clone();
        let active_marker = db_path.join(format!("{}.active", collection));
        let mut store = Self {
            connection,
            table_name: collection.clone(),
            collection,
            vector_dimension: config.ollama.embedding_dimension as usize,
            active_marker,
        };

        if let Some(active) = read_active_marker(&store.active_marker) {
            if store.table_exists(&active).await? {
                debug!("Using fallback table '{}' recorded by a previous clear", active);
                store.table_name = active;
            } else {
                warn!(
                    "Table '{}' named in {} does not exist, using '{}'",
                    active,
                    store.active_marker.display(),
                    store.table_name
                );
            }
        }

        store.initialize_table().await?;

        info!("Vector store initialized with table '{}'", store.table_name);
        Ok(store)
    }

    /// Name of the table currently backing the collection
    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    /// Open the existing table, or create an empty one with the configured dimension
    async fn initialize_table(&mut self) -> Result<(), QaError> {
        if self.table_exists(&self.table_name).await? {
            debug!("Table '{}' already exists, detecting vector dimension", self.table_name);
            match self.detect_existing_vector_dimension().await {
                Ok(dim) => {
                    self.vector_dimension = dim;
                    info!("Detected existing vector dimension: {}", dim);
                }
                Err(e) => {
                    warn!(
                        "Could not detect vector dimension from existing table: {}",
                        e
                    );
                }
            }
            return Ok(());
        }

        self.create_table(&self.table_name, self.vector_dimension)
            .await
    }

    async fn table_exists(&self, name: &str) -> Result<bool, QaError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| db_error("Failed to list tables", e))?;
        Ok(table_names.iter().any(|t| t == name))
    }

    async fn create_table(&self, name: &str, vector_dim: usize) -> Result<(), QaError> {
        let schema = Self::create_schema(vector_dim);
        self.connection
            .create_empty_table(name, schema)
            .execute()
            .await
            .map_err(|e| db_error("Failed to create table", e))?;

        info!("Table '{}' created with {} dimensions", name, vector_dim);
        Ok(())
    }

    async fn open_table(&self) -> Result<Table, QaError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| db_error("Failed to open table", e))
    }

    /// Detect vector dimension from existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<usize, QaError> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| db_error("Failed to get table schema", e))?;

        schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                QaError::Database("Could not find vector column or determine dimension".to_string())
            })
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    i32::try_from(vector_dim).unwrap_or(i32::MAX),
                ),
                false,
            ),
            Field::new("filename", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("total_chunks", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Store multiple embeddings in a batch
    ///
    /// The first insert with a different vector length recreates the table.
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), QaError> {
        let Some(first) = records.first() else {
            debug!("No embeddings to store");
            return Ok(());
        };

        let vector_dim = first.vector.len();
        if let Some(bad) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(QaError::Database(format!(
                "Embedding {} has {} dimensions, expected {}",
                bad.id,
                bad.vector.len(),
                vector_dim
            )));
        }

        if self.vector_dimension != vector_dim {
            info!(
                "Vector dimension changed from {} to {}, recreating table",
                self.vector_dimension, vector_dim
            );
            self.recreate_table(vector_dim).await?;
        }

        debug!("Storing batch of {} embeddings", records.len());

        let record_batch = self.create_record_batch(&records)?;
        let table = self.open_table().await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| db_error("Failed to insert embeddings", e))?;

        info!("Stored {} embeddings in '{}'", records.len(), self.table_name);
        Ok(())
    }

    async fn recreate_table(&mut self, vector_dim: usize) -> Result<(), QaError> {
        self.reset_table(vector_dim).await?;
        self.vector_dimension = vector_dim;
        Ok(())
    }

    /// Create a RecordBatch from embedding records
    fn create_record_batch(&self, records: &[EmbeddingRecord]) -> Result<RecordBatch, QaError> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut filenames = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut total_chunks = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            filenames.push(record.metadata.filename.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            total_chunks.push(record.metadata.total_chunks);
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            i32::try_from(vector_dim).unwrap_or(i32::MAX),
            Arc::new(values_array),
            None,
        )
        .map_err(|e| db_error("Failed to create vector array", e))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(filenames)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(UInt32Array::from(total_chunks)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| db_error("Failed to create record batch", e))
    }

    /// Search for the nearest embeddings, closest first
    ///
    /// # Arguments
    /// * `query_vector` - The query vector to search for
    /// * `limit` - Maximum number of results to return
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, QaError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self.open_table().await?;
        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| db_error("Failed to create vector search", e))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| db_error("Failed to execute search", e))?;

        let mut search_results = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| db_error("Failed to read result stream", e))?
        {
            search_results.extend(Self::parse_search_batch(&batch)?);
        }

        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, QaError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| QaError::Database(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| QaError::Database(format!("Invalid {} column type", name)))
    }

    fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, QaError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| QaError::Database(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| QaError::Database(format!("Invalid {} column type", name)))
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, QaError> {
        let filenames = Self::string_column(batch, "filename")?;
        let chunk_indices = Self::u32_column(batch, "chunk_index")?;
        let total_chunks = Self::u32_column(batch, "total_chunks")?;
        let contents = Self::string_column(batch, "content")?;
        let created_ats = Self::string_column(batch, "created_at")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let results = (0..batch.num_rows())
            .map(|row| {
                let distance = distances
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                SearchResult {
                    chunk_metadata: ChunkMetadata {
                        filename: filenames.value(row).to_string(),
                        chunk_index: chunk_indices.value(row),
                        total_chunks: total_chunks.value(row),
                        content: contents.value(row).to_string(),
                        created_at: created_ats.value(row).to_string(),
                    },
                    similarity_score: 1.0 - distance,
                    distance,
                }
            })
            .collect();

        Ok(results)
    }

    /// Get the total number of embeddings stored
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64, QaError> {
        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| db_error("Failed to count rows", e))?;

        Ok(count as u64)
    }

    /// Remove every embedding from the collection
    ///
    /// If the table cannot be dropped and recreated, a fresh table named
    /// `<collection>_<8 hex>` takes over and the old one is abandoned.
    #[inline]
    pub async fn clear(&mut self) -> Result<(), QaError> {
        let dimension = self.vector_dimension;
        let reset = self.reset_table(dimension).await;

        match reset {
            Ok(()) => {
                info!("Cleared table '{}'", self.table_name);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Failed to clear table '{}' ({}), switching to a fallback table",
                    self.table_name, e
                );
                self.switch_to_fallback(dimension).await
            }
        }
    }

    /// Create an empty `<collection>_<8 hex>` table and make it the active one
    ///
    /// The choice is persisted so a restart does not reopen the abandoned table.
    async fn switch_to_fallback(&mut self, vector_dim: usize) -> Result<(), QaError> {
        let fallback = fallback_table_name(&self.collection);
        self.create_table(&fallback, vector_dim).await?;
        std::fs::write(&self.active_marker, &fallback)
            .map_err(|e| db_error("Failed to record active table", e))?;

        info!(
            "Switched from table '{}' to '{}'",
            self.table_name, fallback
        );
        self.table_name = fallback;
        Ok(())
    }

    async fn reset_table(&self, vector_dim: usize) -> Result<(), QaError> {
        self.drop_table_if_exists().await?;
        self.create_table(&self.table_name, vector_dim).await
    }

    /// Drop the current table if it exists
    async fn drop_table_if_exists(&self) -> Result<(), QaError> {
        if self.table_exists(&self.table_name).await? {
            info!("Dropping table '{}'", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| db_error("Failed to drop table", e))?;
        }

        Ok(())
    }
}

fn fallback_table_name(collection: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", collection, suffix.get(..8).unwrap_or(&suffix))
}

/// Table name recorded by an earlier fallback, if any
fn read_active_marker(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let name = content.trim();
            (!name.is_empty()).then(|| name.to_string())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}
