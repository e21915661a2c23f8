// Service module
// The request operations shared by the HTTP server and the CLI


use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Config, Credentials, RetrievalConfig};
use crate::database::SearchResult;
use crate::documents::{DocumentProcessor, IngestReport, IngestSummary};
use crate::embeddings::{Embedder, OllamaClient};
use crate::indexer::DocumentIndex;
use crate::qa::{AnswerGenerator, ChatModel, OpenAiClient, prepare_context};
use crate::{QaError, Result};

/// An answer and how long it took to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub elapsed: Duration,
}

/// Result of re-ingesting the documents folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub summary: IngestSummary,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupStatus {
    Complete { chunks: usize },
    NoDocuments,
    AlreadyReady { count: u64 },
}

impl WarmupStatus {
    #[inline]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "warmup_complete",
            Self::NoDocuments => "no_documents",
            Self::AlreadyReady { .. } => "already_ready",
        }
    }

    #[inline]
    pub fn message(&self) -> String {
        match self {
            Self::Complete { chunks } => format!("Processed {} document chunks", chunks),
            Self::NoDocuments => "No documents found in the Documents folder".to_string(),
            Self::AlreadyReady { count } => {
                format!("Vector store already contains {} documents", count)
            }
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::NoDocuments)
    }
}

impl Serialize for WarmupStatus {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("WarmupStatus", 3)?;
        state.serialize_field("status", self.status())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("ready", &self.is_ready())?;
        state.end()
    }
}

/// Document QA over one folder and one vector collection
pub struct QaService {
    processor: DocumentProcessor,
    index: DocumentIndex,
    generator: AnswerGenerator,
    retrieval: RetrievalConfig,
    ingest_lock: Mutex<()>,
}

impl QaService {
    /// Build the service with the Ollama embedder and the OpenAI chat model
    #[inline]
    pub async fn new(config: &Config, credentials: &Credentials) -> Result<Self> {
        let embedder = OllamaClient::new(config)
            .map_err(|e| QaError::Config(format!("Failed to initialize Ollama client: {:#}", e)))?;
        let chat_model = OpenAiClient::new(&config.completion, credentials)
            .map_err(|e| QaError::Config(e.to_string()))?;

        Self::with_components(config, Arc::new(embedder), Arc::new(chat_model)).await
    }

    /// Build the service around caller-provided models
    #[inline]
    pub async fn with_components(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| QaError::Config(e.to_string()))?;

        let index = DocumentIndex::new(config, embedder).await?;

        Ok(Self {
            processor: DocumentProcessor::new(config.documents.folder.clone(), config.chunking),
            index,
            generator: AnswerGenerator::new(chat_model, &config.completion),
            retrieval: config.retrieval.clone(),
            ingest_lock: Mutex::new(()),
        })
    }

    #[inline]
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Answer a question from the indexed documents
    ///
    /// An empty index is filled first; an empty folder is `QaError::NoDocuments`.
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let start = Instant::now();
        info!("Processing question: {}", question);

        self.ensure_indexed().await?;

        let results = self.index.search(question, self.retrieval.n_results).await;
        let context = prepare_context(
            &results,
            self.retrieval.context_chunks,
            self.retrieval.max_chunk_chars,
        );
        let answer = self.generator.generate_answer(question, &context).await;

        let elapsed = start.elapsed();
        info!("Question processed in {:.2} seconds", elapsed.as_secs_f64());
        Ok(Answer { answer, elapsed })
    }

    /// Clear the index and ingest the documents folder again
    #[inline]
    pub async fn update(&self) -> Result<UpdateOutcome> {
        let start = Instant::now();
        info!("Starting document update");

        let _guard = self.ingest_lock.lock().await;
        self.index.clear().await?;
        let report = self.process_folder().await?;
        self.index.add_documents(&report.chunks).await?;

        let elapsed = start.elapsed();
        info!("Documents updated in {:.2} seconds", elapsed.as_secs_f64());
        Ok(UpdateOutcome {
            summary: report.summary(),
            elapsed,
        })
    }

    /// Make sure the index is populated before the first question
    #[inline]
    pub async fn warmup(&self) -> Result<WarmupStatus> {
        info!("Warmup requested");

        match self.ensure_indexed().await {
            Ok(Some(summary)) => Ok(WarmupStatus::Complete {
                chunks: summary.chunks,
            }),
            Ok(None) => Ok(WarmupStatus::AlreadyReady {
                count: self.index.count().await?,
            }),
            Err(QaError::NoDocuments) => Ok(WarmupStatus::NoDocuments),
            Err(e) => Err(e),
        }
    }

    /// Search results and the context assembled from them
    #[inline]
    pub async fn retrieve_context(&self, question: &str, n: usize) -> (Vec<SearchResult>, String) {
        let results = self.index.search(question, n).await;
        let context = prepare_context(&results, n, self.retrieval.max_chunk_chars);
        (results, context)
    }

    #[inline]
    pub async fn answer(&self, question: &str, context: &str) -> String {
        self.generator.generate_answer(question, context).await
    }

    /// Fill an empty index; `Some` when an ingest ran
    async fn ensure_indexed(&self) -> Result<Option<IngestSummary>> {
        if !self.index.is_empty().await {
            return Ok(None);
        }

        let _guard = self.ingest_lock.lock().await;
        // Another request may have finished ingesting while we waited
        if !self.index.is_empty().await {
            return Ok(None);
        }

        info!("Index is empty, processing documents");
        let report = self.process_folder().await?;
        if report.is_empty() {
            return Err(QaError::NoDocuments);
        }

        self.index.add_documents(&report.chunks).await?;
        let summary = report.summary();
        info!("Added {} document chunks", summary.chunks);
        Ok(Some(summary))
    }

    async fn process_folder(&self) -> Result<IngestReport> {
        let processor = self.processor.clone();
        tokio::task::spawn_blocking(move || processor.process_documents())
            .await
            .map_err(|e| QaError::Other(anyhow::anyhow!("Document processing task failed: {}", e)))?
    }
}
