// Documents module
// Walks the document folder, extracts text and cuts it into chunks

pub mod extractor;


use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::embeddings::chunking::{ChunkingConfig, DocumentChunk, chunk_document};
use crate::{QaError, Result};

pub use extractor::{FileKind, IgnoreReason, TEXT_EXTENSIONS, classify};

/// Turns a folder of documents into chunks
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    docs_folder: PathBuf,
    chunking: ChunkingConfig,
}

/// What happened to a single file during ingest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Indexed { chunks: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Result of one pass over the document folder
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Chunks in file discovery order, then window order
    pub chunks: Vec<DocumentChunk>,
    pub files: Vec<FileReport>,
}

/// Counts reported to callers of update and warmup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub chunks: usize,
}

impl IngestReport {
    #[inline]
    pub fn summary(&self) -> IngestSummary {
        let mut summary = IngestSummary {
            chunks: self.chunks.len(),
            ..IngestSummary::default()
        };
        for file in &self.files {
            match file.outcome {
                FileOutcome::Indexed { .. } => summary.files_indexed += 1,
                FileOutcome::Skipped { .. } => summary.files_skipped += 1,
                FileOutcome::Failed { .. } => summary.files_failed += 1,
            }
        }
        summary
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl DocumentProcessor {
    #[inline]
    pub fn new(docs_folder: impl Into<PathBuf>, chunking: ChunkingConfig) -> Self {
        Self {
            docs_folder: docs_folder.into(),
            chunking,
        }
    }

    #[inline]
    pub fn docs_folder(&self) -> &Path {
        &self.docs_folder
    }

    /// Process every supported file below the documents folder
    ///
    /// Per-file problems are recorded in the report and never abort the run.
    /// A missing folder is an error.
    #[inline]
    pub fn process_documents(&self) -> Result<IngestReport> {
        if !self.docs_folder.is_dir() {
            return Err(QaError::DocumentsNotFound(self.docs_folder.clone()));
        }

        info!("Processing documents in {}", self.docs_folder.display());

        let mut report = IngestReport::default();

        for entry in WalkDir::new(&self.docs_folder).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    error!("Failed to walk documents folder: {}", e);
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    report.files.push(FileReport {
                        path,
                        outcome: FileOutcome::Failed {
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let outcome = self.process_file(path, &mut report.chunks);
            report.files.push(FileReport {
                path: path.to_path_buf(),
                outcome,
            });
        }

        let summary = report.summary();
        info!(
            "Total chunks processed: {} ({} files indexed, {} skipped, {} failed)",
            summary.chunks, summary.files_indexed, summary.files_skipped, summary.files_failed
        );

        Ok(report)
    }

    fn process_file(&self, path: &Path, chunks: &mut Vec<DocumentChunk>) -> FileOutcome {
        let content = match classify(path) {
            FileKind::Ignored(reason) => {
                debug!("Skipping {}: {}", path.display(), reason.describe());
                return FileOutcome::Skipped {
                    reason: reason.describe().to_string(),
                };
            }
            FileKind::Text => extractor::read_text_file(path),
            FileKind::Pdf => extractor::extract_pdf_text(path),
        };

        let content = match content {
            Ok(content) => content,
            Err(e) => {
                error!("Error reading {}: {:#}", path.display(), e);
                return FileOutcome::Failed {
                    error: format!("{:#}", e),
                };
            }
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_chunks = chunk_document(&filename, &content, &self.chunking);

        if file_chunks.is_empty() {
            warn!("No text extracted from {}", path.display());
            return FileOutcome::Skipped {
                reason: "no extractable text".to_string(),
            };
        }

        info!("Created {} chunks from {}", file_chunks.len(), filename);
        let count = file_chunks.len();
        chunks.extend(file_chunks);
        FileOutcome::Indexed { chunks: count }
    }
}
