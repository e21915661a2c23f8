//! Test doubles shared by the integration tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use docs_qa::config::{Config, DocumentsConfig, OllamaConfig};
use docs_qa::embeddings::{ChunkingConfig, Embedder};
use docs_qa::qa::{ChatModel, ChatRequest, CompletionError};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase word hashes into one of 64 buckets
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; DIMENSION];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| Self::vector(text)).collect())
    }
}

/// Chat model that records every request and answers with a fixed reply
pub struct RecordingChatModel {
    reply: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingChatModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// The user turn of the most recent request
    pub fn last_prompt(&self) -> Option<String> {
        self.requests()
            .last()
            .and_then(|request| request.messages.last())
            .map(|message| message.content.clone())
    }
}

impl ChatModel for RecordingChatModel {
    fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(self.reply.clone())
    }
}

/// A temporary state directory plus a Documents folder inside it
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("should create temp dir");
        fs::create_dir_all(dir.path().join("Documents")).expect("should create Documents");
        Self { dir }
    }

    pub fn documents(&self) -> PathBuf {
        self.dir.path().join("Documents")
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.documents().join(name), content).expect("should write document");
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.documents().join(name)).expect("should remove document");
    }

    pub fn config(&self, chunk_size: usize, overlap: usize) -> Config {
        Config {
            base_dir: self.dir.path().join("state"),
            documents: DocumentsConfig {
                folder: self.documents(),
            },
            chunking: ChunkingConfig::new(chunk_size, overlap).expect("valid chunking"),
            ollama: OllamaConfig {
                embedding_dimension: DIMENSION as u32,
                ..OllamaConfig::default()
            },
            ..Config::default()
        }
    }
}
