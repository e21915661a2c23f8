// QA module
// Context assembly over search results and answer generation with a chat model

pub mod completion;
pub mod projects;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::CompletionConfig;
use crate::database::SearchResult;

pub use completion::{ChatMessage, ChatModel, ChatRequest, CompletionError, OpenAiClient, Role};
pub use projects::{Project, ProjectCatalog};

pub const NO_CONTEXT_ANSWER: &str = "No relevant information found in the documents.";
pub const TIMEOUT_ANSWER: &str = "The request timed out. Please try again.";

pub const SYSTEM_PROMPT: &str = "You are a friendly and helpful assistant that answers questions \
based ONLY on the provided documents. If the information is not in the documents, say so. \
If the question is about projects, mention that GitHub links are available for all projects.";

/// Build the model context from the closest chunks
///
/// At most `max_chunks` results are used and each chunk is cut to
/// `max_chunk_chars` characters. No results give an empty context.
#[inline]
pub fn prepare_context(results: &[SearchResult], max_chunks: usize, max_chunk_chars: usize) -> String {
    results
        .iter()
        .take(max_chunks)
        .map(|result| {
            let metadata = &result.chunk_metadata;
            format!(
                "Document: {} (part {}/{})\n{}",
                metadata.filename,
                metadata.chunk_index + 1,
                metadata.total_chunks,
                truncate_chars(&metadata.content, max_chunk_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text.get(..end).unwrap_or(text),
        None => text,
    }
}

/// Produces answers grounded in a prepared context
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    temperature: f32,
    max_tokens: u32,
}

impl AnswerGenerator {
    #[inline]
    pub fn new(model: Arc<dyn ChatModel>, config: &CompletionConfig) -> Self {
        Self {
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    #[inline]
    pub fn build_request(&self, question: &str, context: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Answer `question` from `context`
    ///
    /// Never fails: an empty context short-circuits without calling the model
    /// and model failures become the returned text.
    #[inline]
    pub async fn generate_answer(&self, question: &str, context: &str) -> String {
        if context.is_empty() {
            debug!("Empty context, skipping completion call");
            return NO_CONTEXT_ANSWER.to_string();
        }

        let request = self.build_request(question, context);
        let model = Arc::clone(&self.model);
        let outcome = tokio::task::spawn_blocking(move || model.complete(&request)).await;

        match outcome {
            Ok(Ok(answer)) => answer,
            Ok(Err(CompletionError::Timeout)) => {
                warn!("Completion request timed out");
                TIMEOUT_ANSWER.to_string()
            }
            Ok(Err(e)) => {
                error!("Completion request failed: {}", e);
                format!("Error getting answer: {}", e)
            }
            Err(e) => {
                error!("Completion task failed: {}", e);
                format!("Error getting answer: {}", e)
            }
        }
    }
}
