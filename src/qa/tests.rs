use super::*;
use crate::database::ChunkMetadata;
use std::sync::Mutex;

fn result(filename: &str, content: &str, index: u32, total: u32, distance: f32) -> SearchResult {
    SearchResult {
        chunk_metadata: ChunkMetadata {
            filename: filename.to_string(),
            chunk_index: index,
            total_chunks: total,
            content: content.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        },
        similarity_score: 1.0 - distance,
        distance,
    }
}

/// Records requests and replies with a canned outcome
struct ScriptedModel {
    reply: fn() -> Result<String, CompletionError>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(reply: fn() -> Result<String, CompletionError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

impl ChatModel for ScriptedModel {
    fn complete(&self, request: &ChatRequest) -> Result<String, CompletionError> {
        self.requests.lock().expect("lock").push(request.clone());
        (self.reply)()
    }
}

fn generator(model: Arc<ScriptedModel>) -> AnswerGenerator {
    AnswerGenerator::new(model, &CompletionConfig::default())
}

#[test]
fn context_has_headers_and_blank_line_separators() {
    let results = vec![
        result("a.txt", "alpha text", 0, 2, 0.1),
        result("b.pdf", "beta text", 2, 3, 0.2),
    ];

    let context = prepare_context(&results, 3, 2000);
    assert_eq!(
        context,
        "Document: a.txt (part 1/2)\nalpha text\n\nDocument: b.pdf (part 3/3)\nbeta text"
    );
}

#[test]
fn context_is_empty_without_results() {
    assert_eq!(prepare_context(&[], 3, 2000), "");
}

#[test]
fn context_respects_chunk_limit() {
    let results = vec![
        result("a.txt", "one", 0, 1, 0.1),
        result("b.txt", "two", 0, 1, 0.2),
        result("c.txt", "three", 0, 1, 0.3),
    ];

    let context = prepare_context(&results, 2, 2000);
    assert!(context.contains("one"));
    assert!(context.contains("two"));
    assert!(!context.contains("three"));
}

#[test]
fn long_chunks_are_cut_on_char_boundaries() {
    let results = vec![result("a.txt", "héllo wörld", 0, 1, 0.1)];

    let context = prepare_context(&results, 1, 4);
    assert_eq!(context, "Document: a.txt (part 1/1)\nhéll");
}

#[test]
fn request_carries_system_prompt_and_question() {
    let generator = generator(ScriptedModel::new(|| Ok(String::new())));

    let request = generator.build_request("Where?", "Document: a.txt (part 1/1)\nhere");
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
    assert_eq!(
        request.messages[1].content,
        "Context:\nDocument: a.txt (part 1/1)\nhere\n\nQuestion: Where?"
    );
    assert_eq!(request.max_tokens, 500);
    assert!((request.temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn empty_context_skips_the_model() {
    let model = ScriptedModel::new(|| Ok("should not be used".to_string()));
    let answer = generator(model.clone()).generate_answer("anything?", "").await;

    assert_eq!(answer, NO_CONTEXT_ANSWER);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn model_reply_is_returned() {
    let model = ScriptedModel::new(|| Ok("It is here.".to_string()));
    let answer = generator(model.clone())
        .generate_answer("Where?", "Document: a.txt (part 1/1)\nhere")
        .await;

    assert_eq!(answer, "It is here.");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn timeout_becomes_retry_message() {
    let model = ScriptedModel::new(|| Err(CompletionError::Timeout));
    let answer = generator(model).generate_answer("Where?", "context").await;

    assert_eq!(answer, TIMEOUT_ANSWER);
}

#[tokio::test]
async fn other_failures_become_error_text() {
    let model = ScriptedModel::new(|| Err(CompletionError::Api { status: 500 }));
    let answer = generator(model).generate_answer("Where?", "context").await;

    assert_eq!(answer, "Error getting answer: completion API returned HTTP 500");
}
