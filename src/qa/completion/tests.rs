use super::*;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn config_for(server: &MockServer, timeout_secs: u64) -> CompletionConfig {
    CompletionConfig {
        base_url: server.uri(),
        model: "test-chat".to_string(),
        timeout_secs,
        ..CompletionConfig::default()
    }
}

fn client_for(server: &MockServer, timeout_secs: u64) -> OpenAiClient {
    let credentials = Credentials::new("sk-test").expect("valid key");
    OpenAiClient::new(&config_for(server, timeout_secs), &credentials)
        .expect("should create client")
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system("answer from the documents"),
            ChatMessage::user("Context:\nhello\n\nQuestion: hi?"),
        ],
        temperature: 0.7,
        max_tokens: 500,
    }
}

async fn complete(client: OpenAiClient) -> Result<String, CompletionError> {
    tokio::task::spawn_blocking(move || client.complete(&request()))
        .await
        .expect("blocking task should not panic")
}

#[test]
fn roles_serialize_lowercase() {
    let message = ChatMessage::system("x");
    let json = serde_json::to_value(&message).expect("should serialize");
    assert_eq!(json, json!({"role": "system", "content": "x"}));
}

#[test]
fn debug_output_hides_api_key() {
    let credentials = Credentials::new("sk-very-secret").expect("valid key");
    let client = OpenAiClient::new(&CompletionConfig::default(), &credentials)
        .expect("should create client");

    let debug = format!("{:?}", client);
    assert!(!debug.contains("sk-very-secret"));
    assert!(debug.contains("gpt-3.5-turbo"));
}

#[tokio::test]
async fn sends_bearer_request_and_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-chat",
            "max_tokens": 500,
            "messages": [
                {"role": "system", "content": "answer from the documents"},
                {"role": "user", "content": "Context:\nhello\n\nQuestion: hi?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Hello back."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = complete(client_for(&server, 5)).await;
    assert_eq!(answer.expect("should complete"), "Hello back.");
}

#[tokio::test]
async fn http_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = complete(client_for(&server, 5)).await;
    assert!(matches!(result, Err(CompletionError::Api { status: 401 })));
}

#[tokio::test]
async fn missing_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = complete(client_for(&server, 5)).await;
    assert!(matches!(result, Err(CompletionError::InvalidResponse(_))));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({
                    "choices": [{"message": {"content": "too late"}}]
                })),
        )
        .mount(&server)
        .await;

    let result = complete(client_for(&server, 1)).await;
    assert!(matches!(result, Err(CompletionError::Timeout)));
}
