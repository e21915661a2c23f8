use super::*;
use axum::body::Body;
use axum::http::{Request as HttpRequest, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// State whose service can never be built
fn uninitialized_state() -> Arc<AppState> {
    Arc::new(AppState {
        config: Config::default(),
        credentials: None,
        service: OnceCell::new(),
    })
}

async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("should read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[test]
fn processing_time_has_two_decimals() {
    assert_eq!(
        format_processing_time(Duration::from_millis(1234)),
        "1.23 seconds"
    );
    assert_eq!(format_processing_time(Duration::ZERO), "0.00 seconds");
}

#[tokio::test]
async fn no_documents_maps_to_404_detail() {
    let response = ApiError::from(QaError::NoDocuments).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"detail": "No documents found in the Documents folder."})
    );
}

#[tokio::test]
async fn other_errors_map_to_500_detail() {
    let response = ApiError::from(QaError::Database("disk full".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"detail": "Database error: disk full"})
    );
}

#[tokio::test]
async fn health_reports_healthy_with_process_time() {
    let response = build_router(uninitialized_state())
        .oneshot(
            HttpRequest::get("/health")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(PROCESS_TIME_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("process time header");
    assert!(header.parse::<f64>().is_ok_and(|secs| secs >= 0.0));
    assert_eq!(body_json(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn root_lists_endpoints() {
    let response = build_router(uninitialized_state())
        .oneshot(HttpRequest::get("/").body(Body::empty()).expect("valid request"))
        .await
        .expect("router should respond");

    let body = body_json(response).await;
    for endpoint in ["/ask", "/update", "/health", "/warmup"] {
        assert!(body["endpoints"][endpoint].is_string(), "{}", endpoint);
    }
}

#[tokio::test]
async fn warmup_failure_is_reported_in_body() {
    let response = build_router(uninitialized_state())
        .oneshot(
            HttpRequest::get("/warmup")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["ready"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn ask_failure_to_initialize_is_500() {
    let response = build_router(uninitialized_state())
        .oneshot(
            HttpRequest::post("/ask")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text": "hello?"}"#))
                .expect("valid request"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key(PROCESS_TIME_HEADER));
    let body = body_json(response).await;
    assert!(body["detail"].as_str().is_some_and(|d| d.contains("credentials")));
}
