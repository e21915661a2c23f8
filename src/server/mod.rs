//! HTTP surface
//!
//! Routes, shared state and the process-time middleware. Components are
//! built on first use so the server starts even when a backend is down.

pub mod errors;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::QaError;
use crate::config::{Config, Credentials};
use crate::service::QaService;

pub use errors::ApiError;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// State shared by every handler
pub struct AppState {
    config: Config,
    credentials: Option<Credentials>,
    service: OnceCell<Arc<QaService>>,
}

impl AppState {
    #[inline]
    pub fn new(config: Config, credentials: Credentials) -> Self {
        Self {
            config,
            credentials: Some(credentials),
            service: OnceCell::new(),
        }
    }

    /// State around an already built service
    #[inline]
    pub fn from_service(config: Config, service: Arc<QaService>) -> Self {
        Self {
            config,
            credentials: None,
            service: OnceCell::new_with(Some(service)),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The service, built on first call; a failed build is retried next time
    #[inline]
    pub async fn service(&self) -> Result<Arc<QaService>, QaError> {
        self.service
            .get_or_try_init(|| async {
                let credentials = self.credentials.as_ref().ok_or_else(|| {
                    QaError::Config("No credentials available to build the service".to_string())
                })?;
                info!("Initializing components");
                QaService::new(&self.config, credentials).await.map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
pub struct Question {
    pub text: String,
}

#[inline]
pub fn format_processing_time(elapsed: Duration) -> String {
    format!("{:.2} seconds", elapsed.as_secs_f64())
}

/// Build the application router with all routes and middleware
#[inline]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/warmup", get(warmup))
        .route("/ask", post(ask))
        .route("/update", post(update))
        .layer(middleware::from_fn(stamp_process_time))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Record how long each request took in `X-Process-Time`
async fn stamp_process_time(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64().to_string();
    if let Ok(value) = HeaderValue::from_str(&elapsed) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Document QA API",
        "endpoints": {
            "/ask": "POST - Ask a question",
            "/update": "POST - Update documents",
            "/health": "GET - Health check",
            "/warmup": "GET - Warmup"
        }
    }))
}

async fn warmup(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = match state.service().await {
        Ok(service) => service.warmup().await,
        Err(e) => Err(e),
    };

    match status {
        Ok(status) => Json(json!(status)),
        Err(e) => {
            error!("Error during warmup: {}", e);
            Json(json!({
                "status": "error",
                "message": e.to_string(),
                "ready": false
            }))
        }
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(question): Json<Question>,
) -> Result<Json<Value>, ApiError> {
    let service = state.service().await?;
    let answer = service.ask(&question.text).await?;

    Ok(Json(json!({
        "answer": answer.answer,
        "processing_time": format_processing_time(answer.elapsed)
    })))
}

async fn update(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let service = state.service().await?;
    let outcome = service.update().await?;

    Ok(Json(json!({
        "message": format!("Updated with {} document chunks.", outcome.summary.chunks),
        "processing_time": format_processing_time(outcome.elapsed),
        "summary": outcome.summary
    })))
}

/// Serve the HTTP surface until Ctrl-C
///
/// Component initialization starts in the background; failures are only
/// logged and retried by the first request that needs them.
#[inline]
pub async fn serve(config: Config, credentials: Credentials) -> Result<()> {
    let address = (config.server.host.clone(), config.server.port);
    let state = Arc::new(AppState::new(config, credentials));

    let init_state = Arc::clone(&state);
    tokio::spawn(async move {
        match init_state.service().await {
            Ok(_) => info!("Components initialized, ready for requests"),
            Err(e) => error!("Error during startup initialization: {}", e),
        }
    });

    let listener = tokio::net::TcpListener::bind((address.0.as_str(), address.1))
        .await
        .with_context(|| format!("Failed to bind {}:{}", address.0, address.1))?;
    info!(
        "Listening on http://{}",
        listener.local_addr().context("Failed to read bound address")?
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}
