//! Lore HTTP API
//!
//! Axum-based HTTP server for question answering and QA repository CRUD.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET    /?question=   — answer a question (plain text)
//! - GET    /embeds       — list all QA entries
//! - POST   /embeds       — create an entry `{question, answer}`
//! - PUT    /embeds/:id   — update an entry `{answer, question?}`
//! - DELETE /embeds/:id   — delete an entry
//! - GET    /health       — store health
//! - GET    /version      — server version info

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use lore_core::{LoreConfig, LoreError, QaEntry};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::services::Services;
use crate::subsystems::{answer, repository};

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub services: Services,
    pub config: LoreConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(ask_handler))
        .route("/embeds", get(list_handler).post(create_handler))
        .route("/embeds/:id", put(update_handler).delete(delete_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    services: Services,
    config: LoreConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { services, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Lore HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs and error response
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct AskParams {
    pub question: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateRequest {
    pub answer: Option<String>,
    pub question: Option<String>,
}

/// Body of a create/update request. A missing, non-JSON or malformed body
/// reads as empty, so validation reports the missing fields as a 400.
pub fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "Unreadable JSON body");
            T::default()
        }
    }
}

/// Plain-text error response: 400 for caller mistakes, 500 otherwise.
#[derive(Debug)]
pub struct ApiError(pub LoreError);

impl From<LoreError> for ApiError {
    fn from(err: LoreError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &LoreError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Parse the `:id` path segment.
pub fn parse_id(raw: &str) -> Result<i64, LoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LoreError::invalid("Missing id"));
    }
    raw.parse()
        .map_err(|_| LoreError::invalid(format!("Invalid id: {}", raw)))
}

pub async fn ask_inner(state: &HttpState, question: Option<String>) -> Result<String, LoreError> {
    let question = question.unwrap_or_default();
    answer::answer_question(
        &question,
        &state.services,
        &state.config.retrieval,
        &state.config.generation.persona,
    )
    .await
}

pub async fn list_inner(state: &HttpState) -> Result<Vec<QaEntry>, LoreError> {
    repository::list_entries(&state.services).await
}

/// Returns `{id, data: [question, answer], inserted}`.
pub async fn create_inner(
    state: &HttpState,
    req: CreateRequest,
) -> Result<serde_json::Value, LoreError> {
    let created = repository::create_entry(
        req.question.as_deref(),
        req.answer.as_deref(),
        &state.services,
    )
    .await?;

    Ok(serde_json::json!({
        "id": created.entry.id,
        "data": [created.entry.question, created.entry.answer],
        "inserted": created.inserted,
    }))
}

pub async fn update_inner(
    state: &HttpState,
    raw_id: &str,
    req: UpdateRequest,
) -> Result<QaEntry, LoreError> {
    let id = parse_id(raw_id)?;
    repository::update_entry(
        id,
        req.answer.as_deref(),
        req.question.as_deref(),
        &state.services,
    )
    .await
}

pub async fn delete_inner(state: &HttpState, raw_id: &str) -> Result<(), LoreError> {
    let id = parse_id(raw_id)?;
    repository::delete_entry(id, &state.services).await
}

/// Inner health check: queries the store and returns (status_code, json_body).
pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let services = &state.services;
    match services.store.health().await {
        Ok(info) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "store": services.store.name(),
                "store_info": info,
                "vector_index": services.index.name(),
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "lore/1",
    })
}

// ============================================================================
// Axum handler wrappers
// ============================================================================

pub async fn ask_handler(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<AskParams>,
) -> Result<String, ApiError> {
    Ok(ask_inner(&state, params.question).await?)
}

pub async fn list_handler(
    State(state): State<Arc<HttpState>>,
) -> Result<Json<Vec<QaEntry>>, ApiError> {
    Ok(Json(list_inner(&state).await?))
}

pub async fn create_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(create_inner(&state, body_or_default(body)).await?))
}

pub async fn update_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    update_inner(&state, &id, body_or_default(body)).await?;
    Ok((StatusCode::CREATED, "updated"))
}

pub async fn delete_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Result<&'static str, ApiError> {
    delete_inner(&state, &id).await?;
    Ok("deleted")
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

// ============================================================================
// Unit Tests
// ============================================================================
