//! HTTP surface: the Axum routes wired onto [`Service`].
//!
//! Errors are converted to the JSON error envelope
//! `{"error": {"code", "message"}}` via [`AppError`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::catalog::{Document, Library};
use crate::error::VectraError;
use crate::service::{DateRange, Service};

/// Build the full router, CORS and request tracing included.
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/libraries/", post(handle_create_library))
        .route("/libraries/{id}", get(handle_read_library))
        .route("/libraries/{id}", delete(handle_delete_library))
        .route("/documents/", post(handle_create_document))
        .route("/documents/search", post(handle_search))
        .route("/documents/{id}", get(handle_read_document))
        .route("/documents/{id}", delete(handle_delete_document))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============ Error envelope ============

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<VectraError> for AppError {
    fn from(err: VectraError) -> Self {
        match err {
            VectraError::NotFound(msg) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: msg,
            },
            VectraError::Conflict(msg) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "conflict",
                message: msg,
            },
            VectraError::DimensionMismatch(msg) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "dimension_mismatch",
                message: msg,
            },
            VectraError::Upstream(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "upstream",
                message: msg,
            },
            VectraError::Config(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "config",
                message: msg,
            },
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    dimension: Option<usize>,
}

async fn handle_health(State(service): State<Arc<Service>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dimension: service.index_dimension(),
    })
}

// ============ POST /libraries/ ============

#[derive(Deserialize)]
struct CreateLibraryRequest {
    name: String,
    description: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

async fn handle_create_library(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateLibraryRequest>,
) -> Result<Json<Library>, AppError> {
    let library = service.create_library(req.name, req.description, req.metadata)?;
    Ok(Json(library))
}

// ============ GET /libraries/{id} ============

async fn handle_read_library(
    State(service): State<Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = service.read_library(id)?;
    Ok(Json(documents))
}

// ============ DELETE /libraries/{id} ============

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn handle_delete_library(
    State(service): State<Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service.delete_library(id)?;
    Ok(Json(MessageResponse {
        message: format!("library {id} deleted"),
    }))
}

// ============ POST /documents/ ============

#[derive(Deserialize)]
struct CreateDocumentRequest {
    library_id: Uuid,
    title: String,
    content: String,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

async fn handle_create_document(
    State(service): State<Arc<Service>>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<Document>, AppError> {
    let document = service
        .create_document(req.library_id, req.title, req.content, req.metadata)
        .await?;
    Ok(Json(document))
}

// ============ GET /documents/{id} ============

async fn handle_read_document(
    State(service): State<Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let document = service.read_document(id)?;
    Ok(Json(document))
}

// ============ DELETE /documents/{id} ============

async fn handle_delete_document(
    State(service): State<Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service.delete_document(id)?;
    Ok(Json(MessageResponse {
        message: format!("document {id} deleted"),
    }))
}

// ============ POST /documents/search ============

fn default_k() -> usize {
    5
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_k")]
    k: usize,
    date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

#[derive(Serialize)]
struct SearchResultItem {
    chunk_id: Uuid,
    document_id: Uuid,
    score: f32,
    content: String,
    metadata: HashMap<String, Value>,
}

async fn handle_search(
    State(service): State<Arc<Service>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResultItem>>, AppError> {
    let date_range = req.date_range.map(|(from, to)| DateRange { from, to });
    let hits = service.search(&req.query, req.k, date_range).await?;
    let results = hits
        .into_iter()
        .map(|hit| SearchResultItem {
            chunk_id: hit.chunk.id,
            document_id: hit.chunk.document_id,
            score: hit.score,
            content: hit.chunk.content,
            metadata: hit.chunk.metadata,
        })
        .collect();
    Ok(Json(results))
}
