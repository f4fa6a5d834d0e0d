use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use graph::{GraphError, GraphStats};
use ingest::IngestError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::assistant::{Assistant, DirectoryIngestReport, QueryResponse};

pub type AppState = Arc<Assistant>;

pub fn router(assistant: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ingest", post(ingest))
        .route("/query", post(query))
        .route("/sessions/:id", delete(clear_session))
        .route("/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(assistant)
}

/// Maps orchestration errors onto HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let validation = matches!(err.downcast_ref::<GraphError>(), Some(GraphError::Validation(_)))
            || matches!(err.downcast_ref::<IngestError>(), Some(IngestError::Validation(_)));

        if validation {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(err) => {
                error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub graph: String,
}

#[derive(Deserialize)]
pub struct IngestRequest {
    pub path: String,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
    pub max_hops: Option<usize>,
    #[serde(default = "default_include_reasoning")]
    pub include_reasoning: bool,
}

fn default_include_reasoning() -> bool {
    true
}

async fn health_check(State(assistant): State<AppState>) -> Json<HealthResponse> {
    let graph = match assistant.store().stats().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        graph,
    })
}

async fn ingest(
    State(assistant): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<DirectoryIngestReport>, ApiError> {
    let path = PathBuf::from(&req.path);

    if !path.exists() {
        return Err(ApiError::NotFound(format!("Path not found: {}", req.path)));
    }

    let report = if path.is_dir() {
        assistant.ingest_directory(&path).await?
    } else {
        let document = assistant.ingest_document(&path).await?;
        DirectoryIngestReport {
            documents: vec![document],
            failures: Vec::new(),
        }
    };

    Ok(Json(report))
}

async fn query(
    State(assistant): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    let response = assistant
        .ask(
            &req.query,
            req.session_id.as_deref(),
            req.max_hops,
            req.include_reasoning,
        )
        .await?;

    Ok(Json(response))
}

async fn clear_session(State(assistant): State<AppState>, Path(id): Path<String>) -> StatusCode {
    assistant.clear_session(&id);
    StatusCode::NO_CONTENT
}

async fn get_stats(State(assistant): State<AppState>) -> Result<Json<GraphStats>, ApiError> {
    Ok(Json(assistant.stats().await?))
}
