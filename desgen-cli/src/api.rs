//! HTTP front door.
//!
//! Routes:
//! - `GET /` and `GET /health`: liveness
//! - `POST /api/design`: run the pipeline for `{"prompt": ...}`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use desgen::context::RunIdentity;
use desgen::pipeline::PipelineRunner;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::error::ApiError;

/// Response header carrying the request ID of a design run.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AppState {
    runner: Arc<dyn PipelineRunner>,
}

impl AppState {
    pub fn new(runner: Arc<dyn PipelineRunner>) -> Self {
        Self { runner }
    }
}

#[derive(Debug, Deserialize)]
pub struct DesignRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Builds the router for a pipeline runner.
///
/// Browsers are only allowed to call from `frontend_origin`.
pub fn router(state: AppState, frontend_origin: &str) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/design", post(design))
        .with_state(state)
        .layer(cors_layer(frontend_origin)?))
}

fn cors_layer(frontend_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_origin)
        .map_err(|e| anyhow::anyhow!("Invalid FRONTEND_ORIGIN '{frontend_origin}': {e}"))?;

    // Wildcards are not allowed together with credentials.
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: Some("Desgen API is running"),
    })
}

async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: None,
    })
}

/// `POST /api/design`: returns the full context in causal key order.
async fn design(
    State(state): State<AppState>,
    payload: Result<Json<DesignRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let identity = RunIdentity::for_request();
    let request_id = identity
        .request_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    tracing::info!(%request_id, run_id = %identity.run_id, "Design request accepted");

    let context = state.runner.run_pipeline(&request.prompt, identity).await?;
    Ok(([(REQUEST_ID_HEADER, request_id)], Json(context)))
}
