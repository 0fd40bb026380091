//! HTTP API for the execution service
//!
//! Thin JSON wrappers over the two library calls. Execution endpoints
//! always answer 200 with a result shape; failures ride inside the body,
//! never as HTTP faults.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::sandbox::{ExecutionRequest, ExecutionResult, ExecutionService, PackageListResult};

// ---- App State ----

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Execution service, shared across in-flight requests
    pub service: ExecutionService,
}

// ---- Response Types ----

/// Service status report
#[derive(Serialize)]
struct StatusResponse {
    /// "operational" when the container runtime answers, else "degraded"
    status: String,
    /// Server-side time of the report
    timestamp: chrono::DateTime<chrono::Utc>,
    /// Crate version
    version: String,
}

// ---- Handlers ----

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = match state.service.ping().await {
        Ok(()) => "operational",
        Err(_) => "degraded",
    };

    Json(StatusResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now(),
        version: crate::VERSION.to_string(),
    })
}

async fn execute_code(
    State(state): State<AppState>,
    Json(request): Json<ExecutionRequest>,
) -> Json<ExecutionResult> {
    Json(state.service.execute(&request).await)
}

async fn list_packages(State(state): State<AppState>) -> Json<PackageListResult> {
    Json(state.service.list_packages().await)
}

// ---- Router ----

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(get_status))
        .route("/execute", post(execute_code))
        .route("/execute/packages", get(list_packages));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}
