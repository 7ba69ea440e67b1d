//! Query HTTP Routes
//!
//! - `POST /query`: QueryPlan in, QueryResult out
//! - `GET /health`
//! - `GET /metrics`: counter snapshot

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::observability::{log_event_at, Event, Severity};
use crate::orchestrator::{QueryOrchestrator, QueryResult};
use crate::plan::{QueryError, QueryPlan};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn query_routes(orchestrator: Arc<QueryOrchestrator>) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(orchestrator)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Transport status for a result: 200, 400 for client-class codes, 500 otherwise
pub fn status_for(result: &QueryResult) -> StatusCode {
    match result.error() {
        None => StatusCode::OK,
        Some(err) if err.code().is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn query_handler(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
    Json(plan): Json<QueryPlan>,
) -> impl IntoResponse {
    let request_id = plan.request_id.clone();

    // The orchestrator blocks on the database
    let result = match tokio::task::spawn_blocking(move || orchestrator.execute(&plan)).await {
        Ok(result) => result,
        Err(e) => {
            log_event_at(
                Severity::Error,
                Event::ExecutionFailed,
                &[
                    ("request_id", request_id.as_deref().unwrap_or("")),
                    ("error", &e.to_string()),
                ],
            );
            QueryResult::failure(request_id, QueryError::execution("TaskJoinError"))
        }
    };

    (status_for(&result), Json(result))
}

async fn metrics_handler(State(orchestrator): State<Arc<QueryOrchestrator>>) -> impl IntoResponse {
    (StatusCode::OK, Json(orchestrator.metrics().snapshot()))
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
