//! Observability HTTP Routes
//!
//! Health check and the engine's counters.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::state::ServerState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub samples: u64,
    pub aggregates_current: bool,
}

/// Create observability routes
pub fn observability_routes(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check route (also available at root /health)
pub fn health_routes(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot();
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        samples: snapshot.stats().count,
        aggregates_current: snapshot.aggregates_current(),
    };

    (StatusCode::OK, Json(response))
}

/// Metrics handler - returns counters as JSON
async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let mut metrics = state.engine.metrics().to_json();
    if let Some(object) = metrics.as_object_mut() {
        object.insert(
            "active_sessions".to_string(),
            state.engine.metrics().active_sessions().into(),
        );
    }

    (StatusCode::OK, Json(metrics))
}
