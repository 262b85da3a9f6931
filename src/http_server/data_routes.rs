//! Query HTTP Routes
//!
//! Range reads over the engine: JSON, server-sent events, stats and the
//! granularity chain.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};

use super::state::{run_blocking, ApiError, ServerState};
use crate::engine::{Point, QueryResult, Stats};
use crate::granularity::Granularity;

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_ns: i64,
    pub end_ns: i64,
    #[serde(default)]
    pub granularity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub granularity: String,
    pub data: Vec<Point>,
}

#[derive(Debug, Serialize)]
pub struct GranularitiesResponse {
    pub default: &'static str,
    pub granularities: Vec<Granularity>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

// ==================
// Data Routes
// ==================

/// Create query routes
pub fn data_routes(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/data", get(data_handler))
        .route("/stream", get(stream_handler))
        .route("/stats", get(stats_handler))
        .route("/granularities", get(granularities_handler))
        .with_state(state)
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "chronoscope time-series API",
    })
}

async fn run_query(state: &ServerState, query: RangeQuery) -> Result<QueryResult, ApiError> {
    let engine = Arc::clone(&state.engine);
    let result = run_blocking(move || {
        engine.query_symbol(query.start_ns, query.end_ns, query.granularity.as_deref())
    })
    .await??;
    Ok(result)
}

/// Points in the range; without `granularity` the level follows the span
async fn data_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DataResponse>, ApiError> {
    let result = run_query(&state, query).await?;

    Ok(Json(DataResponse {
        granularity: result.granularity.to_string(),
        data: result.points,
    }))
}

fn sse_events(points: Vec<Point>) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    stream::iter(points.into_iter().map(|p| {
        Ok(SseEvent::default().data(format!("{},{}", p.timestamp_ns, p.value)))
    }))
}

/// One `data: <timestamp_ns>,<value>` event per point
async fn stream_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = run_query(&state, query).await?;

    Ok(Sse::new(sse_events(result.points)).keep_alive(KeepAlive::default()))
}

async fn stats_handler(State(state): State<Arc<ServerState>>) -> Json<Stats> {
    Json(state.engine.stats())
}

async fn granularities_handler(State(state): State<Arc<ServerState>>) -> Json<GranularitiesResponse> {
    let registry = state.engine.registry();
    Json(GranularitiesResponse {
        default: registry.default_granularity().symbol,
        granularities: registry.iter().cloned().collect(),
    })
}
