//! Shared handler state and the common error body

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::config::HttpServerConfig;
use crate::engine::{Engine, EngineError};
use crate::ingest::IngestError;

/// State shared by every handler
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub chunk_size: usize,
    pub ingest_batch_size: usize,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, config: &HttpServerConfig) -> Self {
        Self {
            engine,
            chunk_size: config.chunk_size,
            ingest_batch_size: config.ingest_batch_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Runs `work` on the blocking thread pool and waits for its result
pub async fn run_blocking<F, T>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "CHRONO_TASK_FAILED",
            e.to_string(),
        )
    })
}

impl From<EngineError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: EngineError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, err.code(), err.to_string())
    }
}

impl From<IngestError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: IngestError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[tokio::test]
    async fn test_run_blocking_leaves_runtime_thread() {
        let runtime_thread = thread::current().id();
        let worker = run_blocking(|| thread::current().id()).await.unwrap();
        assert_ne!(worker, runtime_thread);
    }

    #[tokio::test]
    async fn test_run_blocking_panic_is_internal_error() {
        let (status, Json(body)) = run_blocking(|| -> u32 { panic!("query blew up") })
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "CHRONO_TASK_FAILED");
    }
}
