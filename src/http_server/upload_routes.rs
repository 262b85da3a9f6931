//! Upload HTTP Routes
//!
//! `POST /upload` takes a multipart body with one `.csv` file field and
//! bulk-loads it. Parsing and the closing rebuild run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::{api_error, run_blocking, ApiError, ServerState};
use crate::ingest::{check_csv_filename, BulkLoader};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub accepted: u64,
    pub skipped: u64,
}

/// Create upload routes
pub fn upload_routes(state: Arc<ServerState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn upload_handler(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, "CHRONO_INGEST_BAD_MULTIPART", e.to_string())
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        check_csv_filename(&file_name)?;

        let data = field.bytes().await.map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, "CHRONO_INGEST_BAD_MULTIPART", e.to_string())
        })?;

        let engine = Arc::clone(&state.engine);
        let batch_size = state.ingest_batch_size;
        let report = run_blocking(move || {
            BulkLoader::with_batch_size(&engine, batch_size).load_reader(&data[..])
        })
        .await??;

        return Ok(Json(UploadResponse {
            status: "ok".to_string(),
            message: format!(
                "Processed {}: {} records accepted, {} skipped",
                file_name, report.accepted, report.skipped
            ),
            accepted: report.accepted,
            skipped: report.skipped,
        }));
    }

    Err(api_error(
        StatusCode::BAD_REQUEST,
        "CHRONO_INGEST_NO_FILE",
        "No file provided",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use crate::engine::Engine;
    use crate::http_server::HttpServerConfig;

    const BOUNDARY: &str = "chronoscope-test-boundary";

    fn multipart_body(file_name: &str, content: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            c = content
        )
    }

    async fn upload(engine: Arc<Engine>, file_name: &str, content: &str) -> (StatusCode, String) {
        let state = Arc::new(ServerState::new(engine, &HttpServerConfig::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(file_name, content)))
            .unwrap();

        let response = upload_routes(state, 1 << 20).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upload_csv() {
        let engine = Arc::new(Engine::in_memory());
        let (status, body) = upload(
            Arc::clone(&engine),
            "data.csv",
            "Timestamp,Value\n0,10\nbad\n1,20\n",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: UploadResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.accepted, 2);
        assert_eq!(response.skipped, 1);
        assert_eq!(engine.stats().count, 2);
        assert!(engine.snapshot().aggregates_current());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_csv() {
        let engine = Arc::new(Engine::in_memory());
        let (status, body) = upload(Arc::clone(&engine), "data.txt", "0,10\n").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("CHRONO_INGEST_NOT_CSV"));
        assert_eq!(engine.stats().count, 0);
    }
}
