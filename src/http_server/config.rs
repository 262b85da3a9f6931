//! HTTP Server Configuration
//!
//! Bind address, CORS origins and the per-connection delivery limits.

use serde::{Deserialize, Serialize};

use crate::ingest::DEFAULT_BATCH_SIZE;
use crate::session::DEFAULT_CHUNK_SIZE;

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 54321)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Points per WebSocket chunk (default: 5000)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Samples per engine batch during uploads (default: 100000)
    #[serde(default = "default_ingest_batch_size")]
    pub ingest_batch_size: usize,

    /// Largest accepted upload body in bytes (default: 1 GiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    54321
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(), // Vite dev server
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_ingest_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_upload_bytes() -> usize {
    1 << 30
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            chunk_size: default_chunk_size(),
            ingest_batch_size: default_ingest_batch_size(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
