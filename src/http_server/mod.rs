//! # chronoscope HTTP Server Module
//!
//! Combines all endpoint routers into a unified Axum server.
//!
//! # Endpoints
//!
//! - `/` - Liveness message
//! - `/health` - Health check
//! - `/data`, `/stream` - Range queries (JSON, server-sent events)
//! - `/stats`, `/granularities` - Dataset summary and the level chain
//! - `/upload` - Bulk CSV ingest
//! - `/ws` - Navigation sessions
//! - `/observability/*` - Metrics and monitoring

pub mod config;
pub mod data_routes;
pub mod observability_routes;
pub mod server;
pub mod session_routes;
pub mod state;
pub mod upload_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
