//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::data_routes::data_routes;
use super::observability_routes::{health_routes, observability_routes};
use super::session_routes::session_routes;
use super::state::ServerState;
use super::upload_routes::upload_routes;
use crate::engine::Engine;
use crate::observability::{log_event_with_fields, Event};

/// HTTP server for a chronoscope engine
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, engine: Arc<Engine>) -> Self {
        let router = Self::build_router(&config, engine);
        Self { config, router }
    }

    fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
        if config.cors_origins.is_empty() {
            // No origins configured: permissive, for development
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, engine: Arc<Engine>) -> Router {
        let state = Arc::new(ServerState::new(engine, config));

        Router::new()
            .merge(health_routes(Arc::clone(&state)))
            .merge(data_routes(Arc::clone(&state)))
            .merge(upload_routes(Arc::clone(&state), config.max_upload_bytes))
            .merge(session_routes(Arc::clone(&state)))
            .nest("/observability", observability_routes(state))
            .layer(Self::cors_layer(config))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process exits
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?.to_string();
        log_event_with_fields(Event::Serving, &[("addr", &addr)]);

        axum::serve(listener, self.router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[test]
    fn test_server_with_custom_port() {
        let config = HttpServerConfig::with_port(8080);
        let server = HttpServer::new(config, Arc::new(Engine::in_memory()));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_routes_are_mounted() {
        let server = HttpServer::new(HttpServerConfig::default(), Arc::new(Engine::in_memory()));
        let router = server.router();

        for uri in ["/", "/health", "/stats", "/granularities", "/observability/metrics"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
            let _ = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        }
    }
}
