//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Request timeouts
//! - Static serving of uploaded media
//! - CORS support

use crate::api::handlers::AppState;
use crate::api::middleware::{security_headers_middleware, trace_id_middleware, SecurityHeadersConfig};
use crate::api::routes::build_api_routes;
use crate::core::config::ServerConfig;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server over fully wired application state
    pub fn new(state: AppState) -> Self {
        let config = state.config.server.clone();
        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all routes and middleware
    pub fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let security_headers = SecurityHeadersConfig::from(&config.security);

        // Uploaded images are public, like the rest of the media root
        let media = ServeDir::new(state.media.root());
        let media_url = state.media.url_prefix().to_string();

        build_api_routes(state)
            .nest_service(&media_url, media)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(
                        security_headers,
                        security_headers_middleware,
                    ))
                    .layer(middleware::from_fn(trace_id_middleware))
                    .layer(TraceLayer::new_for_http())
                    .layer(Self::build_cors_layer(&config.security.allowed_origins))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.server.request_timeout,
                    ))),
            )
    }

    /// Build CORS layer from allowed origins configuration
    fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if allowed_origins.iter().any(|origin| origin == "*") {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<_> = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let socket_addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}
