//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router and middleware stack (tracing, timeout)
//! - Serve static files rooted at `config.root`
//! - Detect upgrade requests on any path and hand them to the registry
//! - Serve plain HTTP or TLS depending on configuration
//! - Stop on the run's shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServeConfig;
use crate::http::websocket;
use crate::net::tls::load_tls_config;
use crate::registry::ClientRegistry;

/// Per-request timeout for static responses. Upgraded connections are not
/// affected; the timeout covers only the handshake response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServeConfig>,
    pub registry: Arc<ClientRegistry>,
}

/// HTTP server for static files and live-reload upgrades.
pub struct StaticServer {
    router: Router,
    config: Arc<ServeConfig>,
}

impl StaticServer {
    /// Create a new server for `config`, handing upgrades to `registry`.
    pub fn new(config: Arc<ServeConfig>, registry: Arc<ClientRegistry>) -> Self {
        let state = AppState {
            config: Arc::clone(&config),
            registry,
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(websocket::serve_request))
            .route("/{*path}", any(websocket::serve_request))
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// Returns any runtime fault; the caller routes that into the kill
    /// sequence.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = self.config.tls.is_some(), "HTTP server starting");

        if let Some(tls) = &self.config.tls {
            let rustls_config = load_tls_config(tls).await?;
            let handle = axum_server::Handle::new();

            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
            });

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .handle(handle)
                .serve(self.router.into_make_service())
                .await?;
        } else {
            axum::serve(listener, self.router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
