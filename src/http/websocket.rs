//! Request dispatch: live-reload upgrades vs. static files.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests on any path
//! - Complete the upgrade handshake and register the socket
//! - Forward everything else to static file serving
//!
//! # Design Decisions
//! - The channel is one-directional (server → client); inbound frames are
//!   drained and ignored by the registry's connection task
//! - An upgrade after shutdown has begun is refused with an immediate close

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::Uri;
use axum::response::Response;

use crate::http::server::AppState;
use crate::http::static_files;

/// Single handler for every path: upgrade requests become live-reload
/// connections, anything else is served from the root directory.
pub async fn serve_request(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    uri: Uri,
) -> Response {
    if let Ok(ws) = ws {
        let registry = state.registry.clone();
        return ws.on_upgrade(move |socket| async move {
            if registry.add(socket).is_none() {
                tracing::debug!("Upgrade refused, registry already closed");
            }
        });
    }

    static_files::serve(&state.config, uri.path()).await
}
