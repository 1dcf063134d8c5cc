//! Reload fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! ChangeEvent (from watch)
//!     → ReloadMessage (content + extension + config fields)
//!     → serde_json
//!     → ClientRegistry::broadcast (fan-out, best-effort)
//! ```
//!
//! # Design Decisions
//! - Push-based invalidation: the file content rides in the message, clients
//!   never re-fetch
//! - No acknowledgment; delivery is at-most-once per connected client
//! - No deduplication beyond the watcher's debounce

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast as tokio_broadcast, mpsc};

use crate::config::ServeConfig;
use crate::registry::ClientRegistry;
use crate::watch::ChangeEvent;

/// Wire message for a change notification (server → client, text frame).
///
/// The active configuration is flattened into the object, matching the
/// `{content, fileExtension, ...configuration fields}` wire shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadMessage<'a> {
    pub content: &'a str,
    pub file_extension: &'a str,
    #[serde(flatten)]
    pub config: &'a ServeConfig,
}

/// Fans change events out to every registered client.
pub struct ReloadBroadcaster {
    registry: Arc<ClientRegistry>,
}

impl ReloadBroadcaster {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Consume change events until shutdown is signalled or the event
    /// channel closes.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<ChangeEvent>,
        mut shutdown: tokio_broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(event) => self.dispatch(&event),
                    None => break,
                },
            }
        }
        tracing::debug!("Reload broadcaster stopped");
    }

    fn dispatch(&self, event: &ChangeEvent) {
        let message = ReloadMessage {
            content: &event.content,
            file_extension: &event.extension,
            config: &event.config,
        };
        match serde_json::to_string(&message) {
            Ok(text) => {
                tracing::debug!(
                    path = %event.path.display(),
                    clients = self.registry.len(),
                    "Broadcasting reload"
                );
                self.registry.broadcast(&text);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize reload message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_shape_matches_wire_format() {
        let config = ServeConfig::new("/site");
        let message = ReloadMessage {
            content: "body { color: red }",
            file_extension: ".css",
            config: &config,
        };
        let value: serde_json::Value = serde_json::from_str(
            &serde_json::to_string(&message).unwrap(),
        )
        .unwrap();

        assert_eq!(value["content"], "body { color: red }");
        assert_eq!(value["fileExtension"], ".css");
        // Configuration fields are flattened alongside.
        assert_eq!(value["port"], 8125);
        assert_eq!(value["root"], "/site");
    }
}
