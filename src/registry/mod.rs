//! Live-reload client registry.
//!
//! # Responsibilities
//! - Track every accepted WebSocket connection
//! - Fan messages out to all connected clients
//! - Drop clients whose sends fail without disturbing the others
//! - Close every connection on shutdown
//!
//! # Design Decisions
//! - Backed by a concurrent map; mutations are safe from any task
//! - Each connection writes through its own unbounded channel, so a slow
//!   client cannot stall the broadcaster or other clients
//! - `close_all` is terminal for a registry instance; a fresh start cycle
//!   creates a fresh registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::observability::metrics;

/// Terminal message sent to every client immediately before its connection
/// is closed during shutdown.
pub const CLOSE_MESSAGE: &str = r#"{"message":"close-socket"}"#;

/// One registered live-reload connection.
///
/// Holds the write side of the connection's outbound channel. The socket
/// itself lives in a task spawned by [`ClientRegistry::add`].
struct ClientConnection {
    tx: mpsc::UnboundedSender<Message>,
}

/// Registry of active live-reload connections.
///
/// The registry owns each connection for its lifetime: created on upgrade,
/// removed on close (peer-initiated or during shutdown).
pub struct ClientRegistry {
    clients: DashMap<Uuid, ClientConnection>,
    closed: AtomicBool,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clients: DashMap::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Register an upgraded socket and drive it until it closes.
    ///
    /// Returns the connection id, or `None` when the registry has already
    /// been closed by `close_all` (the socket is closed immediately).
    pub fn add(self: &Arc<Self>, socket: WebSocket) -> Option<Uuid> {
        if self.closed.load(Ordering::SeqCst) {
            tokio::spawn(async move {
                let mut socket = socket;
                let _ = socket.send(Message::Close(None)).await;
            });
            return None;
        }

        let id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        self.clients.insert(id, ClientConnection { tx });
        metrics::record_client_connected();
        tracing::debug!(connection_id = %id, clients = self.len(), "Client connected");

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let (mut sink, mut stream) = socket.split();
            loop {
                tokio::select! {
                    outbound = rx.recv() => match outbound {
                        Some(message) => {
                            let terminal = matches!(message, Message::Close(_));
                            if sink.send(message).await.is_err() {
                                break;
                            }
                            if terminal {
                                break;
                            }
                        }
                        // Sender side dropped by close_all.
                        None => break,
                    },
                    inbound = stream.next() => match inbound {
                        // The channel is one-directional; inbound frames other
                        // than close are ignored.
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                }
            }
            registry.remove(id);
        });

        Some(id)
    }

    /// Remove a connection if present. Removing an absent id is a no-op.
    pub fn remove(&self, id: Uuid) {
        if self.clients.remove(&id).is_some() {
            metrics::record_client_disconnected();
            tracing::debug!(connection_id = %id, clients = self.len(), "Client removed");
        }
    }

    /// Send `message` to every currently-registered connection.
    ///
    /// A failed send drops that client only; delivery to the others proceeds.
    pub fn broadcast(&self, message: &str) {
        let mut dropped = Vec::new();
        for entry in self.clients.iter() {
            let frame = Message::Text(message.to_string().into());
            if entry.value().tx.send(frame).is_err() {
                dropped.push(*entry.key());
            }
        }
        metrics::record_broadcast(self.len());

        for id in dropped {
            metrics::record_send_failure();
            tracing::warn!(connection_id = %id, "Dropping client after failed send");
            self.remove(id);
        }
    }

    /// Send the terminal close message to every connection, close each, and
    /// clear the registry.
    ///
    /// Irreversible: subsequent `add` calls are refused until a fresh start
    /// cycle creates a new registry instance.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let count = self.len();
        for entry in self.clients.iter() {
            let _ = entry.value().tx.send(Message::Text(CLOSE_MESSAGE.into()));
            let _ = entry.value().tx.send(Message::Close(None));
        }
        self.clients.clear();

        if count > 0 {
            tracing::info!(clients = count, "Closed all client connections");
        }
    }

    /// Number of currently-registered connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_absent_id_is_noop() {
        let registry = ClientRegistry::new();
        registry.remove(Uuid::new_v4());
        assert!(registry.is_empty());
    }

    #[test]
    fn broadcast_to_empty_registry_is_noop() {
        let registry = ClientRegistry::new();
        registry.broadcast("{}");
        assert!(registry.is_empty());
    }

    #[test]
    fn close_all_is_idempotent() {
        let registry = ClientRegistry::new();
        registry.close_all();
        registry.close_all();
        assert!(registry.is_empty());
    }
}
