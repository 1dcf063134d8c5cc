//! Startup/shutdown orchestration.
//!
//! # Responsibilities
//! - Own the configuration and the lifecycle state machine
//! - Bring subsystems up in dependency order (server first, then watcher,
//!   so the HTTP endpoint exists before any reload could need delivery)
//! - Tear down in the defined order: clients, watcher, server
//! - Route fatal component errors through the idempotent kill sequence

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broadcast::ReloadBroadcaster;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::ServeConfig;
use crate::http::StaticServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{LifecycleEvent, ServerState};
use crate::net::{bind_with_fallback, ListenerError};
use crate::registry::ClientRegistry;
use crate::watch::{FileWatcher, WatchError};

/// How long teardown waits for the server task to finish and release its
/// port before giving up on the join.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for `start()`.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid configuration: {}", format_validation_errors(.0))]
    Config(Vec<ValidationError>),
    #[error(transparent)]
    Bind(#[from] ListenerError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Handle components use to report a fatal error.
///
/// Firing it forces the full teardown sequence; firing it repeatedly, or
/// after teardown already ran, is a no-op.
#[derive(Clone)]
pub struct KillSwitch {
    tx: mpsc::UnboundedSender<String>,
}

impl KillSwitch {
    pub fn fire(&self, reason: impl Into<String>) {
        let _ = self.tx.send(reason.into());
    }
}

/// Everything owned by one active run.
struct RunServices {
    registry: Arc<ClientRegistry>,
    watcher: FileWatcher,
    shutdown: Shutdown,
    server_task: JoinHandle<()>,
    broadcaster_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// Orchestrates startup and shutdown of one server/watcher/registry trio.
///
/// A controller is reusable: after `stop()` returns, `start()` begins a
/// fresh run with a fresh registry.
pub struct LifecycleController {
    config: Arc<ServeConfig>,
    state: Mutex<ServerState>,
    services: tokio::sync::Mutex<Option<RunServices>>,
}

impl LifecycleController {
    /// Create a controller for `config`. Nothing runs until `start()`.
    pub fn new(config: ServeConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Mutex::new(ServerState::Stopped),
            services: tokio::sync::Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Address the current run is bound to, if one is active.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.services.lock().await.as_ref().map(|s| s.local_addr)
    }

    /// Begin serving.
    ///
    /// Valid only from `Stopped`; calling it while a run is active is a
    /// no-op returning `Ok(None)`. On success returns the bound address.
    pub async fn start(self: &Arc<Self>) -> Result<Option<SocketAddr>, StartError> {
        if !self.transition(LifecycleEvent::StartRequested) {
            tracing::debug!(state = ?self.state(), "start() ignored");
            return Ok(None);
        }

        match self.bring_up().await {
            Ok(addr) => {
                if self.transition(LifecycleEvent::Started) {
                    tracing::info!(address = %addr, "Server running");
                    Ok(Some(addr))
                } else {
                    // stop() raced us during startup; undo.
                    self.teardown().await;
                    Ok(None)
                }
            }
            Err(e) => {
                // Nothing half-started may outlive a failed start.
                self.teardown().await;
                self.transition(LifecycleEvent::Stopped);
                Err(e)
            }
        }
    }

    /// Halt serving and release every resource.
    ///
    /// Valid from `Running` or `Starting`; calling it in any other state is
    /// a no-op. Teardown order: clients, watcher, server.
    pub async fn stop(&self) {
        if !self.transition(LifecycleEvent::StopRequested) {
            tracing::debug!(state = ?self.state(), "stop() ignored");
            return;
        }

        self.teardown().await;
        self.transition(LifecycleEvent::Stopped);
        tracing::info!("Server stopped");
    }

    /// Force the full teardown sequence regardless of current state.
    ///
    /// Fired internally when the server or watcher reports a fatal error;
    /// hosts may also call it for an unconditional halt. Idempotent: a kill
    /// while already stopping or stopped does nothing.
    pub async fn kill(&self, reason: &str) {
        if !self.transition(LifecycleEvent::StopRequested) {
            return;
        }

        tracing::error!(reason, "Fatal error, tearing down");
        self.teardown().await;
        self.transition(LifecycleEvent::Stopped);
        tracing::info!("Server stopped after fatal error");
    }

    /// Apply one state-machine event. Returns false when the event is a
    /// no-op in the current state.
    fn transition(&self, event: LifecycleEvent) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.next(event) {
            Some(next) => {
                tracing::debug!(from = ?*state, to = ?next, "Lifecycle transition");
                *state = next;
                true
            }
            None => false,
        }
    }

    async fn bring_up(self: &Arc<Self>) -> Result<SocketAddr, StartError> {
        validate_config(&self.config).map_err(StartError::Config)?;

        let registry = ClientRegistry::new();
        let shutdown = Shutdown::new();
        let (kill_tx, mut kill_rx) = mpsc::unbounded_channel::<String>();
        let kill = KillSwitch { tx: kill_tx };

        // Server first: the HTTP endpoint exists before any reload message
        // could need delivery.
        let listener = bind_with_fallback(&self.config).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| StartError::Bind(ListenerError::Bind(e)))?;

        let server = StaticServer::new(Arc::clone(&self.config), Arc::clone(&registry));
        let server_shutdown = shutdown.subscribe();
        let server_kill = kill.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = server.run(listener, server_shutdown).await {
                server_kill.fire(format!("server error: {}", e));
            }
        });

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let broadcaster = ReloadBroadcaster::new(Arc::clone(&registry));
        let broadcaster_shutdown = shutdown.subscribe();
        let broadcaster_task = tokio::spawn(async move {
            broadcaster.run(event_rx, broadcaster_shutdown).await;
        });

        let watcher = match FileWatcher::spawn(Arc::clone(&self.config), event_tx, kill.clone()) {
            Ok(watcher) => watcher,
            Err(e) => {
                // The server is already up; unwind it before surfacing.
                registry.close_all();
                shutdown.trigger();
                let _ = tokio::time::timeout(TEARDOWN_TIMEOUT, server_task).await;
                broadcaster_task.abort();
                return Err(e.into());
            }
        };

        // The supervisor owns the kill receiver; it exits when every kill
        // sender is gone or after the first fatal report.
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            if let Some(reason) = kill_rx.recv().await {
                if let Some(controller) = weak.upgrade() {
                    controller.kill(&reason).await;
                }
            }
        });

        *self.services.lock().await = Some(RunServices {
            registry,
            watcher,
            shutdown,
            server_task,
            broadcaster_task,
            local_addr,
        });

        Ok(local_addr)
    }

    /// Release everything owned by the current run, in order: clients,
    /// watcher, server. Safe to call when no run is active.
    async fn teardown(&self) {
        let Some(services) = self.services.lock().await.take() else {
            return;
        };

        services.registry.close_all();
        services.watcher.close();
        services.shutdown.trigger();

        if tokio::time::timeout(TEARDOWN_TIMEOUT, services.server_task)
            .await
            .is_err()
        {
            tracing::warn!("Server task did not stop within the teardown timeout");
        }
        if tokio::time::timeout(TEARDOWN_TIMEOUT, services.broadcaster_task)
            .await
            .is_err()
        {
            tracing::warn!("Broadcaster task did not stop within the teardown timeout");
        }
    }
}
