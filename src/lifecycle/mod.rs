//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start():
//!     Stopped → Starting → bind listener → spawn server → spawn broadcaster
//!     → start watcher → Running
//!
//! stop() / kill:
//!     Running|Starting → Stopping → registry.close_all → watcher close
//!     → server close → Stopped
//! ```
//!
//! # Design Decisions
//! - Explicit dependency injection: the controller holds direct references to
//!   the server, watcher, registry, and broadcaster; no global event bus
//! - The state machine is an explicit enum with a total transition function
//! - start/stop are idempotent; calling them in the wrong state is a no-op
//! - Fatal component errors fire the kill switch, which runs the same
//!   teardown and is idempotent

pub mod controller;
pub mod shutdown;
pub mod state;

pub use controller::{KillSwitch, LifecycleController, StartError};
pub use shutdown::Shutdown;
pub use state::ServerState;
