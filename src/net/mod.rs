//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs (bind, EADDRINUSE fallback)
//!     → tls.rs (optional TLS material)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind conflicts fall back to an OS-assigned ephemeral port
//! - The fallback is bounded; it never retries forever
//! - TLS is optional and handled transparently by the HTTP layer

pub mod listener;
pub mod tls;

pub use listener::{bind_with_fallback, ListenerError};
