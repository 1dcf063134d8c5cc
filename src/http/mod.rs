//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request dispatch)
//!     → websocket.rs (upgrade requests → client registry)
//!     → static_files.rs (everything else: resolve, read, content-type)
//! ```

pub mod server;
pub mod static_files;
pub mod websocket;

pub use server::StaticServer;
