//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) / CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a run starts; changing it requires stop/start
//! - All fields except `root` have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ServeConfig;
pub use schema::TlsConfig;
