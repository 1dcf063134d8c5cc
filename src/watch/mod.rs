//! Filesystem watching subsystem.
//!
//! # Data Flow
//! ```text
//! notify backend (OS watcher thread)
//!     → filter (extension allow-list, ignore globs)
//!     → per-path debounce timer
//!     → read file content
//!     → ChangeEvent → broadcast subsystem
//! ```
//!
//! # Design Decisions
//! - Filters run before the debounce so disallowed paths never schedule work
//! - One pending timer per distinct path; a burst of edits to the same file
//!   yields one event carrying the last-observed content
//! - Read failures during the debounce window are logged and skipped
//! - A watcher-level fatal error triggers the run's kill sequence

pub mod watcher;

pub use watcher::{ChangeEvent, FileWatcher, WatchError, WATCHED_EXTENSIONS};
