//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - Structured logging; fields over string interpolation
//! - Metric updates are cheap (atomic operations behind the metrics facade)
//! - Per-client send failures are counted, not silently swallowed

pub mod logging;
pub mod metrics;
