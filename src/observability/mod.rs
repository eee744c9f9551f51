//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher produces:
//!     → request_log.rs ("Incoming request" / "Request completed" records)
//!     → metrics.rs (counters, histograms)
//!     → logging.rs (subscriber: level filter, JSON or pretty output)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every request-scoped record
//! - Health-check paths can be excluded to avoid flooding logs

pub mod logging;
pub mod metrics;
pub mod request_log;

pub use request_log::{CompletionHook, RequestLogger};
