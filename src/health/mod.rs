//! Health and readiness subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle controller (sole writer)
//!     → state.rs (NotReady → Ready → Draining)
//!     → ReadinessHandle clones in AppState
//!     → endpoints.rs (/ready reads the state; /health and /live do not)
//! ```
//!
//! # Design Decisions
//! - Readiness (can serve traffic) is distinct from liveness (process runs)
//! - No lock: one atomic, one writer, many readers

pub mod endpoints;
pub mod state;

pub use state::{Readiness, ReadinessHandle, ReadinessState};
