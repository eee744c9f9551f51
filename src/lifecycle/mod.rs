//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     Bind listener → Mark ready → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Mark draining → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGHUP → Trigger graceful shutdown
//!
//! Fatal (fatal.rs):
//!     Panic outside a request → Log → Exit 1
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listener first, readiness only once bound
//! - Ordered shutdown: readiness off, stop accept, drain, close
//! - Shutdown has timeout: forced exit after deadline

pub mod controller;
pub mod fatal;
pub mod shutdown;
pub mod signals;

pub use controller::{Lifecycle, ShutdownOutcome, StartupError};
pub use shutdown::Shutdown;
