//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (exact method + path lookup)
//!     → Return: matched Route or no-match
//!
//! Route table (at startup):
//!     Routes::defaults() (+ any custom routes)
//!     → Freeze as immutable Routes behind an Arc
//! ```
//!
//! # Design Decisions
//! - Routes defined at startup, immutable at runtime
//! - Exact literal paths only, no patterns
//! - Deterministic: same input always matches same route

pub mod router;

pub use router::{greeting, HandlerResult, Route, Routes, GREETING};
