//! Minimal production HTTP service skeleton.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod schemas;

pub use config::ServiceConfig;
pub use error::{ApiError, AppError};
pub use lifecycle::{Lifecycle, Shutdown, ShutdownOutcome, StartupError};
pub use routing::{Route, Routes};
