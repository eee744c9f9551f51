//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional config file (TOML, loader.rs)
//!     → environment overrides: PORT, APP_ENV, LOG_LEVEL (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::{
    Environment, LimitsConfig, ListenerConfig, LogLevel, ObservabilityConfig, ServiceConfig,
    TimeoutConfig,
};
