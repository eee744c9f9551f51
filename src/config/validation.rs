//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ConfigViolation>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and report all violations together.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut errors = Vec::new();
    let mut violation = |field, message: &str| {
        errors.push(ConfigViolation {
            field,
            message: message.to_string(),
        })
    };

    if config.listener.port == 0 {
        violation("listener.port", "must be a positive integer");
    }
    if config.listener.host.is_empty() {
        violation("listener.host", "must not be empty");
    }
    if config.timeouts.request_secs == 0 {
        violation("timeouts.request_secs", "must be greater than zero");
    }
    if config.timeouts.shutdown_secs == 0 {
        violation("timeouts.shutdown_secs", "must be greater than zero");
    }
    if config.limits.max_body_bytes == 0 {
        violation("limits.max_body_bytes", "must be greater than zero");
    }
    if config
        .observability
        .exclude_paths
        .iter()
        .any(|p| !p.starts_with('/'))
    {
        violation("observability.exclude_paths", "paths must start with '/'");
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        violation("observability.metrics_address", "must be a socket address");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_violation() {
        let mut config = ServiceConfig::default();
        config.listener.port = 0;
        config.timeouts.shutdown_secs = 0;
        config.observability.exclude_paths = vec!["live".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.port",
                "timeouts.shutdown_secs",
                "observability.exclude_paths"
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
