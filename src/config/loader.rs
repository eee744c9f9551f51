//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ConfigViolation};

/// Environment variable overriding `listener.port`.
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding `environment`.
pub const ENV_APP_ENV: &str = "APP_ENV";
/// Environment variable overriding `observability.log_level`.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid values in environment: {}", .0.iter().map(|e| e.name).collect::<Vec<_>>().join(", "))]
    Env(Vec<EnvError>),

    #[error("Validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ConfigViolation>),
}

/// One environment variable that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvError {
    pub name: &'static str,
    pub reason: String,
}

/// Resolve the effective configuration: defaults, then the optional file,
/// then environment overrides, then validation.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ServiceConfig::default(),
    };
    apply_env(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply `PORT`, `APP_ENV` and `LOG_LEVEL` overrides.
///
/// Every invalid variable is collected before failing, so one run reports
/// all of them.
pub fn apply_env<I, K, V>(config: &mut ServiceConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut errors = Vec::new();

    for (key, value) in vars {
        let value = value.as_ref();
        match key.as_ref() {
            ENV_PORT => match value.parse::<u16>() {
                Ok(port) if port > 0 => config.listener.port = port,
                _ => errors.push(EnvError {
                    name: ENV_PORT,
                    reason: format!("expected a positive integer, got {value:?}"),
                }),
            },
            ENV_APP_ENV => match value.parse() {
                Ok(environment) => config.environment = environment,
                Err(reason) => errors.push(EnvError {
                    name: ENV_APP_ENV,
                    reason,
                }),
            },
            ENV_LOG_LEVEL => match value.parse() {
                Ok(level) => config.observability.log_level = level,
                Err(reason) => errors.push(EnvError {
                    name: ENV_LOG_LEVEL,
                    reason,
                }),
            },
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Env(errors))
    }
}
