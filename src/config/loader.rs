//! Configuration loading from disk and the environment.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::bootstrap::ExecutionMode;
use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix for environment overrides, e.g. `STOREFRONT_DATABASE_URL`.
pub const ENV_PREFIX: &str = "STOREFRONT_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    Override { key: String, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    load_config_with_env(path, std::env::vars())
}

/// Like [`load_config`], with the execution mode forced to `mode` before
/// validation.
pub fn load_config_in_mode(path: &Path, mode: ExecutionMode) -> Result<AppConfig, ConfigError> {
    load_with(path, std::env::vars(), Some(mode))
}

/// Like [`load_config`] but with an explicit set of environment variables.
pub fn load_config_with_env<I>(path: &Path, vars: I) -> Result<AppConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    load_with(path, vars, None)
}

fn load_with<I>(path: &Path, vars: I, mode: Option<ExecutionMode>) -> Result<AppConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
        _ => ConfigError::Io(e),
    })?;
    let mut config: AppConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, vars)?;
    if let Some(mode) = mode {
        config.app.mode = mode;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `STOREFRONT_*` overrides. Unknown keys are ignored.
pub fn apply_env_overrides<I>(config: &mut AppConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let invalid = || ConfigError::Override {
            key: key.clone(),
            value: value.clone(),
        };

        match name {
            "DATABASE_URL" => config.database.url = value.clone(),
            "LOG_LEVEL" => config.observability.log_level = value.clone(),
            "LOG_FORMAT" => {
                config.observability.log_format = match value.to_ascii_lowercase().as_str() {
                    "pretty" => LogFormat::Pretty,
                    "json" => LogFormat::Json,
                    _ => return Err(invalid()),
                }
            }
            "MODE" => config.app.mode = value.parse().map_err(|_| invalid())?,
            "ADMIN_API_KEY" => config.admin.api_key = value.clone(),
            "CACHE_ENABLED" => config.cache.enabled = parse_bool(&value).ok_or_else(invalid)?,
            _ => {}
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
