//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Pick pretty or JSON output from config
//! - Honour `RUST_LOG`, falling back to the configured level

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter `{directive}`: {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
}

/// Whether a subscriber was installed by this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingInit {
    Installed,
    /// Another global subscriber was already set; it is kept.
    AlreadyInstalled,
}

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn build_filter(config: &ObservabilityConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| LoggingError::InvalidFilter {
        directive: config.log_level.clone(),
        source,
    })
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<LoggingInit, LoggingError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    match installed {
        Ok(()) => Ok(LoggingInit::Installed),
        Err(_) => Ok(LoggingInit::AlreadyInstalled),
    }
}
