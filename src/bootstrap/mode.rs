//! Execution mode of the current process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`ExecutionMode::from_env`].
pub const MODE_ENV_VAR: &str = "STOREFRONT_MODE";

/// Whether the process is serving traffic or running as a tool/test harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Production,
    Cli,
    Test,
}

impl ExecutionMode {
    /// Read the mode from `STOREFRONT_MODE`; unset or unrecognised means
    /// production.
    pub fn from_env() -> Self {
        std::env::var(MODE_ENV_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// State-wiping operations (such as bootstrap reset) are limited to
    /// non-production modes.
    pub fn permits_reset(self) -> bool {
        !matches!(self, ExecutionMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Production => "production",
            ExecutionMode::Cli => "cli",
            ExecutionMode::Test => "test",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown execution mode `{0}`")]
pub struct UnknownMode(pub String);

impl FromStr for ExecutionMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(ExecutionMode::Production),
            "cli" => Ok(ExecutionMode::Cli),
            "test" => Ok(ExecutionMode::Test),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
