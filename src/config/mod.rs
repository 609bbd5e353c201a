//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → STOREFRONT_* environment overrides
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → held by the shared AppContext for later components
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_in_mode, ConfigError};
pub use schema::AppConfig;
pub use schema::{AdminConfig, CacheConfig, DatabaseConfig, LogFormat, ObservabilityConfig};
pub use schema::{SecurityConfig, SessionConfig};
