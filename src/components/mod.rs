//! Concrete subsystems brought up by the bootstrap sequencer.
//!
//! # Data Flow
//! ```text
//! ConfigComponent   → AppContext.config
//! CacheComponent    → AppContext.cache      (reads config)
//! DatabaseComponent → AppContext.database   (reads config)
//! LoggerComponent   → global subscriber     (reads config, needs database)
//! SecurityComponent → AppContext.security   (reads config)
//! SessionComponent  → AppContext.sessions   (reads config, needs database)
//! ```
//!
//! # Design Decisions
//! - Each slot is a `OnceCell`: written once by its component, read-only after
//! - Components only read slots from earlier phases

pub mod cache;
pub mod config;
pub mod database;
pub mod logger;
pub mod security;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::bootstrap::{ComponentError, ComponentName, ComponentTable, ExecutionMode};
use crate::config::AppConfig;

pub use cache::{CacheComponent, PageCache};
pub use config::ConfigComponent;
pub use database::{Database, DatabaseComponent, DatabaseError};
pub use logger::LoggerComponent;
pub use security::{SecurityComponent, SecurityContext};
pub use session::{Session, SessionComponent, SessionManager};

/// Where the Config component gets its settings from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// TOML file plus `STOREFRONT_*` overrides.
    File(PathBuf),
    /// An already-built configuration (embedding, tests).
    Inline(AppConfig),
}

/// Shared handles filled in as components come up.
#[derive(Debug)]
pub struct AppContext {
    source: ConfigSource,
    mode: Option<ExecutionMode>,
    config: OnceCell<AppConfig>,
    cache: OnceCell<PageCache>,
    database: OnceCell<Database>,
    security: OnceCell<SecurityContext>,
    sessions: OnceCell<SessionManager>,
}

impl AppContext {
    pub fn new(source: ConfigSource) -> Arc<Self> {
        Self::build(source, None)
    }

    /// Context whose loaded config runs in `mode`, whatever the file says.
    /// Pass the same mode to the sequencer so both agree.
    pub fn new_in_mode(source: ConfigSource, mode: ExecutionMode) -> Arc<Self> {
        Self::build(source, Some(mode))
    }

    fn build(source: ConfigSource, mode: Option<ExecutionMode>) -> Arc<Self> {
        Arc::new(Self {
            source,
            mode,
            config: OnceCell::new(),
            cache: OnceCell::new(),
            database: OnceCell::new(),
            security: OnceCell::new(),
            sessions: OnceCell::new(),
        })
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Arc<Self> {
        Self::new(ConfigSource::File(path.into()))
    }

    pub fn from_config(config: AppConfig) -> Arc<Self> {
        Self::new(ConfigSource::Inline(config))
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn mode(&self) -> Option<ExecutionMode> {
        self.mode
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.get()
    }

    pub fn cache(&self) -> Option<&PageCache> {
        self.cache.get()
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.get()
    }

    pub fn security(&self) -> Option<&SecurityContext> {
        self.security.get()
    }

    pub fn sessions(&self) -> Option<&SessionManager> {
        self.sessions.get()
    }

    /// Config is loaded in phase 1; every later component depends on it.
    #[track_caller]
    pub(crate) fn require_config(&self) -> Result<&AppConfig, ComponentError> {
        match self.config.get() {
            Some(config) => Ok(config),
            None => Err(ComponentError::new("configuration has not been loaded")),
        }
    }
}

/// Store `value` in a one-shot slot. The first write wins: a slot filled by
/// an earlier (failed) bootstrap attempt is kept as is.
pub(crate) fn fill<T>(slot: &OnceCell<T>, value: T) {
    let _ = slot.set(value);
}

/// The six standard components wired to a shared context.
pub fn standard_components(ctx: &Arc<AppContext>) -> ComponentTable {
    ComponentTable::new()
        .with(ComponentName::Config, ConfigComponent::new(ctx.clone()))
        .with(ComponentName::Cache, CacheComponent::new(ctx.clone()))
        .with(ComponentName::Database, DatabaseComponent::new(ctx.clone()))
        .with(ComponentName::Logger, LoggerComponent::new(ctx.clone()))
        .with(ComponentName::Security, SecurityComponent::new(ctx.clone()))
        .with(ComponentName::Session, SessionComponent::new(ctx.clone()))
}
