//! Logger component: installs structured logging once the database is up.

use std::sync::Arc;

use crate::bootstrap::{Component, ComponentError};
use crate::components::AppContext;
use crate::observability::logging::{init_logging, LoggingInit};

pub struct LoggerComponent {
    ctx: Arc<AppContext>,
}

impl LoggerComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for LoggerComponent {
    fn initialize(&self) -> Result<(), ComponentError> {
        let config = self.ctx.require_config()?;
        if self.ctx.database().is_none() {
            return Err(ComponentError::new("database must be ready before logging"));
        }

        let outcome = init_logging(&config.observability)
            .map_err(|e| ComponentError::wrap("failed to initialize logging", e))?;

        tracing::info!(
            app = %config.app.name,
            level = %config.observability.log_level,
            format = ?config.observability.log_format,
            reused_subscriber = outcome == LoggingInit::AlreadyInstalled,
            "Logging initialized"
        );
        Ok(())
    }
}
