//! Config component: loads the application configuration.

use std::sync::Arc;

use crate::bootstrap::{Component, ComponentError};
use crate::components::{fill, AppContext, ConfigSource};
use crate::config::{load_config, load_config_in_mode, validation::validate_config, ConfigError};

pub struct ConfigComponent {
    ctx: Arc<AppContext>,
}

impl ConfigComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for ConfigComponent {
    fn initialize(&self) -> Result<(), ComponentError> {
        let config = match self.ctx.source() {
            ConfigSource::File(path) => {
                let loaded = match self.ctx.mode() {
                    Some(mode) => load_config_in_mode(path, mode),
                    None => load_config(path),
                };
                loaded.map_err(|e| match e {
                    ConfigError::Missing(_) => ComponentError::wrap("configuration missing", e),
                    other => ComponentError::wrap("failed to load configuration", other),
                })?
            }
            ConfigSource::Inline(config) => {
                let mut config = config.clone();
                if let Some(mode) = self.ctx.mode() {
                    config.app.mode = mode;
                }
                validate_config(&config).map_err(|errors| {
                    ComponentError::wrap("invalid configuration", ConfigError::Validation(errors))
                })?;
                config
            }
        };
        fill(&self.ctx.config, config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ExecutionMode;
    use crate::config::AppConfig;

    #[test]
    fn test_inline_config_is_stored() {
        let mut config = AppConfig::default();
        config.app.mode = ExecutionMode::Test;
        let ctx = AppContext::from_config(config.clone());

        ConfigComponent::new(ctx.clone()).initialize().unwrap();
        assert_eq!(ctx.config(), Some(&config));
    }

    #[test]
    fn test_missing_file_fails() {
        let ctx = AppContext::from_file("/nonexistent/storefront.toml");
        let err = ConfigComponent::new(ctx.clone()).initialize().unwrap_err();
        assert!(err.to_string().starts_with("configuration missing"));
        assert!(ctx.config().is_none());
    }

    #[test]
    fn test_invalid_inline_config_fails() {
        let ctx = AppContext::from_config(AppConfig::default());
        let err = ConfigComponent::new(ctx).initialize().unwrap_err();
        assert!(err.to_string().contains("admin.api_key"));
    }

    #[test]
    fn test_resolved_mode_overrides_file_mode() {
        let path = std::env::temp_dir().join(format!("storefront-mode-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[app]\nmode = \"production\"\n").unwrap();

        let strict = AppContext::from_file(&path);
        let err = ConfigComponent::new(strict).initialize().unwrap_err();
        assert!(err.to_string().contains("admin.api_key"));

        let relaxed = AppContext::new_in_mode(ConfigSource::File(path.clone()), ExecutionMode::Test);
        ConfigComponent::new(relaxed.clone()).initialize().unwrap();
        assert_eq!(relaxed.config().unwrap().app.mode, ExecutionMode::Test);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_inline_config_takes_resolved_mode() {
        let ctx = AppContext::new_in_mode(ConfigSource::Inline(AppConfig::default()), ExecutionMode::Cli);
        ConfigComponent::new(ctx.clone()).initialize().unwrap();
        assert_eq!(ctx.config().unwrap().app.mode, ExecutionMode::Cli);
    }

    #[test]
    fn test_reload_keeps_first_config() {
        let mut config = AppConfig::default();
        config.app.mode = ExecutionMode::Test;
        let ctx = AppContext::from_config(config.clone());
        let component = ConfigComponent::new(ctx.clone());
        component.initialize().unwrap();
        component.initialize().unwrap();
        assert_eq!(ctx.config(), Some(&config));
    }
}
