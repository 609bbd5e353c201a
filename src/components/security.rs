//! Security component: CSRF tokens, origin checks and cookie policy.
//!
//! Optional: skipped when `security.enabled` is false.

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use rand::RngCore;

use crate::bootstrap::{Component, ComponentError};
use crate::components::{fill, AppContext};
use crate::config::SecurityConfig;

/// Length in bytes of generated CSRF tokens.
pub const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct SecurityContext {
    secure_cookies: bool,
    allowed_origins: Vec<String>,
}

impl SecurityContext {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            secure_cookies: config.secure_cookies,
            allowed_origins: config
                .allowed_origins
                .iter()
                .map(|o| o.trim_end_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    /// A fresh random token to store in the session and embed in forms.
    pub fn issue_csrf_token(&self) -> String {
        let mut bytes = [0u8; CSRF_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Compare a submitted token with the session's, in constant time.
    pub fn verify_csrf_token(&self, expected: &str, submitted: &str) -> bool {
        !expected.is_empty() && constant_time_eq(expected.as_bytes(), submitted.as_bytes())
    }

    /// An empty allow-list permits every origin.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        let origin = origin.trim_end_matches('/').to_ascii_lowercase();
        self.allowed_origins.iter().any(|o| *o == origin)
    }

    /// Attributes appended to every `Set-Cookie` header.
    pub fn cookie_attributes(&self) -> &'static str {
        if self.secure_cookies {
            "Path=/; HttpOnly; SameSite=Lax; Secure"
        } else {
            "Path=/; HttpOnly; SameSite=Lax"
        }
    }
}

pub struct SecurityComponent {
    ctx: Arc<AppContext>,
}

impl SecurityComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for SecurityComponent {
    fn is_available(&self) -> bool {
        self.ctx.config().is_some_and(|c| c.security.enabled)
    }

    fn initialize(&self) -> Result<(), ComponentError> {
        let config = self.ctx.require_config()?;
        let security = SecurityContext::from_config(&config.security);
        tracing::debug!(
            secure_cookies = config.security.secure_cookies,
            allowed_origins = config.security.allowed_origins.len(),
            "Security policy loaded"
        );
        fill(&self.ctx.security, security);
        Ok(())
    }
}
