//! Session component.
//!
//! # Responsibilities
//! - Own the in-process session store
//! - Start the session subsystem exactly once (restarting is a no-op)
//!
//! # Design Decisions
//! - Sessions expire after an idle TTL; reads past the TTL drop the entry
//! - Session ids are random UUID v4 values

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::bootstrap::{Component, ComponentError};
use crate::components::AppContext;
use crate::config::SessionConfig;

/// A visitor session: cart contents, login state, CSRF token.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub values: HashMap<String, String>,
    created_at: Instant,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            values: HashMap::new(),
            created_at: now,
            last_seen: now,
        }
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

#[derive(Debug)]
pub struct SessionManager {
    sessions: DashMap<Uuid, Session>,
    cookie_name: String,
    ttl: Duration,
    started: AtomicBool,
}

impl SessionManager {
    pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: cookie_name.into(),
            ttl,
            started: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.clone(), Duration::from_secs(config.ttl_secs))
    }

    /// Start the subsystem. Returns `false` if it was already active.
    pub fn start(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Open a new session and return its id.
    pub fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    /// Snapshot of a live session. Expired sessions are removed.
    pub fn get(&self, id: &Uuid) -> Option<Session> {
        {
            let session = self.sessions.get(id)?;
            if !session.is_expired(self.ttl) {
                return Some(session.clone());
            }
        }
        let ttl = self.ttl;
        self.sessions.remove_if(id, |_, s| s.is_expired(ttl));
        None
    }

    /// Refresh the idle timer. Returns `false` for unknown or expired ids.
    pub fn touch(&self, id: &Uuid) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.is_expired(self.ttl) => {
                session.last_seen = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Store a value on a live session and refresh it.
    pub fn set(&self, id: &Uuid, key: impl Into<String>, value: impl Into<String>) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.is_expired(self.ttl) => {
                session.values.insert(key.into(), value.into());
                session.last_seen = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub fn destroy(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, s| !s.is_expired(ttl));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub struct SessionComponent {
    ctx: Arc<AppContext>,
}

impl SessionComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for SessionComponent {
    fn initialize(&self) -> Result<(), ComponentError> {
        let config = self.ctx.require_config()?;
        if self.ctx.database().is_none() {
            return Err(ComponentError::new("database must be ready before sessions"));
        }

        let manager = self
            .ctx
            .sessions
            .get_or_init(|| SessionManager::from_config(&config.session));
        if manager.start() {
            tracing::info!(
                cookie = %manager.cookie_name(),
                ttl_secs = config.session.ttl_secs,
                "Session store started"
            );
        } else {
            tracing::debug!("Session store already active");
        }
        Ok(())
    }
}
