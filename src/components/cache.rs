//! Page cache.
//!
//! Rendered pages keyed by request path. Optional: the component is only
//! brought up when `cache.enabled` is set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::bootstrap::{Component, ComponentError};
use crate::components::{fill, AppContext};
use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CachedPage {
    body: String,
    stored_at: Instant,
}

/// A thread-safe page cache with a TTL and a size bound.
#[derive(Debug, Clone)]
pub struct PageCache {
    inner: Arc<DashMap<String, CachedPage>>,
    ttl: Duration,
    max_entries: usize,
}

impl PageCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            max_entries,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Fresh page for `key`; expired entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let entry = self.inner.get(key)?;
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.body.clone());
            }
        }
        let ttl = self.ttl;
        self.inner.remove_if(key, |_, page| page.stored_at.elapsed() >= ttl);
        None
    }

    /// Store a page, evicting expired entries and then the oldest one when
    /// the cache is full.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<String>) {
        let key = key.into();
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.purge_expired();
            if self.inner.len() >= self.max_entries {
                self.evict_oldest();
            }
        }
        self.inner.insert(
            key,
            CachedPage {
                body: body.into(),
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    /// Drop every page under `prefix`, e.g. `/products/` after a catalog edit.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.inner.len();
        self.inner.retain(|key, _| !key.starts_with(prefix));
        before - self.inner.len()
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        let ttl = self.ttl;
        self.inner.retain(|_, page| page.stored_at.elapsed() < ttl);
        before - self.inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|r| r.value().stored_at)
            .map(|r| r.key().clone());
        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }
}

pub struct CacheComponent {
    ctx: Arc<AppContext>,
}

impl CacheComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for CacheComponent {
    fn is_available(&self) -> bool {
        self.ctx.config().is_some_and(|c| c.cache.enabled)
    }

    fn initialize(&self) -> Result<(), ComponentError> {
        let config = self.ctx.require_config()?;
        fill(&self.ctx.cache, PageCache::from_config(&config.cache));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_insert_invalidate() {
        let cache = PageCache::new(Duration::from_secs(60), 10);
        assert!(cache.get("/").is_none());

        cache.insert("/", "<h1>home</h1>");
        assert_eq!(cache.get("/").as_deref(), Some("<h1>home</h1>"));

        assert!(cache.invalidate("/"));
        assert!(!cache.invalidate("/"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = PageCache::new(Duration::from_millis(20), 10);
        cache.insert("/cart", "cart");
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("/cart").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = PageCache::new(Duration::from_secs(60), 2);
        cache.insert("/a", "a");
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("/b", "b");
        cache.insert("/c", "c");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/a").is_none());
        assert!(cache.get("/c").is_some());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = PageCache::new(Duration::from_secs(60), 10);
        cache.insert("/products/1", "p1");
        cache.insert("/products/2", "p2");
        cache.insert("/cart", "cart");
        assert_eq!(cache.invalidate_prefix("/products/"), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unavailable_without_config_or_when_disabled() {
        let mut config = crate::config::AppConfig::default();
        config.cache.enabled = false;
        let ctx = AppContext::from_config(config.clone());
        let component = CacheComponent::new(ctx.clone());
        assert!(!component.is_available());

        ctx.config.set(config).unwrap();
        assert!(!component.is_available());
    }
}
