use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::content::types::ContentItem;

/// Source of the current time for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()) }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    items: Vec<ContentItem>,
}

/// Time-bounded cache of fetched items keyed by content type
///
/// A zero TTL means nothing is ever fresh, which turns caching off while
/// still keeping the last good response around as a stale fallback.
#[derive(Debug)]
pub struct ContentCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContentCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> ContentCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh items for `content_type`, if any
    pub fn get(&self, content_type: &str) -> Option<Vec<ContentItem>> {
        let now = self.clock.now();
        let entries = self.entries();
        let entry = entries.get(content_type)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(entry.items.clone())
        } else {
            debug!("Cache entry for '{}' expired", content_type);
            None
        }
    }

    /// Last stored items for `content_type`, fresh or not
    pub fn get_stale(&self, content_type: &str) -> Option<Vec<ContentItem>> {
        self.entries().get(content_type).map(|e| e.items.clone())
    }

    pub fn put(&self, content_type: &str, items: Vec<ContentItem>) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            items,
        };
        self.entries().insert(content_type.to_string(), entry);
    }

    /// Drop one content type; returns whether it was cached
    pub fn invalidate(&self, content_type: &str) -> bool {
        self.entries().remove(content_type).is_some()
    }

    pub fn invalidate_all(&self) {
        self.entries().clear();
    }
}
