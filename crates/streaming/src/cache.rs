use std::sync::Arc;

use foundation::time::Time;
use scene::event::EventCollection;

pub const DEFAULT_TTL_MS: u64 = 2 * 60 * 1_000;

#[derive(Debug, Clone)]
pub struct CachedFeed {
    pub collection: Arc<EventCollection>,
    pub fetched_at: Time,
}

/// Single-entry response cache with a fixed validity window.
///
/// The window starts at the last successful store. Failures never touch the
/// cache, so a stale entry is never served as a fallback.
#[derive(Debug)]
pub struct FeedCache {
    ttl_ms: u64,
    entry: Option<CachedFeed>,
}

impl FeedCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl_ms, entry: None }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn fetched_at(&self) -> Option<Time> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }

    pub fn is_fresh(&self, now: Time) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.millis_since(e.fetched_at) < self.ttl_ms)
    }

    /// The cached collection if it is still within the window.
    pub fn get_fresh(&self, now: Time) -> Option<Arc<EventCollection>> {
        if !self.is_fresh(now) {
            return None;
        }
        self.entry.as_ref().map(|e| Arc::clone(&e.collection))
    }

    pub fn store(&mut self, collection: Arc<EventCollection>, now: Time) {
        self.entry = Some(CachedFeed {
            collection,
            fetched_at: now,
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}
