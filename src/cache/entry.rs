use std::time::{Duration, Instant};

use super::keys::CacheKey;

/// A cached value with its storage time and lifetime.
///
/// Valid iff `now < stored_at + ttl`; a zero TTL is never valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(key: CacheKey, value: V, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            key,
            value,
            stored_at,
            ttl,
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}
