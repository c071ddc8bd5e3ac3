//! Cache storage.
//!
//! Each namespace is a [`Tier`]: an LRU map of [`CacheEntry`] values with a
//! default TTL and its own counters. [`TieredCache`] owns one tier per
//! namespace and is shared by handle, never as a global.

use std::num::NonZeroUsize;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use lru::LruCache;
use metrics::counter;

use crate::clock::Clock;
use crate::domain::posts::{PostContent, PostMetadata};
use crate::lock::mutex_lock;

use super::config::CacheConfig;
use super::entry::CacheEntry;
use super::keys::{CacheKey, Namespace};
use super::stats::{CacheStats, NamespaceStats};

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "lectern_cache_hit_total";
const METRIC_MISS: &str = "lectern_cache_miss_total";
const METRIC_EVICT: &str = "lectern_cache_evict_total";
const METRIC_EXPIRE: &str = "lectern_cache_expire_total";

// ============================================================================
// Tier: one namespace
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }
}

/// TTL + LRU store for a single namespace.
///
/// Expiry is checked lazily: an expired entry is removed by the `get` that
/// finds it, which also counts as a miss.
pub struct Tier<V> {
    namespace: Namespace,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<LruCache<CacheKey, CacheEntry<V>>>,
    counters: Counters,
}

impl<V: Clone> Tier<V> {
    fn new(
        namespace: Namespace,
        capacity: NonZeroUsize,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            namespace,
            default_ttl,
            clock,
            entries: Mutex::new(LruCache::new(capacity)),
            counters: Counters::default(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "tier_get");

        match entries.peek(key).map(|entry| entry.is_valid_at(now)) {
            None => {
                drop(entries);
                self.note_miss();
                return None;
            }
            Some(false) => {
                entries.pop(key);
                drop(entries);
                self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                counter!(METRIC_EXPIRE, "namespace" => self.namespace.as_str()).increment(1);
                self.note_miss();
                return None;
            }
            Some(true) => {}
        }

        let value = entries.get(key).map(|entry| entry.value.clone());
        drop(entries);
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_HIT, "namespace" => self.namespace.as_str()).increment(1);
        value
    }

    /// Store `value` under the tier's default TTL.
    pub fn set(&self, key: CacheKey, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry::new(key.clone(), value, self.clock.now(), ttl);
        let displaced = mutex_lock(&self.entries, SOURCE, "tier_set").push(key.clone(), entry);

        // `push` also hands back the previous value of a replaced key.
        let evicted = matches!(displaced, Some((displaced_key, _)) if displaced_key != key);
        if evicted {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            counter!(METRIC_EVICT, "namespace" => self.namespace.as_str()).increment(1);
        }
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        mutex_lock(&self.entries, SOURCE, "tier_invalidate")
            .pop(key)
            .is_some()
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "tier_clear").clear();
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "tier_purge_expired");

        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        drop(entries);

        let removed = stale.len();
        if removed > 0 {
            self.counters
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
            counter!(METRIC_EXPIRE, "namespace" => self.namespace.as_str())
                .increment(removed as u64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "tier_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> NamespaceStats {
        let (size, capacity) = {
            let entries = mutex_lock(&self.entries, SOURCE, "tier_stats");
            (entries.len(), entries.cap().get())
        };

        NamespaceStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            size,
            capacity,
        }
    }

    fn reset_stats(&self) {
        self.counters.reset();
    }

    fn note_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_MISS, "namespace" => self.namespace.as_str()).increment(1);
    }
}

// ============================================================================
// TieredCache: both namespaces
// ============================================================================

pub struct TieredCache {
    metadata: Tier<Vec<PostMetadata>>,
    content: Tier<PostContent>,
}

impl TieredCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            metadata: Tier::new(
                Namespace::Metadata,
                config.metadata_capacity_non_zero(),
                config.metadata_ttl,
                Arc::clone(&clock),
            ),
            content: Tier::new(
                Namespace::Content,
                config.content_capacity_non_zero(),
                config.content_ttl,
                clock,
            ),
        }
    }

    pub fn metadata(&self) -> &Tier<Vec<PostMetadata>> {
        &self.metadata
    }

    pub fn content(&self) -> &Tier<PostContent> {
        &self.content
    }

    /// Remove one key from whichever namespace it belongs to.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        match key.namespace() {
            Namespace::Metadata => self.metadata.invalidate(key),
            Namespace::Content => self.content.invalidate(key),
        }
    }

    pub fn clear(&self, namespace: Namespace) {
        match namespace {
            Namespace::Metadata => self.metadata.clear(),
            Namespace::Content => self.content.clear(),
        }
    }

    pub fn clear_all(&self) {
        self.metadata.clear();
        self.content.clear();
    }

    pub fn purge_expired(&self) -> usize {
        self.metadata.purge_expired() + self.content.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            metadata: self.metadata.stats(),
            content: self.content.stats(),
        }
    }

    /// Zero the counters. Entries are kept.
    pub fn reset_stats(&self) {
        self.metadata.reset_stats();
        self.content.reset_stats();
    }
}
