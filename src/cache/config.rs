//! Cache configuration.
//!
//! Sizes and lifetimes for the `metadata` and `content` tiers.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_METADATA_CAPACITY: usize = 200;
const DEFAULT_METADATA_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CONTENT_CAPACITY: usize = 50;
const DEFAULT_CONTENT_TTL_SECS: u64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entries in the metadata tier.
    pub metadata_capacity: usize,
    /// Lifetime of a metadata entry.
    pub metadata_ttl: Duration,
    /// Maximum full posts in the content tier.
    pub content_capacity: usize,
    /// Lifetime of a content entry.
    pub content_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_capacity: DEFAULT_METADATA_CAPACITY,
            metadata_ttl: Duration::from_secs(DEFAULT_METADATA_TTL_SECS),
            content_capacity: DEFAULT_CONTENT_CAPACITY,
            content_ttl: Duration::from_secs(DEFAULT_CONTENT_TTL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            metadata_capacity: settings.metadata_capacity.get(),
            metadata_ttl: settings.metadata_ttl,
            content_capacity: settings.content_capacity.get(),
            content_ttl: settings.content_ttl,
        }
    }
}

impl CacheConfig {
    /// Returns the metadata capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn metadata_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.metadata_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the content capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn content_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.content_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.metadata_capacity, 200);
        assert_eq!(config.metadata_ttl, Duration::from_secs(300));
        assert_eq!(config.content_capacity, 50);
        assert_eq!(config.content_ttl, Duration::from_secs(900));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            metadata_capacity: 0,
            content_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.metadata_capacity_non_zero().get(), 1);
        assert_eq!(config.content_capacity_non_zero().get(), 1);
    }
}
