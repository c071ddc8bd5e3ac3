use serde::Serialize;

use super::keys::Namespace;

/// Running counters for one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room (LRU).
    pub evictions: u64,
    /// Entries dropped because their TTL ran out.
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize,
}

impl NamespaceStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub metadata: NamespaceStats,
    pub content: NamespaceStats,
}

impl CacheStats {
    pub fn namespace(&self, namespace: Namespace) -> &NamespaceStats {
        match namespace {
            Namespace::Metadata => &self.metadata,
            Namespace::Content => &self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_empty_counters() {
        assert_eq!(NamespaceStats::default().hit_ratio(), 0.0);

        let stats = NamespaceStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.lookups(), 4);
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
