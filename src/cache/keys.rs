//! Cache key definitions.

use std::fmt;

use serde::Serialize;

/// Logical partition of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Listing metadata: small, list-oriented entries.
    Metadata,
    /// Full post bodies, cached on demand.
    Content,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Metadata => "metadata",
            Namespace::Content => "content",
        }
    }
}

/// Composite of query type and parameters, e.g. `content:presbiopia-ep1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The full metadata listing.
    MetadataAll,
    /// One full post by slug.
    Content(String),
}

impl CacheKey {
    pub fn content(slug: impl Into<String>) -> Self {
        Self::Content(slug.into())
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            CacheKey::MetadataAll => Namespace::Metadata,
            CacheKey::Content(_) => Namespace::Content,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::MetadataAll => f.write_str("metadata:all"),
            CacheKey::Content(slug) => write!(f, "content:{slug}"),
        }
    }
}
