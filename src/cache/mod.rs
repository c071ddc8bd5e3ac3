//! Tiered post cache.
//!
//! Two namespaces with independent capacity and lifetime:
//!
//! - **metadata**: the listing set, keyed `metadata:all`
//! - **content**: full posts fetched on demand, keyed `content:{slug}`
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! metadata_capacity = 200
//! metadata_ttl_seconds = 300
//! content_capacity = 50
//! content_ttl_seconds = 900
//! ```

mod config;
mod entry;
mod keys;
mod stats;
mod store;

pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use keys::{CacheKey, Namespace};
pub use stats::{CacheStats, NamespaceStats};
pub use store::{Tier, TieredCache};
