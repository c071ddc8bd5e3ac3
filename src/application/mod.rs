//! Content resolution services.

pub mod error;
pub mod outcome;
pub mod preload;
pub mod resolver;
pub mod source;

pub use outcome::PostLookup;
pub use preload::{PreloadConfig, PreloadReport, Preloader};
pub use resolver::{Resolver, ResolverConfig};
pub use source::{ContentSource, SourceError};
