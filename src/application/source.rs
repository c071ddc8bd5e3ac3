//! Port for the remote content API.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::posts::{PostContent, PostMetadata};

/// Every way a remote call can fail. The resolver treats all of them as one
/// breaker failure; the variants only sharpen logs and metrics.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("remote responded with status {0}")]
    Status(u16),
    #[error("malformed remote payload: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport(_) => "transport",
            SourceError::Timeout(_) => "timeout",
            SourceError::Status(_) => "status",
            SourceError::Malformed(_) => "malformed",
        }
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Metadata for every published post.
    async fn list_posts(&self) -> Result<Vec<PostMetadata>, SourceError>;

    /// One full post; `Ok(None)` when the remote has no such slug.
    async fn post_by_slug(&self, slug: &str) -> Result<Option<PostContent>, SourceError>;
}
