//! Wire types for the remote blog content API.
//!
//! The remote service exposes two read endpoints:
//!
//! - `GET {base}/posts` returns a [`PostListEnvelope`] of summaries.
//! - `GET {base}/posts/{slug}` returns a single [`RemotePost`], or 404 when the
//!   slug is unknown.
//!
//! These shapes mirror the JSON payloads exactly; validation and conversion
//! into domain records happen in the consuming crate.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Listing payload for `GET /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListEnvelope {
    pub posts: Vec<RemotePostSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Lightweight post summary used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePostSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub featured: bool,
}

/// Full post payload for `GET /posts/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePost {
    #[serde(flatten)]
    pub summary: RemotePostSummary,
    pub body: String,
    #[serde(default)]
    pub seo: RemoteSeo,
    #[serde(default)]
    pub related_media: Vec<RemoteMedia>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSeo {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
}

/// Reference to an image or video attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMedia {
    pub url: String,
    #[serde(default = "default_media_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

fn default_media_kind() -> String {
    "image".to_string()
}
