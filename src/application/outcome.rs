use serde::Serialize;

use crate::domain::posts::PostContent;

/// Result of resolving a single post.
///
/// `NotFound` means neither source knows the slug (a bad link).
/// `FallbackExhausted` means the remote could not be used and the static
/// corpus lacks the slug. Callers usually render both as "not found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "post", rename_all = "snake_case")]
pub enum PostLookup {
    Found(PostContent),
    NotFound,
    FallbackExhausted,
}

impl PostLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, PostLookup::Found(_))
    }

    pub fn into_post(self) -> Option<PostContent> {
        match self {
            PostLookup::Found(post) => Some(post),
            PostLookup::NotFound | PostLookup::FallbackExhausted => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostLookup::Found(_) => "found",
            PostLookup::NotFound => "not_found",
            PostLookup::FallbackExhausted => "fallback_exhausted",
        }
    }
}
