//! Post records served by the resolver.
//!
//! `PostMetadata` is the listing shape; `PostContent` adds the body and SEO
//! fields and is only ever resolved one slug at a time. Both are immutable
//! values: the cache replaces them wholesale.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{error::DomainError, slug::validate_slug};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
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
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoFields {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    #[serde(flatten)]
    pub metadata: PostMetadata,
    pub body: String,
    #[serde(default)]
    pub seo: SeoFields,
    #[serde(default)]
    pub related_media: Vec<MediaRef>,
}

impl PostMetadata {
    /// Reject records that would render as broken pages or broken links.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_slug(&self.slug).map_err(|err| DomainError::from_slug(&self.slug, err))?;

        if self.id.trim().is_empty() {
            return Err(DomainError::validation(&self.slug, "id must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::validation(
                &self.slug,
                "title must not be empty",
            ));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation(
                &self.slug,
                "category must not be empty",
            ));
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(DomainError::validation(&self.slug, "tags must not be blank"));
        }

        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

impl PostContent {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.metadata.validate()?;

        if self.body.trim().is_empty() {
            return Err(DomainError::validation(
                &self.metadata.slug,
                "body must not be empty",
            ));
        }
        if self.related_media.iter().any(|media| media.url.trim().is_empty()) {
            return Err(DomainError::validation(
                &self.metadata.slug,
                "related media must carry a url",
            ));
        }

        Ok(())
    }

    pub fn slug(&self) -> &str {
        &self.metadata.slug
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use time::macros::datetime;

    use super::*;

    pub fn metadata(slug: &str, title: &str) -> PostMetadata {
        PostMetadata {
            id: format!("id-{slug}"),
            slug: slug.to_string(),
            title: title.to_string(),
            excerpt: String::new(),
            author: "Equipe Clinica".to_string(),
            published_at: datetime!(2024-01-01 09:00 UTC),
            category: "geral".to_string(),
            tags: BTreeSet::new(),
            cover_image: format!("/images/blog/{slug}.webp"),
            featured: false,
        }
    }

    pub fn content(slug: &str, title: &str) -> PostContent {
        PostContent {
            metadata: metadata(slug, title),
            body: format!("<p>{title}</p>"),
            seo: SeoFields::default(),
            related_media: Vec::new(),
        }
    }
}
