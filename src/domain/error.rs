use thiserror::Error;

use super::slug::SlugError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post `{slug}` failed validation: {message}")]
    Validation { slug: String, message: String },
    #[error("domain invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn validation(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            slug: slug.into(),
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub(crate) fn from_slug(slug: &str, err: SlugError) -> Self {
        Self::validation(slug, err.to_string())
    }
}
