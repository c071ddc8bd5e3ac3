//! Slug checks for post identifiers.
//!
//! A slug is URL-safe when `slug::slugify` leaves it unchanged: lowercase
//! ASCII alphanumerics separated by single hyphens.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug is empty")]
    EmptyInput,
    #[error("slug `{input}` is not URL-safe (expected `{suggestion}`)")]
    NotUrlSafe { input: String, suggestion: String },
}

/// Accept `input` only if it is already in canonical slug form.
pub fn validate_slug(input: &str) -> Result<(), SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let canonical = slugify(input);
    if canonical != input {
        return Err(SlugError::NotUrlSafe {
            input: input.to_string(),
            suggestion: canonical,
        });
    }

    Ok(())
}

pub fn is_url_safe(input: &str) -> bool {
    validate_slug(input).is_ok()
}
