//! Static fallback corpus.
//!
//! A read-only set of complete posts, either bundled into the binary from
//! `corpus/posts.toml` or loaded from a configured file at start-up. It is the
//! source of truth whenever the remote content API cannot be used.

mod view;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::posts::{PostContent, PostMetadata};

pub use view::SyncCorpusView;

const BUNDLED_CORPUS: &str = include_str!("../../corpus/posts.toml");

static BUNDLED: OnceCell<Arc<StaticCorpus>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse corpus: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    InvalidPost(#[from] DomainError),
    #[error("slug `{slug}` appears more than once in the corpus")]
    DuplicateSlug { slug: String },
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    posts: Vec<PostContent>,
}

#[derive(Debug, Clone)]
pub struct StaticCorpus {
    posts: Vec<PostContent>,
    metadata: Vec<PostMetadata>,
    index: HashMap<String, usize>,
}

impl StaticCorpus {
    /// The corpus compiled into the binary. Parsed once per process.
    pub fn bundled() -> Result<Arc<Self>, CorpusError> {
        BUNDLED
            .get_or_try_init(|| Self::from_toml_str(BUNDLED_CORPUS).map(Arc::new))
            .map(Arc::clone)
    }

    pub async fn from_path(path: &Path) -> Result<Self, CorpusError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CorpusError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CorpusError> {
        let file: CorpusFile = toml::from_str(raw)?;
        Self::from_posts(file.posts)
    }

    /// Validate and index `posts`, newest first.
    pub fn from_posts(mut posts: Vec<PostContent>) -> Result<Self, CorpusError> {
        for post in &posts {
            post.validate()?;
        }

        posts.sort_by(|left, right| {
            right
                .metadata
                .published_at
                .cmp(&left.metadata.published_at)
                .then_with(|| left.metadata.slug.cmp(&right.metadata.slug))
        });

        let mut index = HashMap::with_capacity(posts.len());
        for (position, post) in posts.iter().enumerate() {
            if index.insert(post.slug().to_string(), position).is_some() {
                return Err(CorpusError::DuplicateSlug {
                    slug: post.slug().to_string(),
                });
            }
        }

        let metadata = posts.iter().map(|post| post.metadata.clone()).collect();

        Ok(Self {
            posts,
            metadata,
            index,
        })
    }

    pub fn metadata(&self) -> &[PostMetadata] {
        &self.metadata
    }

    pub fn post(&self, slug: &str) -> Option<&PostContent> {
        self.index.get(slug).map(|&position| &self.posts[position])
    }

    pub fn posts(&self) -> &[PostContent] {
        &self.posts
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.posts.iter().map(PostContent::slug)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
