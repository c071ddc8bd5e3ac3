use std::sync::Arc;

use crate::domain::listing::{self, TermCount};
use crate::domain::posts::{PostContent, PostMetadata};

use super::StaticCorpus;

/// Synchronous, read-only accessor over the static corpus alone.
///
/// For callers that cannot await (e.g. an initial server-side render). It
/// never consults the remote, the cache or the breaker, and holds nothing
/// but a shared handle to the immutable corpus.
#[derive(Debug, Clone)]
pub struct SyncCorpusView {
    corpus: Arc<StaticCorpus>,
}

impl SyncCorpusView {
    pub fn new(corpus: Arc<StaticCorpus>) -> Self {
        Self { corpus }
    }

    pub fn posts_metadata(&self) -> Vec<PostMetadata> {
        self.corpus.metadata().to_vec()
    }

    pub fn post_by_slug(&self, slug: &str) -> Option<PostContent> {
        self.corpus.post(slug).cloned()
    }

    pub fn recent_posts(&self, limit: usize) -> Vec<PostMetadata> {
        listing::recent(self.corpus.metadata(), limit)
    }

    pub fn featured_posts(&self, limit: usize) -> Vec<PostMetadata> {
        listing::featured(self.corpus.metadata(), limit)
    }

    pub fn posts_by_category(&self, category: &str) -> Vec<PostMetadata> {
        listing::by_category(self.corpus.metadata(), category)
    }

    pub fn search_posts(&self, term: &str) -> Vec<PostMetadata> {
        listing::search(self.corpus.metadata(), term)
    }

    pub fn categories(&self) -> Vec<TermCount> {
        listing::category_counts(self.corpus.metadata())
    }
}
