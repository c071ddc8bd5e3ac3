//! Resolution of blog content across cache, remote API and static corpus.
//!
//! Every operation follows the same order: a live cache entry wins, then the
//! remote source if the breaker lets the call through, then the static corpus.
//! Remote failures are absorbed here; callers only ever see data or a
//! [`PostLookup`] that says why nothing was found.

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, RwLock},
    time::Duration,
};

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    breaker::{BreakerSnapshot, CircuitBreaker},
    cache::{CacheKey, CacheStats, TieredCache},
    corpus::StaticCorpus,
    domain::{
        listing::{self, TermCount},
        posts::{PostContent, PostMetadata},
        slug::is_url_safe,
        types::DataSource,
    },
    lock::{rw_read, rw_write},
};

use super::{
    outcome::PostLookup,
    source::{ContentSource, SourceError},
};

const SOURCE: &str = "application::resolver";
const METRIC_RESOLUTION: &str = "lectern_resolution_total";
const METRIC_REMOTE_FETCH_MS: &str = "lectern_remote_fetch_ms";

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub remote_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

impl From<&crate::config::RemoteSettings> for ResolverConfig {
    fn from(value: &crate::config::RemoteSettings) -> Self {
        Self {
            remote_timeout: value.timeout,
        }
    }
}

/// Who is asking. Background work never claims the half-open trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Priority {
    Foreground,
    Background,
}

enum Gate {
    Remote(Arc<dyn ContentSource>),
    Denied,
    Offline,
}

struct Inner {
    source: Option<Arc<dyn ContentSource>>,
    breaker: Arc<CircuitBreaker>,
    cache: Arc<TieredCache>,
    corpus: Arc<StaticCorpus>,
    config: ResolverConfig,
    last_source: RwLock<Option<DataSource>>,
}

/// Cheap to clone; clones share breaker, cache and corpus.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("online", &self.inner.source.is_some())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Resolver {
    /// Build a resolver. `source` is `None` when running corpus-only.
    pub fn new(
        source: Option<Arc<dyn ContentSource>>,
        breaker: Arc<CircuitBreaker>,
        cache: Arc<TieredCache>,
        corpus: Arc<StaticCorpus>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                breaker,
                cache,
                corpus,
                config,
                last_source: RwLock::new(None),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.source.is_some()
    }

    // ====================================================================
    // Listings
    // ====================================================================

    pub async fn posts_metadata(&self) -> Vec<PostMetadata> {
        let (posts, _) = self.metadata_with(Priority::Foreground, "posts_metadata").await;
        posts
    }

    pub async fn recent_posts(&self, limit: usize) -> Vec<PostMetadata> {
        listing::recent(&self.posts_metadata().await, limit)
    }

    pub async fn featured_posts(&self, limit: usize) -> Vec<PostMetadata> {
        listing::featured(&self.posts_metadata().await, limit)
    }

    pub async fn posts_by_category(&self, category: &str) -> Vec<PostMetadata> {
        listing::by_category(&self.posts_metadata().await, category)
    }

    pub async fn posts_by_tag(&self, tag: &str) -> Vec<PostMetadata> {
        listing::by_tag(&self.posts_metadata().await, tag)
    }

    pub async fn related_posts(&self, slug: &str, limit: usize) -> Vec<PostMetadata> {
        listing::related(&self.posts_metadata().await, slug, limit)
    }

    pub async fn search_posts(&self, term: &str) -> Vec<PostMetadata> {
        listing::search(&self.posts_metadata().await, term)
    }

    pub async fn categories(&self) -> Vec<TermCount> {
        listing::category_counts(&self.posts_metadata().await)
    }

    pub async fn tags(&self) -> Vec<TermCount> {
        listing::tag_counts(&self.posts_metadata().await)
    }

    pub(crate) async fn featured_posts_background(
        &self,
        limit: usize,
    ) -> (Vec<PostMetadata>, DataSource) {
        let (posts, source) = self
            .metadata_with(Priority::Background, "preload_featured")
            .await;
        (listing::featured(&posts, limit), source)
    }

    pub(crate) async fn recent_posts_background(
        &self,
        limit: usize,
    ) -> (Vec<PostMetadata>, DataSource) {
        let (posts, source) = self
            .metadata_with(Priority::Background, "preload_recent")
            .await;
        (listing::recent(&posts, limit), source)
    }

    /// Re-fetch the listing, skipping the cache read and the breaker gate.
    ///
    /// The outcome still reaches the breaker; a success closes it from any
    /// state. Falls back to the corpus when the remote fails.
    pub async fn force_refresh(&self) -> Vec<PostMetadata> {
        const OPERATION: &str = "force_refresh";

        let Some(source) = self.inner.source.clone() else {
            return self.metadata_fallback(OPERATION);
        };

        info!(target = "lectern::resolver", "forcing metadata refresh");
        match self.call_remote(OPERATION, source, fetch_listing).await {
            Ok(posts) => self.store_metadata(OPERATION, posts),
            Err(err) => {
                warn!(
                    target = "lectern::resolver",
                    operation = OPERATION,
                    kind = err.kind(),
                    error = %err,
                    "forced refresh failed, serving static corpus"
                );
                self.metadata_fallback(OPERATION)
            }
        }
    }

    // ====================================================================
    // Single posts
    // ====================================================================

    pub async fn post_by_slug(&self, slug: &str) -> PostLookup {
        const OPERATION: &str = "post_by_slug";

        if !is_url_safe(slug) {
            debug!(target = "lectern::resolver", slug, "rejecting malformed slug");
            record_resolution(OPERATION, None);
            return PostLookup::NotFound;
        }

        let key = CacheKey::content(slug);
        if let Some(post) = self.inner.cache.content().get(&key) {
            self.mark(OPERATION, DataSource::Remote);
            return PostLookup::Found(post);
        }

        match self.gate(Priority::Foreground) {
            Gate::Remote(source) => {
                let requested = slug.to_string();
                let result = self
                    .call_remote(OPERATION, source, move |source| {
                        fetch_post(source, requested)
                    })
                    .await;

                match result {
                    Ok(Some(post)) => {
                        self.inner.cache.content().set(key, post.clone());
                        self.mark(OPERATION, DataSource::Remote);
                        PostLookup::Found(post)
                    }
                    Ok(None) => self.post_fallback(OPERATION, slug, PostLookup::NotFound),
                    Err(err) => {
                        warn!(
                            target = "lectern::resolver",
                            operation = OPERATION,
                            slug,
                            kind = err.kind(),
                            error = %err,
                            "remote lookup failed, trying static corpus"
                        );
                        self.post_fallback(OPERATION, slug, PostLookup::FallbackExhausted)
                    }
                }
            }
            Gate::Denied => {
                debug!(
                    target = "lectern::resolver",
                    slug, "breaker refused remote lookup"
                );
                self.post_fallback(OPERATION, slug, PostLookup::FallbackExhausted)
            }
            Gate::Offline => self.post_fallback(OPERATION, slug, PostLookup::NotFound),
        }
    }

    // ====================================================================
    // Diagnostics and maintenance
    // ====================================================================

    /// Source of the most recent successful resolution.
    pub fn data_source(&self) -> Option<DataSource> {
        *rw_read(&self.inner.last_source, SOURCE, "data_source")
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.inner.breaker.snapshot()
    }

    /// Drop the cached body of `slug`. Returns whether an entry existed.
    pub fn invalidate_post(&self, slug: &str) -> bool {
        self.inner.cache.invalidate(&CacheKey::content(slug))
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear_all();
    }

    // ====================================================================
    // Internals
    // ====================================================================

    async fn metadata_with(
        &self,
        priority: Priority,
        operation: &'static str,
    ) -> (Vec<PostMetadata>, DataSource) {
        if let Some(posts) = self.inner.cache.metadata().get(&CacheKey::MetadataAll) {
            self.mark(operation, DataSource::Remote);
            return (posts, DataSource::Remote);
        }

        match self.gate(priority) {
            Gate::Remote(source) => match self.call_remote(operation, source, fetch_listing).await {
                Ok(posts) => return (self.store_metadata(operation, posts), DataSource::Remote),
                Err(err) => {
                    warn!(
                        target = "lectern::resolver",
                        operation,
                        kind = err.kind(),
                        error = %err,
                        "remote listing failed, serving static corpus"
                    );
                }
            },
            Gate::Denied => {
                debug!(
                    target = "lectern::resolver",
                    operation, "breaker refused remote listing"
                );
            }
            Gate::Offline => {}
        }

        (self.metadata_fallback(operation), DataSource::Fallback)
    }

    fn gate(&self, priority: Priority) -> Gate {
        let Some(source) = self.inner.source.as_ref() else {
            return Gate::Offline;
        };

        let allowed = match priority {
            Priority::Foreground => self.inner.breaker.allow_request(),
            Priority::Background => self.inner.breaker.allow_background(),
        };

        if allowed {
            Gate::Remote(Arc::clone(source))
        } else {
            Gate::Denied
        }
    }

    /// Run one remote call on its own task.
    ///
    /// The task owns the breaker outcome: it is recorded exactly once, even if
    /// the caller stops waiting or the source panics.
    async fn call_remote<T, F, Fut>(
        &self,
        operation: &'static str,
        source: Arc<dyn ContentSource>,
        call: F,
    ) -> Result<T, SourceError>
    where
        F: FnOnce(Arc<dyn ContentSource>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
        T: Send + 'static,
    {
        let breaker = Arc::clone(&self.inner.breaker);
        let timeout = self.inner.config.remote_timeout;

        let task = tokio::spawn(async move {
            let guard = OutcomeGuard::new(breaker, operation);
            let started = Instant::now();

            let result = match tokio::time::timeout(timeout, call(source)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(timeout)),
            };

            let outcome = match &result {
                Ok(_) => "ok",
                Err(err) => err.kind(),
            };
            histogram!(METRIC_REMOTE_FETCH_MS, "operation" => operation, "outcome" => outcome)
                .record(started.elapsed().as_secs_f64() * 1_000.0);

            guard.settle(result.is_ok());
            result
        });

        match task.await {
            Ok(result) => result,
            Err(err) => Err(SourceError::transport(format!("remote task aborted: {err}"))),
        }
    }

    fn store_metadata(
        &self,
        operation: &'static str,
        posts: Vec<PostMetadata>,
    ) -> Vec<PostMetadata> {
        self.inner
            .cache
            .metadata()
            .set(CacheKey::MetadataAll, posts.clone());
        self.mark(operation, DataSource::Remote);
        posts
    }

    fn metadata_fallback(&self, operation: &'static str) -> Vec<PostMetadata> {
        self.mark(operation, DataSource::Fallback);
        self.inner.corpus.metadata().to_vec()
    }

    fn post_fallback(
        &self,
        operation: &'static str,
        slug: &str,
        missing: PostLookup,
    ) -> PostLookup {
        match self.inner.corpus.post(slug) {
            Some(post) => {
                self.mark(operation, DataSource::Fallback);
                PostLookup::Found(post.clone())
            }
            None => {
                if matches!(missing, PostLookup::FallbackExhausted) {
                    *rw_write(&self.inner.last_source, SOURCE, "post_fallback") =
                        Some(DataSource::Fallback);
                }
                record_resolution(operation, None);
                missing
            }
        }
    }

    fn mark(&self, operation: &'static str, source: DataSource) {
        *rw_write(&self.inner.last_source, SOURCE, "mark") = Some(source);
        record_resolution(operation, Some(source));
    }
}

fn record_resolution(operation: &'static str, source: Option<DataSource>) {
    let source = source.map(DataSource::as_str).unwrap_or("none");
    counter!(METRIC_RESOLUTION, "operation" => operation, "source" => source).increment(1);
}

async fn fetch_listing(
    source: Arc<dyn ContentSource>,
) -> Result<Vec<PostMetadata>, SourceError> {
    let posts = source.list_posts().await?;

    let mut seen = HashSet::with_capacity(posts.len());
    for post in &posts {
        post.validate().map_err(SourceError::malformed)?;
        if !seen.insert(post.slug.as_str()) {
            return Err(SourceError::Malformed(format!(
                "listing repeats slug `{}`",
                post.slug
            )));
        }
    }

    Ok(posts)
}

async fn fetch_post(
    source: Arc<dyn ContentSource>,
    slug: String,
) -> Result<Option<PostContent>, SourceError> {
    let Some(post) = source.post_by_slug(&slug).await? else {
        return Ok(None);
    };

    post.validate().map_err(SourceError::malformed)?;
    if post.slug() != slug {
        return Err(SourceError::Malformed(format!(
            "requested `{slug}` but received `{}`",
            post.slug()
        )));
    }

    Ok(Some(post))
}

/// Reports a remote outcome to the breaker exactly once.
///
/// Dropped without [`settle`](Self::settle) means the call never finished
/// normally, which counts as a failure.
struct OutcomeGuard {
    breaker: Arc<CircuitBreaker>,
    operation: &'static str,
    settled: bool,
}

impl OutcomeGuard {
    fn new(breaker: Arc<CircuitBreaker>, operation: &'static str) -> Self {
        Self {
            breaker,
            operation,
            settled: false,
        }
    }

    fn settle(mut self, success: bool) {
        self.settled = true;
        if success {
            self.breaker.record_success();
        } else {
            self.breaker.record_failure();
        }
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                target = "lectern::resolver",
                operation = self.operation,
                "remote call ended abnormally, recording failure"
            );
            self.breaker.record_failure();
        }
    }
}
