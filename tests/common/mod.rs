#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use lectern::{
    application::{ContentSource, Resolver, ResolverConfig, SourceError},
    breaker::{BreakerConfig, CircuitBreaker},
    cache::{CacheConfig, TieredCache},
    clock::ManualClock,
    corpus::StaticCorpus,
    domain::posts::{PostContent, PostMetadata},
};

/// What the scripted remote does on its next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail,
    Hang,
    Malformed,
    Missing,
    Panic,
}

/// Remote stand-in that replays a script, then repeats a default step.
///
/// Its posts are the bundled corpus with a `[remoto]` title prefix, so tests
/// can tell which source served a result.
#[derive(Debug)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    fallback_step: Mutex<Step>,
    calls: AtomicUsize,
    listing: Vec<PostMetadata>,
    posts: HashMap<String, PostContent>,
}

impl ScriptedSource {
    pub fn new(default_step: Step) -> Self {
        let posts: Vec<PostContent> = corpus()
            .posts()
            .iter()
            .cloned()
            .map(|mut post| {
                post.metadata.title = format!("[remoto] {}", post.metadata.title);
                post
            })
            .collect();

        Self {
            script: Mutex::new(VecDeque::new()),
            fallback_step: Mutex::new(default_step),
            calls: AtomicUsize::new(0),
            listing: posts.iter().map(|post| post.metadata.clone()).collect(),
            posts: posts
                .into_iter()
                .map(|post| (post.metadata.slug.clone(), post))
                .collect(),
        }
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.lock().expect("script lock").extend(steps);
        self
    }

    pub fn set_default(&self, step: Step) {
        *self.fallback_step.lock().expect("default lock") = step;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remote_post(&self, slug: &str) -> Option<&PostContent> {
        self.posts.get(slug)
    }

    fn next_step(&self) -> Step {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().expect("script lock").pop_front();
        scripted.unwrap_or_else(|| *self.fallback_step.lock().expect("default lock"))
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn list_posts(&self) -> Result<Vec<PostMetadata>, SourceError> {
        match self.next_step() {
            Step::Succeed => Ok(self.listing.clone()),
            Step::Fail => Err(SourceError::Transport("connection refused".to_string())),
            Step::Hang => std::future::pending().await,
            Step::Malformed => {
                let mut listing = self.listing.clone();
                if let Some(first) = listing.first_mut() {
                    first.slug = "Not A Slug".to_string();
                }
                Ok(listing)
            }
            Step::Missing => Ok(Vec::new()),
            Step::Panic => panic!("scripted remote panic"),
        }
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<PostContent>, SourceError> {
        match self.next_step() {
            Step::Succeed => Ok(self.posts.get(slug).cloned()),
            Step::Fail => Err(SourceError::Status(503)),
            Step::Hang => std::future::pending().await,
            Step::Malformed => Ok(self
                .posts
                .values()
                .find(|post| post.metadata.slug != slug)
                .cloned()),
            Step::Missing => Ok(None),
            Step::Panic => panic!("scripted remote panic"),
        }
    }
}

pub struct Harness {
    pub resolver: Resolver,
    pub source: Arc<ScriptedSource>,
    pub clock: ManualClock,
}

pub fn corpus() -> Arc<StaticCorpus> {
    StaticCorpus::bundled().expect("bundled corpus")
}

pub fn harness(source: ScriptedSource) -> Harness {
    let clock = ManualClock::new();
    let source = Arc::new(source);
    let remote: Arc<dyn ContentSource> = source.clone();
    let resolver = resolver_with(Some(remote), &clock);

    Harness {
        resolver,
        source,
        clock,
    }
}

pub fn offline() -> (Resolver, ManualClock) {
    let clock = ManualClock::new();
    (resolver_with(None, &clock), clock)
}

fn resolver_with(source: Option<Arc<dyn ContentSource>>, clock: &ManualClock) -> Resolver {
    let breaker = Arc::new(CircuitBreaker::new(
        BreakerConfig::default(),
        Arc::new(clock.clone()),
    ));
    let cache = Arc::new(TieredCache::new(
        &CacheConfig::default(),
        Arc::new(clock.clone()),
    ));
    let config = ResolverConfig {
        remote_timeout: Duration::from_secs(5),
    };

    Resolver::new(source, breaker, cache, corpus(), config)
}
