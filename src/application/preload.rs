//! One-shot warm-up of the listing cache after start-up.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use metrics::histogram;
use serde::Serialize;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info};

use crate::domain::types::DataSource;

use super::resolver::Resolver;

const METRIC_PRELOAD_MS: &str = "lectern_preload_ms";

pub const DEFAULT_RECENT_COUNT: usize = 3;
pub const DEFAULT_FEATURED_LIMIT: usize = 6;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct PreloadConfig {
    pub enabled: bool,
    pub recent_count: usize,
    pub featured_limit: usize,
    pub delay: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_count: DEFAULT_RECENT_COUNT,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            delay: DEFAULT_DELAY,
        }
    }
}

impl From<&crate::config::PreloadSettings> for PreloadConfig {
    fn from(value: &crate::config::PreloadSettings) -> Self {
        Self {
            enabled: value.enabled,
            recent_count: value.recent_count.get(),
            featured_limit: value.featured_limit.get(),
            delay: value.delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    pub featured: usize,
    pub recent: usize,
    /// Where the warmed listing came from.
    pub source: DataSource,
}

/// Warms featured and recent listings in the background, at most once.
///
/// Calls go through the resolver at background priority: they run only while
/// the breaker is closed and otherwise settle for the static corpus. Failures
/// are not retried.
#[derive(Debug)]
pub struct Preloader {
    resolver: Resolver,
    config: PreloadConfig,
    started: AtomicBool,
}

impl Preloader {
    pub fn new(resolver: Resolver, config: PreloadConfig) -> Arc<Self> {
        Arc::new(Self {
            resolver,
            config,
            started: AtomicBool::new(false),
        })
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Spawn the warm-up task. Returns `None` when disabled or already started.
    pub fn preload_critical_posts(self: &Arc<Self>) -> Option<JoinHandle<PreloadReport>> {
        if !self.config.enabled {
            debug!(target = "lectern::preload", "preload disabled");
            return None;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!(target = "lectern::preload", "preload already started");
            return None;
        }

        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.run().await }))
    }

    async fn run(&self) -> PreloadReport {
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        info!(target = "lectern::preload", "preloading critical posts");
        let started = Instant::now();

        let (featured, _) = self
            .resolver
            .featured_posts_background(self.config.featured_limit)
            .await;
        let (recent, source) = self
            .resolver
            .recent_posts_background(self.config.recent_count)
            .await;

        let report = PreloadReport {
            featured: featured.len(),
            recent: recent.len(),
            source,
        };

        histogram!(METRIC_PRELOAD_MS).record(started.elapsed().as_secs_f64() * 1_000.0);
        info!(
            target = "lectern::preload",
            featured = report.featured,
            recent = report.recent,
            source = report.source.as_str(),
            "preload finished"
        );

        report
    }
}
