//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    CliArgs, Command, GlobalOverrides, LimitArgs, NameArgs, RelatedArgs, SearchArgs, SlugArgs,
    WarmArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "lectern";
const ENV_PREFIX: &str = "LECTERN";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BREAKER_FAILURE_THRESHOLD: u64 = 3;
const DEFAULT_BREAKER_COOLDOWN_SECS: u64 = 60;
const DEFAULT_METADATA_CAPACITY: u64 = 200;
const DEFAULT_METADATA_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CONTENT_CAPACITY: u64 = 50;
const DEFAULT_CONTENT_TTL_SECS: u64 = 15 * 60;
const DEFAULT_PRELOAD_RECENT_COUNT: u64 = 3;
const DEFAULT_PRELOAD_FEATURED_LIMIT: u64 = 6;
const DEFAULT_PRELOAD_DELAY_MS: u64 = 250;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub remote: RemoteSettings,
    pub breaker: BreakerSettings,
    pub cache: CacheSettings,
    pub preload: PreloadSettings,
    pub corpus: CorpusSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// `None` runs the resolver against the static corpus only.
    pub base_url: Option<Url>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub failure_threshold: NonZeroU32,
    pub cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub metadata_capacity: NonZeroUsize,
    pub metadata_ttl: Duration,
    pub content_capacity: NonZeroUsize,
    pub content_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct PreloadSettings {
    pub enabled: bool,
    pub recent_count: NonZeroUsize,
    pub featured_limit: NonZeroUsize,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct CorpusSettings {
    /// `None` uses the corpus bundled into the binary.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    remote: RawRemoteSettings,
    breaker: RawBreakerSettings,
    cache: RawCacheSettings,
    preload: RawPreloadSettings,
    corpus: RawCorpusSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.remote_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
        if overrides.offline {
            self.remote.offline = Some(true);
        }
        if let Some(timeout) = overrides.remote_timeout_ms {
            self.remote.timeout_ms = Some(timeout);
        }
        if let Some(path) = overrides.corpus_path.as_ref() {
            self.corpus.path = Some(path.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            remote,
            breaker,
            cache,
            preload,
            corpus,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            remote: build_remote_settings(remote)?,
            breaker: build_breaker_settings(breaker)?,
            cache: build_cache_settings(cache)?,
            preload: build_preload_settings(preload)?,
            corpus: build_corpus_settings(corpus)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let base_url = match remote.base_url {
        _ if remote.offline.unwrap_or(false) => None,
        Some(value) if !value.trim().is_empty() => {
            let url = Url::parse(value.trim()).map_err(|err| {
                LoadError::invalid("remote.base_url", format!("failed to parse: {err}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "remote.base_url",
                    format!("unsupported scheme `{}`", url.scheme()),
                ));
            }
            Some(url)
        }
        _ => None,
    };

    let timeout_ms = remote.timeout_ms.unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "remote.timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(RemoteSettings {
        base_url,
        timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_breaker_settings(breaker: RawBreakerSettings) -> Result<BreakerSettings, LoadError> {
    let threshold = breaker
        .failure_threshold
        .unwrap_or(DEFAULT_BREAKER_FAILURE_THRESHOLD);
    let cooldown_secs = breaker
        .cooldown_seconds
        .unwrap_or(DEFAULT_BREAKER_COOLDOWN_SECS);

    Ok(BreakerSettings {
        failure_threshold: non_zero_u32(threshold, "breaker.failure_threshold")?,
        cooldown: non_zero_secs(cooldown_secs, "breaker.cooldown_seconds")?,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let metadata_capacity = cache
        .metadata_capacity
        .unwrap_or(DEFAULT_METADATA_CAPACITY);
    let metadata_ttl = cache
        .metadata_ttl_seconds
        .unwrap_or(DEFAULT_METADATA_TTL_SECS);
    let content_capacity = cache.content_capacity.unwrap_or(DEFAULT_CONTENT_CAPACITY);
    let content_ttl = cache
        .content_ttl_seconds
        .unwrap_or(DEFAULT_CONTENT_TTL_SECS);

    Ok(CacheSettings {
        metadata_capacity: non_zero_usize(metadata_capacity, "cache.metadata_capacity")?,
        metadata_ttl: non_zero_secs(metadata_ttl, "cache.metadata_ttl_seconds")?,
        content_capacity: non_zero_usize(content_capacity, "cache.content_capacity")?,
        content_ttl: non_zero_secs(content_ttl, "cache.content_ttl_seconds")?,
    })
}

fn build_preload_settings(preload: RawPreloadSettings) -> Result<PreloadSettings, LoadError> {
    let recent_count = preload
        .recent_count
        .unwrap_or(DEFAULT_PRELOAD_RECENT_COUNT);
    let featured_limit = preload
        .featured_limit
        .unwrap_or(DEFAULT_PRELOAD_FEATURED_LIMIT);

    Ok(PreloadSettings {
        enabled: preload.enabled.unwrap_or(true),
        recent_count: non_zero_usize(recent_count, "preload.recent_count")?,
        featured_limit: non_zero_usize(featured_limit, "preload.featured_limit")?,
        delay: Duration::from_millis(preload.delay_ms.unwrap_or(DEFAULT_PRELOAD_DELAY_MS)),
    })
}

fn build_corpus_settings(corpus: RawCorpusSettings) -> Result<CorpusSettings, LoadError> {
    match corpus.path {
        Some(path) if path.as_os_str().is_empty() => {
            Err(LoadError::invalid("corpus.path", "path must not be empty"))
        }
        path => Ok(CorpusSettings { path }),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    offline: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBreakerSettings {
    failure_threshold: Option<u64>,
    cooldown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    metadata_capacity: Option<u64>,
    metadata_ttl_seconds: Option<u64>,
    content_capacity: Option<u64>,
    content_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPreloadSettings {
    enabled: Option<bool>,
    recent_count: Option<u64>,
    featured_limit: Option<u64>,
    delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCorpusSettings {
    path: Option<PathBuf>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value_usize: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value_usize)
        .ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_secs(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}
