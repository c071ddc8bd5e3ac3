use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "lectern_cache_hit_total",
            Unit::Count,
            "Total number of cache hits, by namespace."
        );
        describe_counter!(
            "lectern_cache_miss_total",
            Unit::Count,
            "Total number of cache misses, by namespace."
        );
        describe_counter!(
            "lectern_cache_evict_total",
            Unit::Count,
            "Total number of cache evictions due to capacity."
        );
        describe_counter!(
            "lectern_cache_expire_total",
            Unit::Count,
            "Total number of cache entries dropped after their TTL."
        );
        describe_counter!(
            "lectern_breaker_transition_total",
            Unit::Count,
            "Circuit breaker state transitions, by target state."
        );
        describe_counter!(
            "lectern_resolution_total",
            Unit::Count,
            "Resolver results, by operation and serving source."
        );
        describe_histogram!(
            "lectern_remote_fetch_ms",
            Unit::Milliseconds,
            "Remote content API latency in milliseconds."
        );
        describe_histogram!(
            "lectern_preload_ms",
            Unit::Milliseconds,
            "Start-up preload duration in milliseconds."
        );
    });
}
