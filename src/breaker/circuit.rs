use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::lock::mutex_lock;

use super::config::BreakerConfig;

const SOURCE: &str = "breaker::circuit";
const METRIC_TRANSITION: &str = "lectern_breaker_transition_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Point-in-time view of the breaker for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub trial_in_flight: bool,
    pub cooldown_remaining_ms: Option<u64>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Health gate in front of the remote content API.
///
/// Every read and transition happens under one mutex, so concurrent callers
/// always observe a single ordered history. The `Open -> HalfOpen` move is
/// lazy: it happens inside [`allow_request`](Self::allow_request) once the
/// cooldown has elapsed, and only the caller performing it gets the trial.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Decide whether a user-facing call may hit the remote.
    pub fn allow_request(&self) -> bool {
        let now = self.clock.now();
        let mut inner = mutex_lock(&self.inner, SOURCE, "allow_request");

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                if !self.cooldown_elapsed(&inner, now) {
                    return false;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                record_transition(CircuitState::HalfOpen);
                info!(
                    target = "lectern::breaker",
                    failures = inner.consecutive_failures,
                    "circuit half-open, granting a single trial"
                );
                true
            }
        }
    }

    /// Decide whether a background (preload) call may hit the remote.
    ///
    /// Background work never performs the `Open -> HalfOpen` transition and
    /// never takes the trial slot.
    pub fn allow_background(&self) -> bool {
        mutex_lock(&self.inner, SOURCE, "allow_background").state == CircuitState::Closed
    }

    /// A remote call succeeded. Any state resets to `Closed`.
    pub fn record_success(&self) {
        let mut inner = mutex_lock(&self.inner, SOURCE, "record_success");
        let previous = inner.state;

        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;

        if previous != CircuitState::Closed {
            record_transition(CircuitState::Closed);
            info!(
                target = "lectern::breaker",
                from = previous.as_str(),
                "circuit closed after remote success"
            );
        }
    }

    /// A remote call failed (transport error, timeout, or malformed payload).
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = mutex_lock(&self.inner, SOURCE, "record_failure");
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.threshold() {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                    record_transition(CircuitState::Open);
                    warn!(
                        target = "lectern::breaker",
                        failures = inner.consecutive_failures,
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "circuit opened after consecutive remote failures"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                inner.trial_in_flight = false;
                record_transition(CircuitState::Open);
                warn!(
                    target = "lectern::breaker",
                    failures = inner.consecutive_failures,
                    "circuit re-opened after failed trial"
                );
            }
            CircuitState::Open => {
                // Late or forced outcomes extend the cooldown.
                inner.opened_at = Some(now);
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        mutex_lock(&self.inner, SOURCE, "state").state
    }

    pub fn consecutive_failures(&self) -> u32 {
        mutex_lock(&self.inner, SOURCE, "consecutive_failures").consecutive_failures
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = self.clock.now();
        let inner = mutex_lock(&self.inner, SOURCE, "snapshot");

        let cooldown_remaining_ms = match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                let elapsed = now.saturating_duration_since(opened_at);
                let remaining = self.config.cooldown.saturating_sub(elapsed);
                Some(duration_ms(remaining))
            }
            _ => None,
        };

        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            trial_in_flight: inner.trial_in_flight,
            cooldown_remaining_ms,
        }
    }

    fn cooldown_elapsed(&self, inner: &Inner, now: Instant) -> bool {
        match inner.opened_at {
            Some(opened_at) => now.saturating_duration_since(opened_at) >= self.config.cooldown,
            None => true,
        }
    }
}

fn record_transition(to: CircuitState) {
    counter!(METRIC_TRANSITION, "to" => to.as_str()).increment(1);
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
