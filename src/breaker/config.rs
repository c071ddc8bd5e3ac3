//! Circuit breaker configuration.

use std::time::Duration;

const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_COOLDOWN_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial is allowed.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
        }
    }
}

impl From<&crate::config::BreakerSettings> for BreakerConfig {
    fn from(settings: &crate::config::BreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold.get(),
            cooldown: settings.cooldown,
        }
    }
}

impl BreakerConfig {
    /// Threshold clamped to at least one failure.
    pub fn threshold(&self) -> u32 {
        self.failure_threshold.max(1)
    }
}
