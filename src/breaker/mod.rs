//! Circuit breaker over remote content calls.
//!
//! ```toml
//! [breaker]
//! failure_threshold = 3
//! cooldown_seconds = 60
//! ```
//!
//! `Closed` lets every call through and counts consecutive failures. Reaching
//! the threshold opens the circuit; while `Open`, calls short-circuit to the
//! fallback corpus until the cooldown passes, after which the next user call
//! becomes the single `HalfOpen` trial.

mod circuit;
mod config;

pub use circuit::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use config::BreakerConfig;
