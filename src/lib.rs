//! Blog content resolution with graceful degradation.
//!
//! A [`application::Resolver`] answers listing and single-post queries from a
//! tiered cache, a remote content API guarded by a circuit breaker, and a
//! static corpus bundled with the binary, in that order.

pub mod application;
pub mod breaker;
pub mod cache;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod domain;
pub mod infra;

pub(crate) mod lock;
