//! Error taxonomy for breaker-mediated calls.
//!
//! # Design Decisions
//! - Rejection is a distinct variant from any failure the circuit itself can
//!   produce, so callers can tell "not attempted" from "attempted and failed"
//! - Circuit errors pass through unchanged; the breaker never reclassifies them

use std::time::Duration;

use thiserror::Error;

/// Why a call through the breaker failed.
///
/// `Open` means the circuit was never invoked. The other two variants are
/// real failures of an attempt; each one increments the failure counter
/// before it reaches the caller.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker is open; the call was rejected without touching the circuit.
    #[error("circuit breaker is open, call rejected")]
    Open,

    /// The circuit did not produce a result within the invocation timeout.
    /// The underlying operation may still be running; only the wait ended.
    #[error("circuit invocation timed out after {0:?}")]
    Timeout(Duration),

    /// The circuit itself failed. Passed through unchanged.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// True when the call was rejected without invoking the circuit.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BreakerError::Open)
    }
}

/// Rejected breaker configuration.
///
/// Semantic validation (serde handles syntactic); returned from the
/// fallible constructors before any state is built.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `invocation_timeout_ms` must be positive.
    #[error("invocation_timeout_ms must be positive")]
    ZeroTimeout,

    /// `failure_threshold` must be positive.
    #[error("failure_threshold must be positive")]
    ZeroThreshold,

    /// `max_concurrent_calls` must be positive.
    #[error("max_concurrent_calls must be positive")]
    ZeroConcurrency,
}
