//! Breaker configuration schema.
//!
//! All types derive Serde traits so breaker settings can be embedded in an
//! application's config file. Unset fields fall back to the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning knobs for a single circuit breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Hard ceiling on how long a single invocation is awaited, in
    /// milliseconds. A call that exceeds it counts as a failure.
    pub invocation_timeout_ms: u64,

    /// Recorded failures at or above which the breaker stops passing calls
    /// through.
    pub failure_threshold: u32,

    /// Time that must elapse after the last failure before a probe call is
    /// attempted again, in milliseconds.
    pub reset_cooldown_ms: u64,

    /// Maximum invocations running concurrently inside the executor.
    pub max_concurrent_calls: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            invocation_timeout_ms: 10_000,
            failure_threshold: 5,
            reset_cooldown_ms: 100,
            max_concurrent_calls: 1,
        }
    }
}

impl BreakerConfig {
    /// Semantic validation (serde handles syntactic). Value ranges only;
    /// a zero cooldown is legal and means "probe immediately".
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invocation_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.max_concurrent_calls == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Invocation timeout as a [`Duration`].
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }

    /// Reset cooldown as a [`Duration`].
    pub fn reset_cooldown(&self) -> Duration {
        Duration::from_millis(self.reset_cooldown_ms)
    }
}
