//! Breaker state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: circuit assumed down, calls fail fast
//! - Half-Open: cooldown elapsed, probe calls pass through again
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: reset_cooldown elapsed since last failure
//! Half-Open → Open: a new failure restamps last_failure_at
//! Half-Open → Closed: a probe call succeeds
//! ```
//!
//! # Design Decisions
//! - State is derived fresh on every query from the counter snapshot;
//!   no field caches "current state"
//! - Below the threshold the breaker reports Closed no matter how much
//!   time has passed; the cooldown only matters once the threshold is crossed
//! - Half-Open and Closed both permit an attempt; only Open rejects

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Health of the breaker, derived from its failure counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Healthy; calls are attempted normally.
    Closed,
    /// Fail-fast; calls are rejected without attempting the circuit.
    Open,
    /// Probing; calls are attempted again to test recovery.
    HalfOpen,
}

impl CircuitState {
    /// Wire/log name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// The breaker's failure counters.
///
/// Both fields are always read and written together under one lock so state
/// derivation never observes a torn pair.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    /// Failures recorded since the last reset.
    pub failure_count: u32,
    /// When the most recent failure was recorded. `Some` exactly when
    /// `failure_count > 0`.
    pub last_failure_at: Option<Instant>,
}

impl Counters {
    /// Record one failure at the current instant. The count saturates so a
    /// circuit that fails forever cannot wrap back below the threshold.
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(Instant::now());
    }

    /// Return to the initial healthy condition.
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.last_failure_at = None;
    }

    /// Derive the current state from this snapshot.
    pub fn state(&self, failure_threshold: u32, reset_cooldown: Duration) -> CircuitState {
        if self.failure_count < failure_threshold {
            return CircuitState::Closed;
        }
        let over_cooldown = self
            .last_failure_at
            .is_some_and(|at| at.elapsed() > reset_cooldown);
        if over_cooldown {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u32 = 2;
    const LONG_COOLDOWN: Duration = Duration::from_secs(60);

    #[test]
    fn fresh_counters_are_closed() {
        let counters = Counters::default();
        assert_eq!(counters.state(THRESHOLD, LONG_COOLDOWN), CircuitState::Closed);
    }

    #[test]
    fn below_threshold_is_closed_even_past_the_cooldown() {
        let counters = Counters {
            failure_count: 1,
            last_failure_at: Some(Instant::now()),
        };
        std::thread::sleep(Duration::from_millis(5));
        // Cooldown long elapsed, but the threshold was never crossed.
        assert_eq!(counters.state(THRESHOLD, Duration::ZERO), CircuitState::Closed);
    }

    #[test]
    fn over_threshold_within_cooldown_is_open() {
        let counters = Counters {
            failure_count: 2,
            last_failure_at: Some(Instant::now()),
        };
        assert_eq!(counters.state(THRESHOLD, LONG_COOLDOWN), CircuitState::Open);
    }

    #[test]
    fn over_threshold_past_cooldown_is_half_open() {
        let counters = Counters {
            failure_count: 2,
            last_failure_at: Some(Instant::now()),
        };
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(counters.state(THRESHOLD, Duration::ZERO), CircuitState::HalfOpen);
    }

    #[test]
    fn record_failure_stamps_timestamp() {
        let mut counters = Counters::default();
        counters.record_failure();
        assert_eq!(counters.failure_count, 1);
        assert!(counters.last_failure_at.is_some());

        counters.reset();
        assert_eq!(counters.failure_count, 0);
        assert!(counters.last_failure_at.is_none());
    }

    #[test]
    fn failure_count_saturates_instead_of_wrapping() {
        let mut counters = Counters {
            failure_count: u32::MAX,
            last_failure_at: Some(Instant::now()),
        };
        counters.record_failure();
        assert_eq!(counters.failure_count, u32::MAX);
        assert!(counters.last_failure_at.is_some());
        assert_eq!(counters.state(THRESHOLD, LONG_COOLDOWN), CircuitState::Open);
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
            "\"half_open\""
        );
        let state: CircuitState = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(state, CircuitState::Open);
        assert_eq!(state.as_str(), "open");
    }
}
