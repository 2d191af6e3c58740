//! Circuit breaker core.
//!
//! # Responsibilities
//! - Decide per call whether the circuit may be attempted
//! - Run attempts on a bounded worker pool with a hard wait deadline
//! - Track failures and alert the monitor on transitions
//!
//! # Design Decisions
//! - One breaker per protected resource (not global)
//! - Fail fast in Open state without touching the circuit
//! - The counter pair lives under a single mutex; every state derivation
//!   reads one consistent snapshot
//! - The timeout bounds the caller's wait, not the circuit's execution; a
//!   timed-out worker runs to completion in the background

use std::marker::PhantomData;
use std::panic;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task;
use tokio::time;

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ConfigError};
use crate::monitor::{LogMonitor, Monitor};
use crate::state::{CircuitState, Counters};

/// The protected operation.
///
/// `run` may block; the breaker executes it on a worker pool and bounds only
/// its own wait for the result. Whatever error the operation produces is
/// handed back to the caller unchanged; the breaker never inspects it.
pub trait Circuit: Send + Sync + 'static {
    /// Arguments forwarded verbatim from [`CircuitBreaker::call`].
    type Args: Send + 'static;
    /// Successful result type.
    type Output: Send + 'static;
    /// Application-defined error type.
    type Error: Send + 'static;

    /// Execute the operation once.
    fn run(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;
}

/// Adapter turning a plain function or closure into a [`Circuit`].
pub struct CircuitFn<F, A, T, E> {
    f: F,
    _marker: PhantomData<fn(A) -> Result<T, E>>,
}

impl<F, A, T, E> CircuitFn<F, A, T, E>
where
    F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wrap `f` so it can be protected by a breaker.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, A, T, E> Circuit for CircuitFn<F, A, T, E>
where
    F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Args = A;
    type Output = T;
    type Error = E;

    fn run(&self, args: A) -> Result<T, E> {
        (self.f)(args)
    }
}

/// Circuit breaker around a single [`Circuit`].
///
/// Constructed once per protected resource and shared by reference between
/// callers; all methods take `&self`.
pub struct CircuitBreaker<C: Circuit> {
    circuit: Arc<C>,
    config: BreakerConfig,
    monitor: Arc<dyn Monitor>,
    counters: Mutex<Counters>,
    workers: Arc<Semaphore>,
}

impl<C: Circuit> CircuitBreaker<C> {
    /// Wrap `circuit` with the default configuration and the [`LogMonitor`].
    pub fn new(circuit: C) -> Self {
        Self::build(circuit, BreakerConfig::default(), Arc::new(LogMonitor))
    }

    /// Wrap `circuit` with explicit tuning.
    pub fn with_config(circuit: C, config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_monitor(circuit, config, Arc::new(LogMonitor))
    }

    /// Full wiring: explicit tuning and alert sink. The config is validated
    /// before any state is built.
    pub fn with_monitor(
        circuit: C,
        config: BreakerConfig,
        monitor: Arc<dyn Monitor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(circuit, config, monitor))
    }

    fn build(circuit: C, config: BreakerConfig, monitor: Arc<dyn Monitor>) -> Self {
        let breaker = Self {
            circuit: Arc::new(circuit),
            workers: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            counters: Mutex::new(Counters::default()),
            config,
            monitor,
        };
        // Establishes the initial healthy condition and fires the reset alert.
        breaker.reset();
        breaker
    }

    /// Current health, derived fresh from the counters. Side-effect free and
    /// safe to call at any time.
    pub fn state(&self) -> CircuitState {
        self.counters
            .lock()
            .expect("breaker counters mutex poisoned")
            .state(self.config.failure_threshold, self.config.reset_cooldown())
    }

    /// Failures recorded since the last reset.
    pub fn failure_count(&self) -> u32 {
        self.counters
            .lock()
            .expect("breaker counters mutex poisoned")
            .failure_count
    }

    /// Return the breaker to its initial healthy condition.
    ///
    /// Idempotent. Always fires the `reset_circuit` alert, including when
    /// called on an already-closed breaker.
    pub fn reset(&self) {
        self.counters
            .lock()
            .expect("breaker counters mutex poisoned")
            .reset();
        tracing::info!("circuit breaker reset");
        self.monitor.alert("reset_circuit");
    }

    /// Invoke the circuit, failing fast when the breaker is open.
    ///
    /// Closed and half-open both attempt the call. On success the result is
    /// returned as-is; a successful half-open probe closes the breaker. Any
    /// failure of the attempt (circuit error or timeout) is recorded and then
    /// handed back unchanged: the caller sees the real failure, never a
    /// generic one, and nothing is retried.
    pub async fn call(&self, args: C::Args) -> Result<C::Output, BreakerError<C::Error>> {
        let admitted_from = self.state();
        if admitted_from == CircuitState::Open {
            tracing::warn!(
                failure_count = self.failure_count(),
                "circuit breaker open, rejecting call"
            );
            return Err(BreakerError::Open);
        }
        match self.invoke(args).await {
            Ok(output) => {
                if admitted_from == CircuitState::HalfOpen {
                    self.close_after_probe();
                }
                Ok(output)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    /// Run the circuit on the blocking pool, bounding the caller's wait.
    ///
    /// The semaphore permit moves into the worker so the concurrency cap
    /// follows the operation's actual execution, not the wait for it. On
    /// timeout only the wait is abandoned; the worker keeps running and
    /// releases its permit when it finishes.
    async fn invoke(&self, args: C::Args) -> Result<C::Output, BreakerError<C::Error>> {
        // Pool admission is not bounded by the invocation timeout.
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .expect("breaker semaphore closed");

        let circuit = Arc::clone(&self.circuit);
        let worker = task::spawn_blocking(move || {
            let _permit = permit;
            circuit.run(args)
        });

        let timeout = self.config.invocation_timeout();
        match time::timeout(timeout, worker).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(err))) => Err(BreakerError::Inner(err)),
            Ok(Err(join_err)) => {
                // The circuit panicked. Count it like any other failure,
                // then resume the panic on the caller so nothing is
                // swallowed.
                self.record_failure();
                match join_err.try_into_panic() {
                    Ok(payload) => panic::resume_unwind(payload),
                    Err(join_err) => panic!("circuit worker vanished: {join_err}"),
                }
            }
            Err(_) => Err(BreakerError::Timeout(timeout)),
        }
    }

    /// Record one failure and alert the monitor if the breaker is now open.
    fn record_failure(&self) {
        let (failure_count, state) = {
            let mut counters = self.counters.lock().expect("breaker counters mutex poisoned");
            counters.record_failure();
            let state =
                counters.state(self.config.failure_threshold, self.config.reset_cooldown());
            (counters.failure_count, state)
        };
        tracing::debug!(
            failure_count,
            state = state.as_str(),
            "circuit failure recorded"
        );
        // The state is recomputed after the increment, so the alert fires on
        // the transition-causing failure. A breaker that keeps failing while
        // open re-alerts on every failure; the freshly stamped timestamp
        // keeps it inside the cooldown.
        if state == CircuitState::Open {
            tracing::warn!(failure_count, "circuit breaker opened");
            self.monitor.alert("open circuit");
        }
    }

    /// A half-open probe succeeded; clear the counters so the breaker
    /// reports closed again. Not an administrative reset, so no alert.
    fn close_after_probe(&self) {
        self.counters
            .lock()
            .expect("breaker counters mutex poisoned")
            .reset();
        tracing::info!("circuit breaker closed after successful probe");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::RecordingMonitor;

    fn noop() -> CircuitFn<fn(()) -> Result<(), ()>, (), (), ()> {
        CircuitFn::new((|_| Ok(())) as fn(()) -> Result<(), ()>)
    }

    fn config(failure_threshold: u32) -> BreakerConfig {
        BreakerConfig {
            failure_threshold,
            reset_cooldown_ms: 60_000,
            ..BreakerConfig::default()
        }
    }

    #[test]
    fn construction_fires_reset_alert() {
        let monitor = Arc::new(RecordingMonitor::new());
        let breaker = CircuitBreaker::with_monitor(noop(), config(1), monitor.clone()).unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(monitor.events(), vec!["reset_circuit"]);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_alert() {
        let monitor = Arc::new(RecordingMonitor::new());
        let mut bad = config(1);
        bad.failure_threshold = 0;
        let result = CircuitBreaker::with_monitor(noop(), bad, monitor.clone());
        assert_eq!(result.err(), Some(ConfigError::ZeroThreshold));
        assert!(monitor.events().is_empty());
    }

    #[test]
    fn alert_fires_on_the_transition_causing_failure() {
        let monitor = Arc::new(RecordingMonitor::new());
        let breaker = CircuitBreaker::with_monitor(noop(), config(2), monitor.clone()).unwrap();

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(monitor.events(), vec!["reset_circuit"]);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(monitor.events(), vec!["reset_circuit", "open circuit"]);

        // Still failing while open re-alerts.
        breaker.record_failure();
        assert_eq!(
            monitor.events(),
            vec!["reset_circuit", "open circuit", "open circuit"]
        );
    }

    #[test]
    fn reset_is_idempotent_and_always_alerts() {
        let monitor = Arc::new(RecordingMonitor::new());
        let breaker = CircuitBreaker::with_monitor(noop(), config(1), monitor.clone()).unwrap();

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.reset();
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.reset();
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(
            monitor.events(),
            vec!["reset_circuit", "open circuit", "reset_circuit", "reset_circuit"]
        );
    }
}
