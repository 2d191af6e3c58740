//! Alert sink collaborators.
//!
//! # Responsibilities
//! - Receive breaker lifecycle events (explicit reset, transition to open)
//! - Record them however the embedding application wants (log, page, count)
//!
//! # Design Decisions
//! - Single-method trait; the breaker never inspects or mutates the sink
//! - Alerts are delivered synchronously after the counter update commits

use std::sync::Mutex;

/// External alert sink notified when the breaker is reset and when it
/// transitions into the open state.
///
/// `alert` is called synchronously from inside the breaker and must not
/// panic; implementations are responsible for isolating their own failures
/// (catch and log locally). The breaker passes events through without
/// interpreting the outcome.
pub trait Monitor: Send + Sync {
    /// Record one breaker event. The breaker emits `"open circuit"` when a
    /// recorded failure leaves it open and `"reset_circuit"` on every reset,
    /// including the one performed at construction.
    fn alert(&self, event: &str);
}

/// Default monitor that forwards events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn alert(&self, event: &str) {
        tracing::warn!(event, "circuit breaker alert");
    }
}

/// Monitor that keeps every event in memory, for assertions in tests and
/// for applications that want to inspect recent breaker activity.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<String>>,
}

impl RecordingMonitor {
    /// New empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("recording monitor mutex poisoned")
            .clone()
    }
}

impl Monitor for RecordingMonitor {
    fn alert(&self, event: &str) {
        self.events
            .lock()
            .expect("recording monitor mutex poisoned")
            .push(event.to_string());
    }
}
