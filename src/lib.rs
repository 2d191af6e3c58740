//! Circuit breaker for protecting callers from failing or hanging operations.
//!
//! Wraps a caller-supplied operation (the circuit) and tracks its failures.
//! Once the circuit fails too often, the breaker stops invoking it and fails
//! fast, giving the downstream dependency time to recover before it is
//! probed again.
//!
//! # States
//! - Closed: healthy, calls pass through
//! - Open: fail-fast, calls are rejected without invoking the circuit
//! - Half-Open: the reset cooldown elapsed, probe calls pass through again
//!
//! Every invocation runs on a bounded worker pool with a hard wall-clock
//! deadline; a call that exceeds the deadline counts as a failure even
//! though the underlying operation may still be running.
//!
//! # Example
//! ```
//! use circuit_breaker::{CircuitBreaker, CircuitFn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lookup = CircuitFn::new(|id: u32| -> Result<String, std::io::Error> {
//!     Ok(format!("user-{id}"))
//! });
//! let breaker = CircuitBreaker::new(lookup);
//!
//! let user = breaker.call(7).await.unwrap();
//! assert_eq!(user, "user-7");
//! # }
//! ```

pub mod breaker;
pub mod config;
pub mod error;
pub mod monitor;
pub mod state;

pub use breaker::{Circuit, CircuitBreaker, CircuitFn};
pub use config::BreakerConfig;
pub use error::{BreakerError, ConfigError};
pub use monitor::{LogMonitor, Monitor, RecordingMonitor};
pub use state::CircuitState;
