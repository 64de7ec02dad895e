//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Payment attempt:
//!     → circuit_breaker.rs (admit or reject based on failure history)
//!     → executor.rs (call provider, retry with backoff.rs delays)
//!     → circuit_breaker.rs (apply success/failure)
//!     → recorder.rs (retries, outcomes, transition log)
//! ```
//!
//! # Design Decisions
//! - Breaker and recorder are plain state; locking belongs to the caller
//! - Time comes from clock.rs so cooldowns are testable
//! - Fixed backoff schedule, no jitter

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod executor;
pub mod recorder;

pub use backoff::BackoffSchedule;
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use executor::{AttemptsExhausted, CallExecutor, Completed, RetryPolicy};
pub use recorder::{MetricsRecorder, MetricsState, Transition};
