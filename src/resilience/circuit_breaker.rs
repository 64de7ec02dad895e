//! Circuit breaker for payment provider protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: provider assumed down, requests fail fast
//! - Half-Open: cooldown elapsed, trial requests are admitted
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold (consecutive, no window)
//! Open → Half-Open: first check at or after next_attempt_at
//! Half-Open → Closed: any success
//! Half-Open → Open: failure while the cumulative count is still >= threshold
//! ```
//!
//! # Design Decisions
//! - Per-provider circuit breaker (not global)
//! - Failure count is only ever reset by a success
//! - The caller supplies "now"; the breaker holds no clock
//! - Half-Open admits every check; concurrent trial requests are accepted

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Breaker status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitStatus::Closed => "closed",
            CircuitStatus::Open => "open",
            CircuitStatus::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable breaker state, as persisted in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerState {
    #[serde(rename = "state")]
    pub status: CircuitStatus,
    pub failure_count: u32,
    #[serde(rename = "lastFailure")]
    pub last_failure_at: Option<DateTime<Utc>>,
    #[serde(rename = "nextAttempt")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

/// Per-provider circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreaker {
    status: CircuitStatus,
    failure_count: u32,
    last_failure_at: Option<DateTime<Utc>>,
    next_attempt_at: Option<DateTime<Utc>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    /// Create a closed breaker. A zero threshold is treated as 1.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            status: CircuitStatus::Closed,
            failure_count: 0,
            last_failure_at: None,
            next_attempt_at: None,
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    /// Rebuild a breaker from persisted state with the given limits.
    pub fn from_state(state: &BreakerState, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            status: state.status,
            failure_count: state.failure_count,
            last_failure_at: state.last_failure_at,
            next_attempt_at: state.next_attempt_at,
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn to_state(&self) -> BreakerState {
        BreakerState {
            status: self.status,
            failure_count: self.failure_count,
            last_failure_at: self.last_failure_at,
            next_attempt_at: self.next_attempt_at,
            failure_threshold: self.failure_threshold,
            cooldown_ms: u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Decide whether a call may proceed at `now`.
    ///
    /// An open breaker whose cooldown has elapsed moves to half-open and
    /// admits the call.
    pub fn can_request(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            CircuitStatus::Closed | CircuitStatus::HalfOpen => true,
            CircuitStatus::Open => {
                let due = self.next_attempt_at.map_or(true, |at| now >= at);
                if due {
                    self.status = CircuitStatus::HalfOpen;
                }
                due
            }
        }
    }

    pub fn on_success(&mut self) {
        self.failure_count = 0;
        self.status = CircuitStatus::Closed;
        self.last_failure_at = None;
        self.next_attempt_at = None;
    }

    pub fn on_failure(&mut self, now: DateTime<Utc>) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(now);

        if self.failure_count >= self.failure_threshold {
            self.status = CircuitStatus::Open;
            self.next_attempt_at = Some(
                now.checked_add_signed(self.cooldown_delta())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            );
        }
    }

    pub fn status(&self) -> CircuitStatus {
        self.status
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    pub fn next_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.next_attempt_at
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn cooldown_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.cooldown).unwrap_or(chrono::Duration::MAX)
    }
}
