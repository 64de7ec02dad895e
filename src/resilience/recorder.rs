//! Per-provider outcome counters and circuit transition log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::CircuitStatus;

/// One observed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "state")]
    pub status: CircuitStatus,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative metrics for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsState {
    pub total_retries: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    #[serde(rename = "circuitTransitions")]
    pub transitions: Vec<Transition>,
}

/// Accumulates metrics for a single provider.
///
/// Duplicate transitions are not suppressed here; the caller only records
/// a transition when the status actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsRecorder {
    state: MetricsState,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: MetricsState) -> Self {
        Self { state }
    }

    pub fn record_retry(&mut self, retries: u32) {
        self.state.total_retries += u64::from(retries);
    }

    pub fn record_success(&mut self) {
        self.state.total_successes += 1;
    }

    pub fn record_failure(&mut self) {
        self.state.total_failures += 1;
    }

    pub fn record_circuit_transition(&mut self, status: CircuitStatus, at: DateTime<Utc>) {
        self.state.transitions.push(Transition {
            status,
            timestamp: at,
        });
    }

    pub fn snapshot(&self) -> MetricsState {
        self.state.clone()
    }

    pub fn state(&self) -> &MetricsState {
        &self.state
    }
}
