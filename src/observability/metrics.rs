//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Mirror per-provider outcomes into Prometheus counters and gauges
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `payment_attempts_total` (counter): terminal outcomes by provider, outcome
//! - `payment_retries_total` (counter): extra attempts by provider
//! - `payment_rejections_total` (counter): rejected submissions by provider, reason
//! - `circuit_transitions_total` (counter): status changes by provider, state
//! - `circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `snapshot_writes_total` (counter): snapshot writes by result
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - The JSON metrics endpoint stays the source of truth; these are a mirror

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitStatus;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint started");
    Ok(())
}

pub fn record_payment(provider: &str, outcome: &'static str) {
    counter!(
        "payment_attempts_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_retries(provider: &str, retries: u32) {
    if retries > 0 {
        counter!("payment_retries_total", "provider" => provider.to_string())
            .increment(u64::from(retries));
    }
}

pub fn record_rejection(provider: &str, reason: &'static str) {
    counter!(
        "payment_rejections_total",
        "provider" => provider.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_circuit_transition(provider: &str, status: CircuitStatus) {
    counter!(
        "circuit_transitions_total",
        "provider" => provider.to_string(),
        "state" => status.as_str()
    )
    .increment(1);
    record_circuit_state(provider, status);
}

pub fn record_circuit_state(provider: &str, status: CircuitStatus) {
    let value = match status {
        CircuitStatus::Closed => 0.0,
        CircuitStatus::HalfOpen => 1.0,
        CircuitStatus::Open => 2.0,
    };
    gauge!("circuit_state", "provider" => provider.to_string()).set(value);
}

pub fn record_snapshot_write(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("snapshot_writes_total", "result" => result).increment(1);
}
