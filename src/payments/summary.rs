//! Status summary generation.
//!
//! Summary text is produced by an external collaborator; the service only
//! depends on [`SummaryGenerator`]. [`TemplateSummary`] is the built-in,
//! deterministic implementation.

use std::fmt::Debug;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::resilience::CircuitStatus;

/// Inputs for a provider status summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryInput {
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub status: CircuitStatus,
    pub window_minutes: u32,
    pub total_attempts: u64,
    pub total_failures: u64,
}

impl SummaryInput {
    /// Failure rate as a rounded percentage, 0 when nothing was attempted.
    pub fn failure_rate_percent(&self) -> u64 {
        if self.total_attempts == 0 {
            return 0;
        }
        let rate = self.total_failures as f64 / self.total_attempts as f64 * 100.0;
        rate.round() as u64
    }
}

/// Produces human-readable summary text.
pub trait SummaryGenerator: Send + Sync + Debug {
    fn generate(&self, input: &SummaryInput) -> String;
}

/// Fixed-template summaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateSummary;

impl SummaryGenerator for TemplateSummary {
    fn generate(&self, input: &SummaryInput) -> String {
        let rate = input.failure_rate_percent();
        let mut summary = format!(
            "In the last {} minutes, {}% of payment attempts failed",
            input.window_minutes, rate
        );
        if rate > 50 {
            summary.push_str(" due to provider instability.");
        } else {
            summary.push('.');
        }

        summary.push_str(&format!(
            " The circuit breaker was triggered and is currently {},",
            input.status
        ));
        summary.push_str(match input.status {
            CircuitStatus::Open => " blocking new attempts.",
            CircuitStatus::HalfOpen => " allowing a test request.",
            CircuitStatus::Closed => " allowing normal operation.",
        });

        if let Some(at) = input.last_failure_at {
            summary.push_str(&format!(
                " Last failure at {}.",
                at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ));
        }
        summary
    }
}
