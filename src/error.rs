//! Error taxonomy.
//!
//! - Rejections (`ProviderUnknown`, `CircuitOpen`, `InvalidRequest`) are
//!   never retried and return immediately.
//! - Remote failures are retried by the executor; only exhaustion surfaces
//!   as `AllAttemptsExhausted`.
//! - Persistence failures live in [`crate::payments::snapshot::SnapshotError`].

use thiserror::Error;

/// Failure of a payment submission or a provider lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Unknown payment provider: {0}")]
    ProviderUnknown(String),

    #[error("Circuit breaker for {0} is open. Payment attempts are temporarily blocked.")]
    CircuitOpen(String),

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Carries the message of the last remote error.
    #[error("{message}")]
    AllAttemptsExhausted { attempts: u32, message: String },
}

impl PaymentError {
    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentError::ProviderUnknown(_) => "provider_unknown",
            PaymentError::CircuitOpen(_) => "circuit_open",
            PaymentError::InvalidRequest(_) => "invalid_request",
            PaymentError::AllAttemptsExhausted { .. } => "attempts_exhausted",
        }
    }
}

/// Error returned by a payment provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Conditions that stop the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("cannot restore persisted state: {0}")]
    Snapshot(#[from] crate::payments::SnapshotError),

    #[error("invalid {field} address {value:?}")]
    Address { field: &'static str, value: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            PaymentError::CircuitOpen("paypal".into()).to_string(),
            "Circuit breaker for paypal is open. Payment attempts are temporarily blocked."
        );
        assert_eq!(
            PaymentError::ProviderUnknown("adyen".into()).to_string(),
            "Unknown payment provider: adyen"
        );
    }
}
