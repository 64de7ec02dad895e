//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::{BackoffSchedule, RetryPolicy};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Circuit breaker limits applied to every provider.
    pub breaker: BreakerConfig,

    /// Retry configuration for provider calls.
    pub retries: RetryConfig,

    /// Snapshot persistence settings.
    pub persistence: PersistenceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Payment providers, in priority order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for BreakerServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            breaker: BreakerConfig::default(),
            retries: RetryConfig::default(),
            persistence: PersistenceConfig::default(),
            observability: ObservabilityConfig::default(),
            providers: default_providers(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Time the circuit stays open before admitting a trial request, in milliseconds.
    pub cooldown_ms: u64,
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 30_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Delay after each failed attempt, in milliseconds.
    pub backoff_ms: Vec<u64>,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: BackoffSchedule::from_millis(&self.backoff_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: vec![500, 1000, 2000],
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Location of the snapshot artifact.
    pub snapshot_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("persisted_state.json"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A payment provider. The shipped gateway simulates a flaky remote.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider identifier used in requests.
    pub name: String,

    /// Probability (0.0-1.0) that a simulated call fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Simulated response latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_rate: default_failure_rate(),
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_failure_rate() -> f64 {
    0.3
}

fn default_latency_ms() -> u64 {
    200
}

/// Providers used when the config names none (`stripe`, `paypal`).
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::new("stripe"), ProviderConfig::new("paypal")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BreakerServiceConfig::default();
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.cooldown(), Duration::from_secs(30));
        assert_eq!(config.retries.policy(), RetryPolicy::default());
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].name, "stripe");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BreakerServiceConfig = toml::from_str(
            r#"
            [breaker]
            failure_threshold = 3

            [[providers]]
            name = "adyen"
            failure_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.cooldown_ms, 30_000);
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.providers[0].latency_ms, 200);
        assert_eq!(config.providers[0].failure_rate, 0.5);
    }
}
