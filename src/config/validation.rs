//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold > 0, cooldown > 0, attempts > 0)
//! - Check provider names are present and unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BreakerServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BreakerServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("breaker.failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("breaker.cooldown_ms must be greater than 0")]
    ZeroCooldown,

    #[error("retries.max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("at least one provider must be configured")]
    NoProviders,

    #[error("provider #{0} has an empty name")]
    EmptyProviderName(usize),

    #[error("provider {0} is configured more than once")]
    DuplicateProvider(String),

    #[error("provider {name} failure_rate {rate} is outside 0.0..=1.0")]
    InvalidFailureRate { name: String, rate: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("persistence.snapshot_path must not be empty")]
    EmptySnapshotPath,
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &BreakerServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.breaker.cooldown_ms == 0 {
        errors.push(ValidationError::ZeroCooldown);
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroMaxAttempts);
    }

    if config.providers.is_empty() {
        errors.push(ValidationError::NoProviders);
    }
    let mut seen = HashSet::new();
    for (i, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            errors.push(ValidationError::EmptyProviderName(i));
        } else if !seen.insert(provider.name.as_str()) {
            errors.push(ValidationError::DuplicateProvider(provider.name.clone()));
        }
        if !(0.0..=1.0).contains(&provider.failure_rate) {
            errors.push(ValidationError::InvalidFailureRate {
                name: provider.name.clone(),
                rate: provider.failure_rate.to_string(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.persistence.snapshot_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptySnapshotPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
