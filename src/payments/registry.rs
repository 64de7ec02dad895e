//! Provider registry.
//!
//! # Responsibilities
//! - Own one [`ProviderState`] per configured provider for the process lifetime
//! - Pair each provider with its gateway
//! - Restore state from a snapshot at startup and produce snapshots on demand
//!
//! # Design Decisions
//! - The provider set is fixed at construction; no entries are added or removed
//! - Each provider has its own mutex, so providers never contend
//! - Locks are never held across an await

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::config::BreakerConfig;
use crate::payments::gateway::PaymentGateway;
use crate::payments::snapshot::{PersistedSnapshot, ProviderSnapshot};
use crate::payments::summary::SummaryInput;
use crate::payments::types::ProviderCounters;
use crate::resilience::{CircuitBreaker, MetricsRecorder};

/// Window quoted in status summaries.
pub const SUMMARY_WINDOW_MINUTES: u32 = 10;

/// Mutable state of one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderState {
    pub breaker: CircuitBreaker,
    pub recorder: MetricsRecorder,
    pub counters: ProviderCounters,
    /// Summary captured the last time the circuit opened.
    pub last_auto_summary: Option<String>,
}

impl ProviderState {
    pub fn fresh(config: &BreakerConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.failure_threshold, config.cooldown()),
            recorder: MetricsRecorder::new(),
            counters: ProviderCounters::default(),
            last_auto_summary: None,
        }
    }

    /// Rebuild from a snapshot entry. Persisted limits are kept; a zero
    /// limit in the snapshot falls back to `config`.
    pub fn restore(snapshot: &ProviderSnapshot, config: &BreakerConfig) -> Self {
        let persisted = &snapshot.circuit_breaker;
        let threshold = match persisted.failure_threshold {
            0 => config.failure_threshold,
            n => n,
        };
        let cooldown = match persisted.cooldown_ms {
            0 => config.cooldown(),
            ms => Duration::from_millis(ms),
        };

        Self {
            breaker: CircuitBreaker::from_state(persisted, threshold, cooldown),
            recorder: MetricsRecorder::from_state(snapshot.metrics.clone()),
            counters: ProviderCounters {
                total_attempts: snapshot.total_attempts,
                total_failures: snapshot.total_failures,
            },
            last_auto_summary: None,
        }
    }

    pub fn to_snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot {
            circuit_breaker: self.breaker.to_state(),
            metrics: self.recorder.snapshot(),
            total_attempts: self.counters.total_attempts,
            total_failures: self.counters.total_failures,
        }
    }

    pub fn summary_input(&self) -> SummaryInput {
        SummaryInput {
            failure_count: self.breaker.failure_count(),
            last_failure_at: self.breaker.last_failure_at(),
            status: self.breaker.status(),
            window_minutes: SUMMARY_WINDOW_MINUTES,
            total_attempts: self.counters.total_attempts,
            total_failures: self.counters.total_failures,
        }
    }
}

/// A provider, its gateway and its guarded state.
#[derive(Debug)]
pub struct ProviderSlot {
    name: String,
    gateway: Arc<dyn PaymentGateway>,
    state: Mutex<ProviderState>,
}

impl ProviderSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    /// Exclusive access to the provider's state.
    pub fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock()
    }
}

/// Every configured provider, in configuration order.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    slots: Vec<ProviderSlot>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Build the registry, restoring each provider from `restored` when an
    /// entry with the same id exists.
    pub fn new(
        breaker: &BreakerConfig,
        providers: Vec<(String, Arc<dyn PaymentGateway>)>,
        restored: Option<&PersistedSnapshot>,
    ) -> Self {
        let mut registry = Self::default();

        for (name, gateway) in providers {
            let state = match restored.and_then(|s| s.get(&name)) {
                Some(entry) => {
                    let persisted = &entry.circuit_breaker;
                    if persisted.failure_threshold != breaker.failure_threshold
                        || persisted.cooldown_ms != breaker.cooldown_ms
                    {
                        tracing::warn!(
                            provider = %name,
                            persisted_threshold = persisted.failure_threshold,
                            persisted_cooldown_ms = persisted.cooldown_ms,
                            configured_threshold = breaker.failure_threshold,
                            configured_cooldown_ms = breaker.cooldown_ms,
                            "Breaker limits differ from config, keeping persisted ones"
                        );
                    }
                    tracing::info!(
                        provider = %name,
                        status = %persisted.status,
                        "Restored provider state"
                    );
                    ProviderState::restore(entry, breaker)
                }
                None => ProviderState::fresh(breaker),
            };

            registry.index.insert(name.clone(), registry.slots.len());
            registry.slots.push(ProviderSlot {
                name,
                gateway,
                state: Mutex::new(state),
            });
        }

        if let Some(snapshot) = restored {
            for name in snapshot.providers.keys() {
                if !registry.index.contains_key(name) {
                    tracing::warn!(
                        provider = %name,
                        "Ignoring snapshot entry for unconfigured provider"
                    );
                }
            }
        }

        registry
    }

    pub fn get(&self, name: &str) -> Option<&ProviderSlot> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(ProviderSlot::name)
    }

    /// Capture every provider's current state.
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            providers: self
                .slots
                .iter()
                .map(|slot| (slot.name.clone(), slot.lock().to_snapshot()))
                .collect(),
        }
    }
}
