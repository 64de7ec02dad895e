//! Payment orchestration.
//!
//! Sequences breaker → executor → breaker → recorder → snapshot for each
//! payment attempt. The provider lock is taken for the admission check and
//! again to apply the outcome; it is released while the provider call and
//! its backoff delays are in flight.

use std::sync::Arc;

use crate::error::PaymentError;
use crate::observability::metrics;
use crate::payments::registry::{ProviderRegistry, ProviderSlot, ProviderState};
use crate::payments::snapshot::SnapshotHandle;
use crate::payments::summary::SummaryGenerator;
use crate::payments::types::{
    BreakerStatus, MetricsReport, PaymentReceipt, PaymentRequest, SummaryReport,
};
use crate::resilience::{CallExecutor, CircuitStatus, Clock, RetryPolicy};

/// Entry point for payment submissions and provider introspection.
#[derive(Debug)]
pub struct PaymentProcessor {
    registry: ProviderRegistry,
    executor: CallExecutor,
    clock: Arc<dyn Clock>,
    summaries: Arc<dyn SummaryGenerator>,
    snapshots: SnapshotHandle,
}

impl PaymentProcessor {
    pub fn new(
        registry: ProviderRegistry,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        summaries: Arc<dyn SummaryGenerator>,
        snapshots: SnapshotHandle,
    ) -> Self {
        for name in registry.names() {
            if let Some(slot) = registry.get(name) {
                metrics::record_circuit_state(name, slot.lock().breaker.status());
            }
        }

        Self {
            registry,
            executor: CallExecutor::new(policy),
            clock,
            summaries,
            snapshots,
        }
    }

    /// Submit a payment to its provider.
    ///
    /// Rejections are checked in a fixed order: unknown provider, open
    /// circuit, then invalid fields.
    pub async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        let slot = self
            .registry
            .get(&request.provider)
            .ok_or_else(|| PaymentError::ProviderUnknown(request.provider.clone()))?;
        let provider = slot.name();

        if let Err(e) = self.admit(slot) {
            metrics::record_rejection(provider, e.label());
            return Err(e);
        }

        let charge = match request.validate() {
            Ok(charge) => charge,
            Err(e) => {
                metrics::record_rejection(provider, e.label());
                return Err(e);
            }
        };

        let status = {
            let mut state = slot.lock();
            state.counters.total_attempts += 1;
            state.breaker.status()
        };
        tracing::debug!(
            provider,
            status = %status,
            amount = charge.amount,
            currency = %charge.currency,
            "Charging provider"
        );

        let gateway = slot.gateway();
        let charge = &charge;
        let outcome = self.executor.run(move |_| gateway.charge(charge)).await;

        let result = {
            let mut state = slot.lock();
            match outcome {
                Ok(done) => {
                    state.recorder.record_retry(done.retries());
                    state.recorder.record_success();
                    let before = state.breaker.status();
                    state.breaker.on_success();
                    if before != CircuitStatus::Closed {
                        self.record_transition(provider, &mut state, CircuitStatus::Closed);
                        tracing::info!(
                            provider,
                            from = %before,
                            "Circuit closed, provider recovered"
                        );
                    }

                    metrics::record_retries(provider, done.retries());
                    metrics::record_payment(provider, "success");
                    Ok(PaymentReceipt {
                        provider: provider.to_string(),
                        attempts: done.attempts,
                        provider_result: done.value,
                    })
                }
                Err(exhausted) => {
                    state.recorder.record_retry(exhausted.retries());
                    state.recorder.record_failure();
                    let before = state.breaker.status();
                    state.breaker.on_failure(self.clock.now());
                    state.counters.total_failures += 1;

                    let after = state.breaker.status();
                    if after != before {
                        self.record_transition(provider, &mut state, after);
                        if after == CircuitStatus::Open {
                            let summary = self.summaries.generate(&state.summary_input());
                            tracing::warn!(
                                provider,
                                failure_count = state.breaker.failure_count(),
                                next_attempt_at = ?state.breaker.next_attempt_at(),
                                summary = %summary,
                                "Circuit opened"
                            );
                            state.last_auto_summary = Some(summary);
                        }
                    }

                    metrics::record_retries(provider, exhausted.retries());
                    metrics::record_payment(provider, "failure");
                    tracing::warn!(
                        provider,
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "Payment failed after all attempts"
                    );
                    Err(PaymentError::AllAttemptsExhausted {
                        attempts: exhausted.attempts,
                        message: exhausted.last_error.to_string(),
                    })
                }
            }
        };

        self.persist();
        result
    }

    /// Breaker admission check. An Open → HalfOpen move is logged and persisted.
    fn admit(&self, slot: &ProviderSlot) -> Result<(), PaymentError> {
        let provider = slot.name();
        let (admitted, transitioned) = {
            let mut state = slot.lock();
            let before = state.breaker.status();
            let admitted = state.breaker.can_request(self.clock.now());
            let after = state.breaker.status();
            if after != before {
                self.record_transition(provider, &mut state, after);
                tracing::info!(provider, "Cooldown elapsed, admitting trial requests");
            }
            (admitted, after != before)
        };

        if transitioned {
            self.persist();
        }
        if admitted {
            Ok(())
        } else {
            tracing::debug!(provider, "Rejected by open circuit");
            Err(PaymentError::CircuitOpen(provider.to_string()))
        }
    }

    fn record_transition(&self, provider: &str, state: &mut ProviderState, status: CircuitStatus) {
        state.recorder.record_circuit_transition(status, self.clock.now());
        metrics::record_circuit_transition(provider, status);
    }

    fn persist(&self) {
        self.snapshots.persist(|| self.registry.snapshot());
    }

    fn slot(&self, provider: &str) -> Result<&ProviderSlot, PaymentError> {
        self.registry
            .get(provider)
            .ok_or_else(|| PaymentError::ProviderUnknown(provider.to_string()))
    }

    pub fn breaker_status(&self, provider: &str) -> Result<BreakerStatus, PaymentError> {
        let slot = self.slot(provider)?;
        let state = slot.lock();
        Ok(BreakerStatus {
            provider: slot.name().to_string(),
            status: state.breaker.status(),
            failure_count: state.breaker.failure_count(),
            last_failure_at: state.breaker.last_failure_at(),
        })
    }

    pub fn metrics(&self, provider: &str) -> Result<MetricsReport, PaymentError> {
        let slot = self.slot(provider)?;
        let metrics = slot.lock().recorder.snapshot();
        Ok(MetricsReport {
            provider: slot.name().to_string(),
            metrics,
        })
    }

    /// Generate a fresh summary. Does not replace the automatic one.
    pub fn summary(&self, provider: &str) -> Result<SummaryReport, PaymentError> {
        let slot = self.slot(provider)?;
        let (input, last_auto_summary) = {
            let state = slot.lock();
            (state.summary_input(), state.last_auto_summary.clone())
        };
        Ok(SummaryReport {
            provider: slot.name().to_string(),
            summary: self.summaries.generate(&input),
            last_auto_summary,
        })
    }

    /// Provider used when a query names none.
    pub fn default_provider(&self) -> Option<&str> {
        self.registry.names().next()
    }

    /// Wait for queued snapshot writes to finish.
    pub async fn flush(&self) {
        self.snapshots.flush().await;
    }
}
