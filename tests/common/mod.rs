//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;

use payment_breaker::config::BreakerConfig;
use payment_breaker::error::{GatewayError, StartupError};
use payment_breaker::lifecycle::start_services;
use payment_breaker::payments::{
    Charge, PaymentGateway, PaymentProcessor, PaymentRequest, PersistedSnapshot, SnapshotStore,
};
use payment_breaker::resilience::{BackoffSchedule, ManualClock, RetryPolicy};

/// What a [`ScriptedGateway`] does on its next calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Succeed,
    Fail,
    /// Fail this many calls, then succeed.
    FailTimes(u32),
}

/// Deterministic gateway that counts its calls.
#[derive(Debug)]
pub struct ScriptedGateway {
    name: String,
    script: Mutex<Script>,
    calls: AtomicU32,
}

impl ScriptedGateway {
    pub fn new(name: &str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(script),
            calls: AtomicU32::new(0),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock() = script;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> GatewayError {
        GatewayError::new(format!("{} error: simulated failure", self.name))
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, charge: &Charge) -> Result<serde_json::Value, GatewayError> {
        tokio::task::yield_now().await;
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut script = self.script.lock();
        match *script {
            Script::Fail => return Err(self.failure()),
            Script::FailTimes(n) if n > 0 => {
                *script = Script::FailTimes(n - 1);
                return Err(self.failure());
            }
            _ => {}
        }
        Ok(json!({
            "amount": charge.amount,
            "currency": charge.currency,
            "source": charge.source,
            "providerId": format!("{}_{}", self.name, call),
        }))
    }
}

pub fn breaker(failure_threshold: u32, cooldown_ms: u64) -> BreakerConfig {
    BreakerConfig {
        failure_threshold,
        cooldown_ms,
    }
}

/// Retry policy that never sleeps.
pub fn no_backoff(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: BackoffSchedule::none(),
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()))
}

pub fn payment(provider: &str) -> PaymentRequest {
    PaymentRequest::new(provider, 25.0, "usd", "tok_visa")
}

pub fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join("persisted_state.json")
}

/// A processor wired to scripted gateways, a manual clock and a real
/// snapshot writer.
pub struct Harness {
    pub processor: Arc<PaymentProcessor>,
    pub store: SnapshotStore,
    writer: JoinHandle<()>,
}

impl Harness {
    /// Start against `dir`, restoring any snapshot already there.
    pub async fn start(
        dir: &Path,
        breaker: &BreakerConfig,
        policy: RetryPolicy,
        gateways: &[Arc<ScriptedGateway>],
        clock: Arc<ManualClock>,
    ) -> Self {
        Self::start_at(snapshot_path(dir), breaker, policy, gateways, clock)
            .await
            .unwrap()
    }

    /// Start with the snapshot at `path`, surfacing startup failures.
    pub async fn start_at(
        path: PathBuf,
        breaker: &BreakerConfig,
        policy: RetryPolicy,
        gateways: &[Arc<ScriptedGateway>],
        clock: Arc<ManualClock>,
    ) -> Result<Self, StartupError> {
        let providers = gateways
            .iter()
            .map(|g| {
                let gateway: Arc<dyn PaymentGateway> = g.clone();
                (g.name.clone(), gateway)
            })
            .collect();
        let store = SnapshotStore::new(path);

        let services = start_services(breaker, policy, providers, store.clone(), clock).await?;
        let (processor, writer) = services.into_parts();
        Ok(Self {
            processor,
            store,
            writer,
        })
    }

    /// Wait for queued writes and read back the snapshot file.
    pub async fn persisted(&self) -> Option<PersistedSnapshot> {
        self.processor.flush().await;
        self.store.load().await.unwrap()
    }

    /// Flush and stop the snapshot writer.
    pub async fn shutdown(self) {
        self.processor.flush().await;
        drop(self.processor);
        self.writer.await.unwrap();
    }
}
