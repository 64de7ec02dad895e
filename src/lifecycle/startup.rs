//! Startup orchestration.
//!
//! # Responsibilities
//! - Restore persisted provider state
//! - Start the snapshot writer and build the payment processor
//!
//! # Design Decisions
//! - Fail fast: a corrupt snapshot stops startup instead of resetting
//!   some providers to defaults
//! - Listeners start after this returns (traffic only when state is ready)

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::BreakerConfig;
use crate::error::StartupError;
use crate::payments::{
    PaymentGateway, PaymentProcessor, ProviderRegistry, SnapshotStore, SnapshotWriter,
    TemplateSummary,
};
use crate::resilience::{Clock, RetryPolicy};

/// The running payment core: processor plus its snapshot writer task.
#[derive(Debug)]
pub struct Services {
    pub processor: Arc<PaymentProcessor>,
    writer: JoinHandle<()>,
}

impl Services {
    /// Flush pending snapshots and wait up to `timeout` for the writer to stop.
    ///
    /// The writer only stops once every other clone of the processor is gone.
    pub async fn shutdown(self, timeout: Duration) {
        self.processor.flush().await;
        drop(self.processor);
        if tokio::time::timeout(timeout, self.writer).await.is_err() {
            tracing::warn!("Snapshot writer did not stop in time");
        }
    }

    pub fn into_parts(self) -> (Arc<PaymentProcessor>, JoinHandle<()>) {
        (self.processor, self.writer)
    }
}

/// Load the snapshot at `store`, restore every provider and start the writer.
pub async fn start_services(
    breaker: &BreakerConfig,
    policy: RetryPolicy,
    providers: Vec<(String, Arc<dyn PaymentGateway>)>,
    store: SnapshotStore,
    clock: Arc<dyn Clock>,
) -> Result<Services, StartupError> {
    let restored = store.load().await?;
    match &restored {
        Some(snapshot) => {
            tracing::info!(providers = snapshot.providers.len(), "Persisted state loaded")
        }
        None => tracing::info!("No persisted state found, starting fresh"),
    }

    let registry = ProviderRegistry::new(breaker, providers, restored.as_ref());
    let (snapshots, writer) = SnapshotWriter::spawn(store);
    let processor = Arc::new(PaymentProcessor::new(
        registry,
        policy,
        clock,
        Arc::new(TemplateSummary),
        snapshots,
    ));

    Ok(Services { processor, writer })
}
