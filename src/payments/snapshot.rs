//! Durable snapshot of every provider's breaker and metrics state.
//!
//! # Responsibilities
//! - Serialize all provider state into one JSON artifact
//! - Replace the artifact atomically (write `.tmp`, fsync, rename)
//! - Restore state at startup; absence is not an error, corruption is
//! - Serialize writes through one background task so an older snapshot
//!   never lands after a newer one

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::resilience::{BreakerState, MetricsState};

/// Persisted state of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSnapshot {
    pub circuit_breaker: BreakerState,
    pub metrics: MetricsState,
    pub total_attempts: u64,
    pub total_failures: u64,
}

/// Provider id → persisted state. Keys are sorted so encoding is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedSnapshot {
    pub providers: BTreeMap<String, ProviderSnapshot>,
}

impl PersistedSnapshot {
    pub fn get(&self, provider: &str) -> Option<&ProviderSnapshot> {
        self.providers.get(provider)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(SnapshotError::Encode)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Errors from reading or writing the snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// File-backed snapshot storage.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` if nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<PersistedSnapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting fresh");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot = PersistedSnapshot::decode(&bytes).map_err(|source| SnapshotError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            path = %self.path.display(),
            providers = snapshot.providers.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Atomically replace the snapshot.
    pub async fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), SnapshotError> {
        let data = snapshot.encode()?;
        let temp_path = self.path.with_extension("tmp");

        if let Some(parent) = temp_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&data).await.map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), bytes = data.len(), "Snapshot saved");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

enum WriterCommand {
    Save(PersistedSnapshot),
    Flush(oneshot::Sender<()>),
}

/// Background task that performs snapshot writes in submission order.
pub struct SnapshotWriter {
    store: SnapshotStore,
    rx: mpsc::UnboundedReceiver<WriterCommand>,
}

impl SnapshotWriter {
    /// Start the writer. It runs until every [`SnapshotHandle`] is dropped.
    pub fn spawn(store: SnapshotStore) -> (SnapshotHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = Self { store, rx };
        let task = tokio::spawn(writer.run());
        let handle = SnapshotHandle {
            tx,
            sequence: Arc::new(Mutex::new(())),
        };
        (handle, task)
    }

    async fn run(mut self) {
        tracing::info!(path = %self.store.path().display(), "Snapshot writer started");

        while let Some(command) = self.rx.recv().await {
            match command {
                WriterCommand::Save(snapshot) => match self.store.save(&snapshot).await {
                    Ok(()) => metrics::record_snapshot_write(true),
                    Err(e) => {
                        metrics::record_snapshot_write(false);
                        tracing::error!(error = %e, "Snapshot write failed");
                    }
                },
                WriterCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        tracing::info!("Snapshot writer stopped");
    }
}

/// Cheap handle used to queue snapshot writes.
#[derive(Clone)]
pub struct SnapshotHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
    sequence: Arc<Mutex<()>>,
}

impl SnapshotHandle {
    /// Build a snapshot and queue it for writing without waiting.
    ///
    /// Building and enqueueing happen under one lock, so queue order always
    /// matches the order in which the snapshots observed state.
    pub fn persist<F>(&self, build: F)
    where
        F: FnOnce() -> PersistedSnapshot,
    {
        let _sequence = self.sequence.lock();
        let snapshot = build();
        if self.tx.send(WriterCommand::Save(snapshot)).is_err() {
            metrics::record_snapshot_write(false);
            tracing::error!("Snapshot writer is gone; state change not persisted");
        }
    }

    /// Wait until every write queued so far has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

impl std::fmt::Debug for SnapshotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
