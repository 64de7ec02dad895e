//! Payment subsystem.
//!
//! # Data Flow
//! ```text
//! PaymentRequest
//!     → processor.rs (provider lookup, breaker admission, validation)
//!     → gateway.rs (remote call, retried by the executor)
//!     → registry.rs (apply outcome to the provider's state)
//!     → snapshot.rs (queue a durable write)
//!     → summary.rs (when the circuit opens)
//! ```

pub mod gateway;
pub mod processor;
pub mod registry;
pub mod snapshot;
pub mod summary;
pub mod types;

pub use gateway::{simulated_providers, PaymentGateway, SimulatedGateway};
pub use processor::PaymentProcessor;
pub use registry::{ProviderRegistry, ProviderState};
pub use snapshot::{
    PersistedSnapshot, ProviderSnapshot, SnapshotError, SnapshotHandle, SnapshotStore,
    SnapshotWriter,
};
pub use summary::{SummaryGenerator, SummaryInput, TemplateSummary};
pub use types::{
    BreakerStatus, Charge, MetricsReport, PaymentReceipt, PaymentRequest, ProviderCounters,
    SummaryReport,
};
