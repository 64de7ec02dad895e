//! Per-provider payment circuit breaker library.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payments;
pub mod resilience;

pub use config::schema::BreakerServiceConfig;
pub use error::{PaymentError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use payments::PaymentProcessor;
