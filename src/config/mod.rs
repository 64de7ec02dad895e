//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BreakerServiceConfig (validated, immutable)
//!     → consumed once at startup to build the provider registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breaker limits are fixed per process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BreakerServiceConfig;
pub use schema::{
    BreakerConfig, ListenerConfig, ObservabilityConfig, PersistenceConfig, ProviderConfig,
    RetryConfig,
};
pub use validation::{validate_config, ValidationError};
