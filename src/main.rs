//! Payment circuit breaker service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /pay             ┌─────────┐    ┌──────────────┐    ┌──────────┐
//!     ─────────────────────▶│  http   │───▶│  processor   │───▶│ gateway  │──▶ Provider
//!                           │ server  │    │ breaker gate │    │ + retry  │
//!     GET /status, ...      └─────────┘    └──────┬───────┘    └──────────┘
//!                                                 │
//!                                                 ▼
//!                                         ┌──────────────┐    ┌──────────┐
//!                                         │   registry   │───▶│ snapshot │──▶ JSON file
//!                                         │ per provider │    │  writer  │
//!                                         └──────────────┘    └──────────┘
//! ```
//!
//! Startup restores each provider from the snapshot file, so an open
//! circuit stays open across restarts.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use payment_breaker::config::{load_config, BreakerServiceConfig};
use payment_breaker::error::StartupError;
use payment_breaker::http::HttpServer;
use payment_breaker::lifecycle::{spawn_signal_listener, start_services, Shutdown};
use payment_breaker::observability::{logging, metrics};
use payment_breaker::payments::{simulated_providers, SnapshotStore};
use payment_breaker::resilience::SystemClock;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "payment-breaker")]
#[command(about = "Per-provider payment circuit breaker service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "PAYMENT_BREAKER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).map_err(StartupError::from)?,
        None => BreakerServiceConfig::default(),
    };
    apply_port_override(&mut config)?;

    logging::init_logging(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "payment-breaker starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        failure_threshold = config.breaker.failure_threshold,
        cooldown_ms = config.breaker.cooldown_ms,
        max_attempts = config.retries.max_attempts,
        providers = config.providers.len(),
        snapshot_path = %config.persistence.snapshot_path.display(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
            })?;
        metrics::init_metrics(addr).map_err(StartupError::from)?;
    }

    let services = start_services(
        &config.breaker,
        config.retries.policy(),
        simulated_providers(&config.providers),
        SnapshotStore::new(config.persistence.snapshot_path.clone()),
        Arc::new(SystemClock),
    )
    .await?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(services.processor.clone());
    server.run(listener, shutdown.subscribe()).await?;
    signals.abort();

    services.shutdown(WRITER_DRAIN_TIMEOUT).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// `PORT` replaces the port of the configured bind address.
fn apply_port_override(config: &mut BreakerServiceConfig) -> Result<(), StartupError> {
    let Ok(port) = std::env::var("PORT") else {
        return Ok(());
    };
    let port: u16 = port.trim().parse().map_err(|_| StartupError::Address {
        field: "PORT",
        value: port.clone(),
    })?;

    let host = config
        .listener
        .bind_address
        .rsplit_once(':')
        .map(|(host, _)| host.to_string())
        .unwrap_or_else(|| config.listener.bind_address.clone());
    config.listener.bind_address = format!("{host}:{port}");
    Ok(())
}
