//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;

use axum::{
    http::Request,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::payments::PaymentProcessor;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub processor: Arc<PaymentProcessor>,
}

/// HTTP front end of the payment processor.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(processor: Arc<PaymentProcessor>) -> Self {
        let router = Self::build_router(AppState { processor });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No request timeout is applied: a payment takes as long as its
    /// attempts and backoff delays.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/pay", post(handlers::pay))
            .route("/status", get(handlers::status))
            .route("/status/summary", get(handlers::summary))
            .route("/metrics", get(handlers::metrics))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a value arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
