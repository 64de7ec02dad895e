//! Endpoint handlers.
//!
//! Thin adapters from HTTP to [`PaymentProcessor`] operations. Query
//! endpoints take an optional `provider` and fall back to the first
//! configured one. A `provider` that names no configured provider is a
//! 404, not a silent fallback to the default.
//!
//! `/pay` bodies only fail to decode when they are not a JSON object; every
//! field check happens in the processor, after the provider and breaker
//! checks.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::payments::{BreakerStatus, MetricsReport, PaymentRequest, SummaryReport};

#[derive(Debug, Default, Deserialize)]
pub struct ProviderQuery {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaySuccess {
    pub status: &'static str,
    pub provider_result: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn pay(
    State(state): State<AppState>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<PaySuccess>, ApiError> {
    let Json(request) = body?;
    let receipt = state.processor.submit(&request).await?;
    Ok(Json(PaySuccess {
        status: "success",
        provider_result: receipt.provider_result,
    }))
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<BreakerStatus>, ApiError> {
    let provider = resolve(&state, query)?;
    state.processor.breaker_status(&provider).map(Json).map_err(ApiError::lookup)
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<SummaryReport>, ApiError> {
    let provider = resolve(&state, query)?;
    state.processor.summary(&provider).map(Json).map_err(ApiError::lookup)
}

pub async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<MetricsReport>, ApiError> {
    let provider = resolve(&state, query)?;
    state.processor.metrics(&provider).map(Json).map_err(ApiError::lookup)
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn resolve(state: &AppState, query: ProviderQuery) -> Result<String, ApiError> {
    match query.provider {
        Some(p) => Ok(p),
        None => state
            .processor
            .default_provider()
            .map(str::to_string)
            .ok_or_else(|| ApiError::lookup(PaymentError::ProviderUnknown(String::new()))),
    }
}
