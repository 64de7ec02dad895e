//! Error responses.
//!
//! # Responsibilities
//! - Map payment errors to HTTP status codes
//! - Render every failure as `{"status": "error", "reason": ...}`
//!
//! # Design Decisions
//! - Submission errors and lookup errors share a body but not a status:
//!   an unknown provider is a bad payment request, but a missing resource
//!   on the query endpoints
//! - Malformed JSON bodies are reported as invalid requests

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::PaymentError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    reason: &'a str,
}

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub reason: String,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Mapping for the query endpoints, where an unknown provider is a 404.
    pub fn lookup(error: PaymentError) -> Self {
        match error {
            PaymentError::ProviderUnknown(_) => Self::new(StatusCode::NOT_FOUND, error.to_string()),
            other => Self::from(other),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(error: PaymentError) -> Self {
        let status = match &error {
            PaymentError::ProviderUnknown(_) | PaymentError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::AllAttemptsExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from(PaymentError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            reason: &self.reason,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_status_codes() {
        let cases = [
            (PaymentError::ProviderUnknown("x".into()), StatusCode::BAD_REQUEST),
            (PaymentError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (PaymentError::CircuitOpen("stripe".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                PaymentError::AllAttemptsExhausted {
                    attempts: 3,
                    message: "stripe error: simulated failure".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn test_lookup_unknown_provider_is_not_found() {
        let error = ApiError::lookup(PaymentError::ProviderUnknown("adyen".into()));
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.reason, "Unknown payment provider: adyen");
    }

    #[test]
    fn test_exhausted_reason_is_last_error() {
        let error = ApiError::from(PaymentError::AllAttemptsExhausted {
            attempts: 3,
            message: "paypal error: simulated failure".into(),
        });
        assert_eq!(error.reason, "paypal error: simulated failure");
    }
}
