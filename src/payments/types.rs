//! Payment request and report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PaymentError;
use crate::resilience::{CircuitStatus, MetricsState};

/// Payment submission as received from a client.
///
/// Call parameters are kept as raw JSON so that missing or mistyped values
/// surface as `InvalidRequest` after the provider and breaker checks, not
/// as decode failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    #[serde(deserialize_with = "provider_id")]
    pub provider: String,
    pub amount: Option<Value>,
    pub currency: Option<Value>,
    pub source: Option<Value>,
}

impl PaymentRequest {
    pub fn new(
        provider: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            amount: Some(Value::from(amount)),
            currency: Some(Value::from(currency.into())),
            source: Some(Value::from(source.into())),
        }
    }

    /// Check the call parameters and produce the charge sent to the provider.
    pub fn validate(&self) -> Result<Charge, PaymentError> {
        let amount = match present(&self.amount) {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(a) if a.is_finite() && a > 0.0 => a,
                _ => return Err(invalid(format!("amount must be a positive number, got {}", n))),
            },
            Some(other) => {
                return Err(invalid(format!("amount must be a positive number, got {}", other)))
            }
            None => return Err(missing("amount")),
        };

        let currency = match present(&self.currency) {
            Some(Value::String(c)) if c.trim().is_empty() => return Err(missing("currency")),
            Some(Value::String(c))
                if c.trim().len() == 3 && c.trim().chars().all(|ch| ch.is_ascii_alphabetic()) =>
            {
                c.trim().to_ascii_uppercase()
            }
            Some(other) => {
                return Err(invalid(format!("currency must be a 3-letter code, got {}", other)))
            }
            None => return Err(missing("currency")),
        };

        let source = match present(&self.source) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::String(_)) | None => return Err(missing("source")),
            Some(other) => {
                return Err(invalid(format!("source must be a token string, got {}", other)))
            }
        };

        Ok(Charge {
            amount,
            currency,
            source,
        })
    }
}

/// Provider ids are matched as text; a non-string id simply matches nothing.
fn provider_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// `null` counts as absent.
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn invalid(reason: String) -> PaymentError {
    PaymentError::InvalidRequest(reason)
}

fn missing(field: &str) -> PaymentError {
    PaymentError::InvalidRequest(format!("Missing payment field: {}", field))
}

/// A validated charge handed to a payment gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub amount: f64,
    pub currency: String,
    pub source: String,
}

/// Successful payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub provider: String,
    pub attempts: u32,
    /// Payload returned by the provider.
    pub provider_result: serde_json::Value,
}

/// Call-level counters used for failure-rate summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCounters {
    pub total_attempts: u64,
    pub total_failures: u64,
}

/// Breaker view returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStatus {
    pub provider: String,
    #[serde(rename = "circuitState")]
    pub status: CircuitStatus,
    pub failure_count: u32,
    #[serde(rename = "lastFailure")]
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Cumulative metrics for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsReport {
    pub provider: String,
    #[serde(flatten)]
    pub metrics: MetricsState,
}

/// On-demand summary plus the one captured when the circuit last opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub provider: String,
    pub summary: String,
    pub last_auto_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request_normalises_currency() {
        let charge = PaymentRequest::new("stripe", 12.5, "usd", "tok_visa")
            .validate()
            .unwrap();
        assert_eq!(charge.currency, "USD");
        assert_eq!(charge.amount, 12.5);
        assert_eq!(charge.source, "tok_visa");
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let request = PaymentRequest {
            provider: "stripe".into(),
            amount: Some(Value::from(10.0)),
            ..Default::default()
        };
        assert_eq!(
            request.validate().unwrap_err(),
            PaymentError::InvalidRequest("Missing payment field: currency".into())
        );

        let request = PaymentRequest {
            amount: None,
            ..PaymentRequest::new("stripe", 1.0, "EUR", "tok")
        };
        assert!(matches!(request.validate(), Err(PaymentError::InvalidRequest(_))));
    }

    #[test]
    fn test_rejects_bad_amount_and_currency() {
        assert!(PaymentRequest::new("stripe", 0.0, "USD", "tok").validate().is_err());
        assert!(PaymentRequest::new("stripe", -3.0, "USD", "tok").validate().is_err());
        assert!(PaymentRequest::new("stripe", f64::NAN, "USD", "tok").validate().is_err());
        assert!(PaymentRequest::new("stripe", 5.0, "US", "tok").validate().is_err());
        assert!(PaymentRequest::new("stripe", 5.0, "U$D", "tok").validate().is_err());
        assert!(PaymentRequest::new("stripe", 5.0, "USD", "  ").validate().is_err());
    }

    #[test]
    fn test_mistyped_fields_decode_and_fail_validation() {
        let request: PaymentRequest = serde_json::from_str(
            r#"{"provider":"stripe","amount":"10","currency":"USD","source":"tok"}"#,
        )
        .unwrap();
        assert_eq!(request.provider, "stripe");
        assert_eq!(
            request.validate().unwrap_err(),
            PaymentError::InvalidRequest("amount must be a positive number, got \"10\"".into())
        );

        let request: PaymentRequest =
            serde_json::from_str(r#"{"provider":7,"amount":1,"currency":["USD"],"source":null}"#)
                .unwrap();
        assert_eq!(request.provider, "7");
        assert!(matches!(request.validate(), Err(PaymentError::InvalidRequest(_))));
    }

    #[test]
    fn test_request_decodes_with_missing_fields() {
        let request: PaymentRequest = serde_json::from_str(r#"{"provider":"paypal"}"#).unwrap();
        assert_eq!(request.provider, "paypal");
        assert!(request.amount.is_none());
    }
}
