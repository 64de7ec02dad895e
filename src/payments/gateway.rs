//! Payment provider boundary.
//!
//! A gateway is the abstract fallible remote call guarded by the breaker.
//! Real provider integrations implement [`PaymentGateway`]; the service
//! ships with [`SimulatedGateway`], a flaky stand-in with configurable
//! failure rate and latency.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::payments::types::Charge;

/// A remote payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
    /// Charge the payment source. Any error is treated as transient.
    async fn charge(&self, charge: &Charge) -> Result<serde_json::Value, GatewayError>;
}

/// Simulated provider that fails a fraction of calls.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    name: String,
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(name: impl Into<String>, failure_rate: f64, latency: Duration) -> Self {
        Self {
            name: name.into(),
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.failure_rate,
            Duration::from_millis(config.latency_ms),
        )
    }
}

/// One simulated gateway per configured provider, in configuration order.
pub fn simulated_providers(providers: &[ProviderConfig]) -> Vec<(String, Arc<dyn PaymentGateway>)> {
    providers
        .iter()
        .map(|p| {
            let gateway: Arc<dyn PaymentGateway> = Arc::new(SimulatedGateway::from_config(p));
            (p.name.clone(), gateway)
        })
        .collect()
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, charge: &Charge) -> Result<serde_json::Value, GatewayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let (failed, reference) = {
            let mut rng = rand::thread_rng();
            (rng.gen_bool(self.failure_rate), rng.gen_range(0..1_000_000u32))
        };

        if failed {
            return Err(GatewayError::new(format!("{} error: simulated failure", self.name)));
        }

        Ok(json!({
            "status": "success",
            "amount": charge.amount,
            "currency": charge.currency,
            "source": charge.source,
            "providerId": format!("{}_{}", self.name, reference),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge() -> Charge {
        Charge {
            amount: 25.0,
            currency: "USD".into(),
            source: "tok_visa".into(),
        }
    }

    #[tokio::test]
    async fn test_reliable_gateway_returns_payload() {
        let gateway = SimulatedGateway::new("stripe", 0.0, Duration::ZERO);
        let result = gateway.charge(&charge()).await.unwrap();

        assert_eq!(result["status"], "success");
        assert_eq!(result["currency"], "USD");
        assert!(result["providerId"].as_str().unwrap().starts_with("stripe_"));
    }

    #[tokio::test]
    async fn test_broken_gateway_reports_provider_error() {
        let gateway = SimulatedGateway::new("paypal", 1.0, Duration::ZERO);
        let err = gateway.charge(&charge()).await.unwrap_err();
        assert_eq!(err.to_string(), "paypal error: simulated failure");
    }

    #[test]
    fn test_simulated_providers_follow_config_order() {
        let providers = simulated_providers(&crate::config::schema::default_providers());
        let names: Vec<&str> = providers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["stripe", "paypal"]);
    }
}
