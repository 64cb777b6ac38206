//! Payment gateway boundary. The real processor is out of scope; the
//! engine only depends on this trait, and the mock implementation stands
//! in for it. A production integration would need idempotency keys and
//! webhook-driven confirmation instead of synchronous verification.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub transaction_id: String,
    pub amount: Decimal,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        employer_id: Uuid,
        amount: Decimal,
        payment_method: &str,
    ) -> Result<PaymentIntent, ServiceError>;

    /// Returns whether the intent settled. `Ok(false)` is a declined
    /// payment; `Err` is a gateway transport failure.
    async fn verify_intent(&self, intent: &PaymentIntent) -> Result<bool, ServiceError>;
}

/// Synchronous mock: creates intents locally and verifies them according
/// to a fixed policy.
pub struct MockGateway {
    decline_all: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self { decline_all: false }
    }

    /// A gateway that declines every verification; used to exercise the
    /// payment-failed path.
    pub fn declining() -> Self {
        Self { decline_all: true }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        employer_id: Uuid,
        amount: Decimal,
        payment_method: &str,
    ) -> Result<PaymentIntent, ServiceError> {
        let id = Uuid::new_v4().simple().to_string();
        tracing::info!(
            %employer_id,
            %amount,
            payment_method,
            intent_id = %id,
            "created mock payment intent"
        );
        Ok(PaymentIntent {
            intent_id: format!("pi_{}", id),
            transaction_id: format!("txn_{}", id),
            amount,
        })
    }

    async fn verify_intent(&self, intent: &PaymentIntent) -> Result<bool, ServiceError> {
        if self.decline_all {
            tracing::warn!(intent_id = %intent.intent_id, "mock gateway declined intent");
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_verifies_its_own_intents() {
        let gateway = MockGateway::new();
        let intent = gateway
            .create_intent(Uuid::new_v4(), Decimal::new(100000, 2), "card")
            .await
            .unwrap();
        assert!(intent.intent_id.starts_with("pi_"));
        assert!(gateway.verify_intent(&intent).await.unwrap());
    }

    #[tokio::test]
    async fn declining_gateway_fails_verification() {
        let gateway = MockGateway::declining();
        let intent = gateway
            .create_intent(Uuid::new_v4(), Decimal::new(100000, 2), "card")
            .await
            .unwrap();
        assert!(!gateway.verify_intent(&intent).await.unwrap());
    }
}
