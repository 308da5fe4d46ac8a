use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payment methods accepted at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Visa,
    Mastercard,
    Jcb,
    Amex,
    UnionPay,
    ShopeePay,
}

impl PaymentMethod {
    /// Parse a client-supplied method id. Returns None for anything outside
    /// the supported set.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "visa" => Some(Self::Visa),
            "mastercard" => Some(Self::Mastercard),
            "jcb" => Some(Self::Jcb),
            "amex" => Some(Self::Amex),
            "unionpay" => Some(Self::UnionPay),
            "shopeepay" => Some(Self::ShopeePay),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Jcb => "jcb",
            Self::Amex => "amex",
            Self::UnionPay => "unionpay",
            Self::ShopeePay => "shopeepay",
        }
    }
}

/// Outcome of a payment attempt at the provider boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Completed,
    /// Accepted by the provider but not yet settled (e-wallet style).
    Pending,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway failure: {0}")]
    Gateway(String),
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge `amount` (smallest currency unit) via `method`.
    async fn process(
        &self,
        amount: i32,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome, PaymentError>;
}

/// Adapter used in development and tests. Card methods settle immediately,
/// e-wallets stay pending until the provider callback (which this mock never
/// delivers), and one magic amount is declined.
pub struct MockPaymentAdapter;

impl MockPaymentAdapter {
    /// Amount that the mock always declines.
    pub const DECLINED_AMOUNT: i32 = 131_313;
}

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn process(
        &self,
        amount: i32,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome, PaymentError> {
        if amount == Self::DECLINED_AMOUNT {
            tracing::warn!("Mock payment declined for amount {}", amount);
            return Ok(PaymentOutcome::Failed);
        }

        let outcome = match method {
            PaymentMethod::ShopeePay => PaymentOutcome::Pending,
            _ => PaymentOutcome::Completed,
        };

        tracing::info!("Mock payment {:?} via {}: {:?}", amount, method.id(), outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_round_trip() {
        for id in ["visa", "mastercard", "jcb", "amex", "unionpay", "shopeepay"] {
            let method = PaymentMethod::parse(id).unwrap();
            assert_eq!(method.id(), id);
        }
        assert!(PaymentMethod::parse("bitcoin").is_none());
    }

    #[tokio::test]
    async fn test_mock_adapter_outcomes() {
        let adapter = MockPaymentAdapter;

        let outcome = adapter.process(150_000, PaymentMethod::Visa).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Completed);

        let outcome = adapter
            .process(150_000, PaymentMethod::ShopeePay)
            .await
            .unwrap();
        assert_eq!(outcome, PaymentOutcome::Pending);

        let outcome = adapter
            .process(MockPaymentAdapter::DECLINED_AMOUNT, PaymentMethod::Visa)
            .await
            .unwrap();
        assert_eq!(outcome, PaymentOutcome::Failed);
    }
}
