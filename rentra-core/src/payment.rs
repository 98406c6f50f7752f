use async_trait::async_trait;
use rentra_shared::Money;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider declined: {0}")]
    Declined(String),

    #[error("payment provider unreachable: {0}")]
    Unreachable(String),
}

/// Boundary to the external payment processor. Deposit holds and invoice
/// payments return the provider's transaction reference, which the ledger
/// stores but never interprets.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn hold_deposit(&self, booking_id: Uuid, amount: Money) -> Result<String, PaymentError>;

    async fn release_deposit(&self, booking_id: Uuid, amount: Money)
        -> Result<String, PaymentError>;

    async fn forfeit_deposit(&self, booking_id: Uuid, amount: Money)
        -> Result<String, PaymentError>;

    async fn pay_invoice(
        &self,
        booking_id: Uuid,
        amount: Money,
        method: &str,
    ) -> Result<String, PaymentError>;
}

/// Stand-in provider returning deterministic references. A real system
/// would switch between card processors here.
pub struct MockPayProvider {
    name: String,
}

impl MockPayProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn reference(&self, prefix: &str, booking_id: Uuid) -> String {
        format!("{}-{}-{}", prefix, self.name.to_lowercase(), booking_id.simple())
    }
}

impl Default for MockPayProvider {
    fn default() -> Self {
        Self::new("MockPay")
    }
}

#[async_trait]
impl PaymentProvider for MockPayProvider {
    async fn hold_deposit(&self, booking_id: Uuid, amount: Money) -> Result<String, PaymentError> {
        tracing::info!(%booking_id, %amount, "holding deposit");
        Ok(self.reference("hold", booking_id))
    }

    async fn release_deposit(
        &self,
        booking_id: Uuid,
        amount: Money,
    ) -> Result<String, PaymentError> {
        tracing::info!(%booking_id, %amount, "releasing deposit");
        Ok(self.reference("release", booking_id))
    }

    async fn forfeit_deposit(
        &self,
        booking_id: Uuid,
        amount: Money,
    ) -> Result<String, PaymentError> {
        tracing::info!(%booking_id, %amount, "forfeiting deposit");
        Ok(self.reference("forfeit", booking_id))
    }

    async fn pay_invoice(
        &self,
        booking_id: Uuid,
        amount: Money,
        method: &str,
    ) -> Result<String, PaymentError> {
        tracing::info!(%booking_id, %amount, method, "collecting invoice payment");
        Ok(self.reference("invoice", booking_id))
    }
}
