use async_trait::async_trait;

use crate::{
    domain::{ChatId, PaymentId, UserId},
    Result,
};

/// Port for the gated channel's membership controls.
///
/// Telegram is the first implementation; eviction is "ban then immediately
/// clear the ban" so the user is kicked but free to rejoin after paying again.
#[async_trait]
pub trait ChannelGate: Send + Sync {
    async fn remove_member(&self, channel: ChatId, user: UserId) -> Result<()>;
    async fn clear_removal(&self, channel: ChatId, user: UserId) -> Result<()>;
}

/// A payment to be created with the provider.
#[derive(Clone, Debug)]
pub struct NewPayment {
    /// Decimal amount string in major units ("249.00").
    pub amount: String,
    /// ISO currency code ("RUB").
    pub currency: String,
    pub description: String,
    /// Where the provider redirects the user after checkout.
    pub return_url: String,
    /// Dedupes retried creation calls on the provider side.
    pub idempotency_key: String,
}

/// Redirect-checkout handle returned by the provider.
#[derive(Clone, Debug)]
pub struct PaymentLink {
    pub id: PaymentId,
    pub confirmation_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

/// Port for the payment processor (YooKassa in production).
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentLink>;
    async fn payment_status(&self, id: &PaymentId) -> Result<PaymentStatus>;
}
