//! Purchase flow: tier selection → payment creation → access grant.
//!
//! When a user picks a tier we create a redirect payment with the provider
//! and hand back the checkout link. When the ledger gets written is a policy
//! decision (`GrantPolicy`): the original bot granted access optimistically
//! at purchase intent; the safer default here waits for the provider to
//! report the payment as succeeded.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    catalog::TierCatalog,
    config::GrantPolicy,
    domain::{PaymentId, TierId, UserId},
    ledger::SubscriptionLedger,
    ports::{NewPayment, PaymentLink, PaymentProvider, PaymentStatus},
    Error, Result,
};

/// A purchase awaiting payment confirmation (`GrantPolicy::OnConfirmation`).
#[derive(Clone, Debug)]
struct PendingPurchase {
    user: UserId,
    tier: TierId,
}

/// What a confirmation check found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Payment succeeded; access granted until the given instant.
    Granted { expires_at: DateTime<Utc> },
    /// Provider still reports the payment as open.
    NotPaidYet,
    /// Provider reports the payment as canceled; the pending record is gone.
    Canceled,
}

pub struct PurchaseService {
    catalog: TierCatalog,
    ledger: SubscriptionLedger,
    payments: Arc<dyn PaymentProvider>,
    policy: GrantPolicy,
    currency: String,
    return_url: String,
    pending: Mutex<HashMap<PaymentId, PendingPurchase>>,
}

impl PurchaseService {
    pub fn new(
        catalog: TierCatalog,
        ledger: SubscriptionLedger,
        payments: Arc<dyn PaymentProvider>,
        policy: GrantPolicy,
        currency: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            payments,
            policy,
            currency: currency.into(),
            return_url: return_url.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> GrantPolicy {
        self.policy
    }

    /// User picked a tier: create the payment and return the checkout link.
    ///
    /// Under `AtIntent` the ledger is written here, before any money moved.
    /// Under `OnConfirmation` the purchase is parked until
    /// [`confirm_purchase`](Self::confirm_purchase) sees it succeed.
    pub async fn start_purchase(&self, user: UserId, tier_id: &TierId) -> Result<PaymentLink> {
        self.start_purchase_at(user, tier_id, Utc::now()).await
    }

    pub async fn start_purchase_at(
        &self,
        user: UserId,
        tier_id: &TierId,
        now: DateTime<Utc>,
    ) -> Result<PaymentLink> {
        let tier = self.catalog.get(tier_id)?;

        let link = self
            .payments
            .create_payment(NewPayment {
                amount: tier.price_decimal(),
                currency: self.currency.clone(),
                description: tier.description.clone(),
                return_url: self.return_url.clone(),
                idempotency_key: Uuid::new_v4().to_string(),
            })
            .await?;

        match self.policy {
            GrantPolicy::AtIntent => {
                let expires_at = self.ledger.record_at(user, tier.duration(), now);
                info!(
                    user = user.0,
                    tier = %tier.id,
                    %expires_at,
                    "access granted at intent"
                );
            }
            GrantPolicy::OnConfirmation => {
                self.pending.lock().unwrap().insert(
                    link.id.clone(),
                    PendingPurchase {
                        user,
                        tier: tier.id.clone(),
                    },
                );
            }
        }

        info!(user = user.0, tier = %tier.id, payment = %link.id, "payment created");
        Ok(link)
    }

    /// Check a parked purchase against the provider and grant on success.
    pub async fn confirm_purchase(&self, payment: &PaymentId) -> Result<PurchaseOutcome> {
        self.confirm_purchase_at(payment, Utc::now()).await
    }

    pub async fn confirm_purchase_at(
        &self,
        payment: &PaymentId,
        now: DateTime<Utc>,
    ) -> Result<PurchaseOutcome> {
        let parked = self
            .pending
            .lock()
            .unwrap()
            .get(payment)
            .cloned()
            .ok_or_else(|| Error::InvalidInput(format!("unknown payment: {payment}")))?;

        let status = self.payments.payment_status(payment).await?;
        match status {
            PaymentStatus::Succeeded => {
                let tier = self.catalog.get(&parked.tier)?;
                let expires_at = self.ledger.record_at(parked.user, tier.duration(), now);
                self.pending.lock().unwrap().remove(payment);
                info!(
                    user = parked.user.0,
                    tier = %parked.tier,
                    %expires_at,
                    "payment confirmed, access granted"
                );
                Ok(PurchaseOutcome::Granted { expires_at })
            }
            PaymentStatus::Pending | PaymentStatus::WaitingForCapture => {
                Ok(PurchaseOutcome::NotPaidYet)
            }
            PaymentStatus::Canceled => {
                self.pending.lock().unwrap().remove(payment);
                info!(user = parked.user.0, payment = %payment, "payment canceled");
                Ok(PurchaseOutcome::Canceled)
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
