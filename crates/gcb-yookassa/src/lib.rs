//! YooKassa adapter (payments).
//!
//! Implements the `gcb-core` `PaymentProvider` port over the YooKassa v3
//! REST API: redirect-confirmation payments with immediate capture, and the
//! status lookup used to confirm a purchase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gcb_core::{
    domain::PaymentId,
    errors::Error,
    ports::{NewPayment, PaymentLink, PaymentProvider, PaymentStatus},
    Result,
};

const DEFAULT_BASE_URL: &str = "https://api.yookassa.ru/v3";

#[derive(Clone, Debug)]
pub struct YooKassaClient {
    shop_id: String,
    secret_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl YooKassaClient {
    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(shop_id, secret_key, DEFAULT_BASE_URL)
    }

    /// Base URL override for tests / sandbox shops.
    pub fn with_base_url(
        shop_id: impl Into<String>,
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            base_url: base_url.into(),
            http,
        }
    }

    fn map_err(context: &str, e: reqwest::Error) -> Error {
        Error::External(format!("yookassa {context} error: {e}"))
    }

    async fn check_status(context: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::External(format!(
            "yookassa {context} failed: {status} {}",
            body.chars().take(200).collect::<String>()
        )))
    }
}

// === Wire types ===

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct Amount {
    value: String,
    currency: String,
}

#[derive(Serialize, Debug)]
struct ConfirmationRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    return_url: String,
}

#[derive(Serialize, Debug)]
struct CreatePaymentRequest {
    amount: Amount,
    confirmation: ConfirmationRequest,
    capture: bool,
    description: String,
}

#[derive(Deserialize, Debug)]
struct ConfirmationResponse {
    confirmation_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PaymentResponse {
    id: String,
    status: String,
    confirmation: Option<ConfirmationResponse>,
}

fn parse_status(raw: &str) -> Result<PaymentStatus> {
    match raw {
        "pending" => Ok(PaymentStatus::Pending),
        "waiting_for_capture" => Ok(PaymentStatus::WaitingForCapture),
        "succeeded" => Ok(PaymentStatus::Succeeded),
        "canceled" => Ok(PaymentStatus::Canceled),
        other => Err(Error::External(format!(
            "yookassa returned unknown payment status: {other}"
        ))),
    }
}

#[async_trait]
impl PaymentProvider for YooKassaClient {
    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentLink> {
        let body = CreatePaymentRequest {
            amount: Amount {
                value: payment.amount,
                currency: payment.currency,
            },
            confirmation: ConfirmationRequest {
                kind: "redirect",
                return_url: payment.return_url,
            },
            capture: true,
            description: payment.description,
        };

        let resp = self
            .http
            .post(format!("{}/payments", self.base_url))
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .header("Idempotence-Key", payment.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_err("create", e))?;

        let resp = Self::check_status("create", resp).await?;
        let parsed: PaymentResponse = resp.json().await.map_err(|e| Self::map_err("create", e))?;

        let confirmation_url = parsed
            .confirmation
            .and_then(|c| c.confirmation_url)
            .ok_or_else(|| {
                Error::External("yookassa response missing confirmation_url".to_string())
            })?;

        Ok(PaymentLink {
            id: PaymentId(parsed.id),
            confirmation_url,
        })
    }

    async fn payment_status(&self, id: &PaymentId) -> Result<PaymentStatus> {
        let resp = self
            .http
            .get(format!("{}/payments/{}", self.base_url, id))
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .send()
            .await
            .map_err(|e| Self::map_err("status", e))?;

        let resp = Self::check_status("status", resp).await?;
        let parsed: PaymentResponse = resp.json().await.map_err(|e| Self::map_err("status", e))?;
        parse_status(&parsed.status)
    }
}
