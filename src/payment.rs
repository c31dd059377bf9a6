//! Stripe integration: hosted checkout sessions and webhook signature verification.

use crate::error::{AppError, Result};
use crate::models::{MatchId, PlayerId, RegistrationId};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Card payments cost this much extra (minor units) to cover the processing fee.
pub const CARD_SURCHARGE: u32 = 20;
/// Webhook deliveries older than this are rejected.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// The subset of a Stripe checkout session the app reads.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn registration_id(&self) -> Option<RegistrationId> {
        self.metadata.get("registration_id").and_then(|id| id.parse().ok())
    }
}

/// Everything needed to open a hosted checkout for one registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Minor currency units, surcharge included.
    pub amount: u32,
    pub currency: String,
    pub product_name: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub registration_id: RegistrationId,
    pub player_name: String,
}

impl CheckoutRequest {
    /// Stripe's bracketed form encoding of the request.
    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", self.currency.clone()),
            ("line_items[0][price_data][unit_amount]", self.amount.to_string()),
            ("line_items[0][price_data][product_data][name]", self.product_name.clone()),
            ("line_items[0][price_data][product_data][description]", self.description.clone()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("client_reference_id", self.match_id.to_string()),
            ("metadata[match_id]", self.match_id.to_string()),
            ("metadata[player_id]", self.player_id.to_string()),
            ("metadata[registration_id]", self.registration_id.to_string()),
            ("metadata[player_name]", self.player_name.clone()),
        ];
        if let Some(email) = &self.customer_email {
            form.push(("customer_email", email.clone()));
        }
        form
    }
}

/// Thin client over the Stripe REST API.
#[derive(Clone, Debug)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_checkout_session(&self, req: &CheckoutRequest) -> Result<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&req.form())
            .send()
            .await?;
        let session: CheckoutSession = Self::parse(response).await?;
        log::info!("Created checkout session {} for registration {}", session.id, req.registration_id);
        Ok(session)
    }

    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
        if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::validation("invalid checkout session id"));
        }
        let response = self
            .http
            .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> Result<CheckoutSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!("stripe returned {status}: {body}")));
        }
        Ok(response.json().await?)
    }
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`, as Stripe signs webhook deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let key = PKey::hmac(secret.as_bytes())?;
    let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
    signer.update(timestamp.to_string().as_bytes())?;
    signer.update(b".")?;
    signer.update(payload)?;
    Ok(hex::encode(signer.sign_to_vec()?))
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`) against the raw body.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now: i64) -> Result<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => timestamp = t.parse::<i64>().ok(),
            Some(("v1", sig)) => candidates.push(sig),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or_else(|| AppError::Payment("signature header has no timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(AppError::Payment("signature header has no v1 signature".to_string()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::Payment("signature timestamp outside tolerance".to_string()));
    }

    let expected = hex::decode(sign_payload(secret, timestamp, payload)?)
        .map_err(|e| AppError::Payment(e.to_string()))?;
    let matches = candidates.iter().any(|sig| match hex::decode(sig) {
        Ok(given) => given.len() == expected.len() && openssl::memcmp::eq(&given, &expected),
        Err(_) => false,
    });
    if matches {
        Ok(())
    } else {
        Err(AppError::Payment("signature mismatch".to_string()))
    }
}

/// Envelope of a webhook delivery.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub const CHECKOUT_COMPLETED: &'static str = "checkout.session.completed";

    /// The checkout session carried by a `checkout.session.completed` event.
    pub fn checkout_session(&self) -> Option<CheckoutSession> {
        if self.kind != Self::CHECKOUT_COMPLETED {
            return None;
        }
        serde_json::from_value(self.data.object.clone()).ok()
    }
}
