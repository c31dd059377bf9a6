//! Payment bookkeeping: paid flags, manual (Revolut) confirmation, and applying Stripe results.

use crate::config::PaymentConfig;
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::logic::matches::get_match;
use crate::logic::profile::get_player;
use crate::logic::registration::get_registration;
use crate::models::{Registration, RegistrationId};
use crate::payment::{verify_signature, CheckoutRequest, CheckoutSession, WebhookEvent, CARD_SURCHARGE};
use serde::Serialize;

pub async fn set_payment_status(pool: &DbPool, registration_id: RegistrationId, has_paid: bool) -> Result<Registration> {
    let reg = sqlx::query_as::<_, Registration>("UPDATE registrations SET has_paid = ? WHERE id = ? RETURNING *")
        .bind(has_paid)
        .bind(registration_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("registration"))?;
    log::info!("Registration {} has_paid = {}", registration_id, has_paid);
    Ok(reg)
}

/// Organizer confirms a bank transfer made outside the app.
pub async fn confirm_manual_payment(pool: &DbPool, registration_id: RegistrationId) -> Result<Registration> {
    set_payment_status(pool, registration_id, true).await
}

/// Mark the registration named in a paid session's metadata as paid.
/// Returns `None` for unpaid sessions or sessions without a registration.
pub async fn apply_checkout_session(pool: &DbPool, session: &CheckoutSession) -> Result<Option<RegistrationId>> {
    if !session.is_paid() {
        return Ok(None);
    }
    let Some(id) = session.registration_id() else {
        log::warn!("Paid checkout session {} has no registration metadata", session.id);
        return Ok(None);
    };
    set_payment_status(pool, id, true).await?;
    Ok(Some(id))
}

/// Build the hosted checkout request for a registration: match price plus card surcharge.
pub async fn checkout_request(
    pool: &DbPool,
    registration_id: RegistrationId,
    config: &PaymentConfig,
) -> Result<CheckoutRequest> {
    let reg = get_registration(pool, registration_id).await?;
    let m = get_match(pool, reg.match_id).await?;
    let player = get_player(pool, reg.player_id).await?;
    let base = config.app_url.trim_end_matches('/');
    let date = m.date.format("%d.%m.%Y");
    let time = m.time.format("%H:%M");

    Ok(CheckoutRequest {
        amount: m.price + CARD_SURCHARGE,
        currency: config.currency.clone(),
        product_name: format!("{} - {}", config.app_name, date),
        description: format!("Football pitch fee - {} {}", date, time),
        success_url: format!("{base}/match/{}?payment_success=true&session_id={{CHECKOUT_SESSION_ID}}", m.id),
        cancel_url: format!("{base}/match/{}?payment_canceled=true", m.id),
        customer_email: player.email,
        match_id: m.id,
        player_id: player.id,
        registration_id: reg.id,
        player_name: player.name,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct WebhookReceipt {
    pub received: bool,
    /// Registration marked paid by this delivery, if any.
    pub paid_registration: Option<RegistrationId>,
}

/// Verify and apply one webhook delivery.
///
/// A paid session whose registration no longer exists is logged and acknowledged.
pub async fn handle_webhook(pool: &DbPool, secret: &str, signature: &str, body: &[u8], now: i64) -> Result<WebhookReceipt> {
    verify_signature(secret, signature, body, now)?;
    let event: WebhookEvent =
        serde_json::from_slice(body).map_err(|e| AppError::Payment(format!("malformed event: {e}")))?;

    let paid_registration = match event.checkout_session() {
        Some(session) => match apply_checkout_session(pool, &session).await {
            Ok(Some(id)) => {
                log::info!("Payment successful for registration {}", id);
                Some(id)
            }
            Ok(None) => None,
            Err(AppError::NotFound(what)) => {
                log::warn!("Checkout session {} paid for a missing {}; acknowledging", session.id, what);
                None
            }
            Err(e) => return Err(e),
        },
        None => {
            log::info!("Unhandled webhook event type: {}", event.kind);
            None
        }
    };
    Ok(WebhookReceipt {
        received: true,
        paid_registration,
    })
}
