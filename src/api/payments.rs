//! Card payment endpoints: Stripe checkout, session verification, webhook.

use super::State;
use crate::error::AppError;
use crate::logic::payments;
use crate::models::RegistrationId;
use actix_web::{
    post,
    web::{Bytes, Json, Path},
    HttpRequest, HttpResponse,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct RegistrationPath {
    id: RegistrationId,
}

#[derive(Deserialize)]
pub(super) struct VerifyBody {
    session_id: String,
}

fn stripe_disabled() -> AppError {
    AppError::Payment("stripe is not configured".to_string())
}

/// Open a hosted checkout for a registration; the client redirects to the returned URL.
#[post("/api/registrations/{id}/checkout")]
pub(super) async fn api_checkout(state: State, path: Path<RegistrationPath>) -> Result<HttpResponse, AppError> {
    let stripe = state.stripe.as_ref().ok_or_else(stripe_disabled)?;
    let request = payments::checkout_request(&state.pool, path.id, &state.payments).await?;
    let session = stripe.create_checkout_session(&request).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_id": session.id,
        "url": session.url,
    })))
}

/// Called after the checkout redirect: marks the registration paid if Stripe says so.
#[post("/api/payments/verify")]
pub(super) async fn api_verify_payment(state: State, body: Json<VerifyBody>) -> Result<HttpResponse, AppError> {
    let stripe = state.stripe.as_ref().ok_or_else(stripe_disabled)?;
    let session = stripe.retrieve_checkout_session(&body.session_id).await?;
    let paid = payments::apply_checkout_session(&state.pool, &session).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": paid.is_some(),
        "registration_id": paid,
    })))
}

#[post("/api/webhooks/stripe")]
pub(super) async fn api_stripe_webhook(state: State, req: HttpRequest, body: Bytes) -> Result<HttpResponse, AppError> {
    let secret = state
        .payments
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Payment("webhook secret is not set".to_string()))?;
    let signature = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Payment("missing Stripe-Signature header".to_string()))?;
    let receipt = payments::handle_webhook(&state.pool, secret, signature, &body, Utc::now().timestamp()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}
