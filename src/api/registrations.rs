//! Registration endpoints: register, cancel, admin removal, team and payment flags.

use super::State;
use crate::error::AppError;
use crate::logic::{self, payments, PlayerIdentity};
use crate::models::{MatchId, PlayerId, RegistrationId, Team};
use actix_web::{
    delete, post, put,
    web::{Json, Path},
    HttpResponse,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
pub(super) struct MatchPlayerPath {
    id: MatchId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
pub(super) struct RegistrationPath {
    id: RegistrationId,
}

#[derive(Deserialize)]
pub(super) struct PaymentBody {
    has_paid: bool,
}

#[derive(Deserialize)]
pub(super) struct TeamBody {
    team: Option<Team>,
}

/// Register a player (idempotent; waitlists when the match is full).
#[post("/api/matches/{id}/registrations")]
pub(super) async fn api_register(
    state: State,
    path: Path<MatchPath>,
    body: Json<PlayerIdentity>,
) -> Result<HttpResponse, AppError> {
    let result = logic::register_player(&state.pool, path.id, &body, state.capacity, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Hard-delete a player's registration (organizer action).
#[delete("/api/matches/{id}/players/{player_id}")]
pub(super) async fn api_remove_player(state: State, path: Path<MatchPlayerPath>) -> Result<HttpResponse, AppError> {
    logic::remove_player_from_match(&state.pool, path.id, path.player_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Cancel and, if a slot opened up, promote the longest-waiting player.
#[post("/api/registrations/{id}/cancel")]
pub(super) async fn api_cancel(state: State, path: Path<RegistrationPath>) -> Result<HttpResponse, AppError> {
    let result = logic::cancel_with_promotion(&state.pool, path.id, state.capacity, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[put("/api/registrations/{id}/payment")]
pub(super) async fn api_set_payment(
    state: State,
    path: Path<RegistrationPath>,
    body: Json<PaymentBody>,
) -> Result<HttpResponse, AppError> {
    let reg = payments::set_payment_status(&state.pool, path.id, body.has_paid).await?;
    Ok(HttpResponse::Ok().json(reg))
}

#[put("/api/registrations/{id}/team")]
pub(super) async fn api_set_team(
    state: State,
    path: Path<RegistrationPath>,
    body: Json<TeamBody>,
) -> Result<HttpResponse, AppError> {
    let reg = logic::update_player_team(&state.pool, path.id, body.team).await?;
    Ok(HttpResponse::Ok().json(reg))
}

/// Organizer confirms a Revolut transfer.
#[post("/api/registrations/{id}/manual-payment")]
pub(super) async fn api_manual_payment(state: State, path: Path<RegistrationPath>) -> Result<HttpResponse, AppError> {
    let reg = payments::confirm_manual_payment(&state.pool, path.id).await?;
    Ok(HttpResponse::Ok().json(reg))
}
