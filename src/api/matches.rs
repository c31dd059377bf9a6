//! Match endpoints: scheduling, status/score, roster, waitlist, team sheets.

use super::State;
use crate::db::Tables;
use crate::error::AppError;
use crate::logic::{self, matches, TeamSheet};
use crate::models::{MatchId, MatchStatus, RegistrationStatus};
use actix_web::{
    get, post, put,
    web::{Json, Path, Query},
    HttpResponse,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
pub(super) struct CreateMatchBody {
    date: NaiveDate,
    #[serde(default = "matches::default_kickoff")]
    time: NaiveTime,
    #[serde(default)]
    price: Option<u32>,
}

#[derive(Deserialize, Default)]
pub(super) struct PriceBody {
    #[serde(default)]
    price: Option<u32>,
}

#[derive(Deserialize)]
pub(super) struct PastQuery {
    #[serde(default = "default_past_limit")]
    limit: usize,
}

fn default_past_limit() -> usize {
    10
}

#[derive(Deserialize)]
pub(super) struct StatusBody {
    status: MatchStatus,
}

#[derive(Deserialize)]
pub(super) struct ScoreBody {
    score_a: i64,
    score_b: i64,
}

/// All matches, newest first.
#[get("/api/matches")]
pub(super) async fn api_list_matches(state: State) -> Result<HttpResponse, AppError> {
    let all = matches::list_matches(&state.pool).await?;
    Ok(HttpResponse::Ok().json(all))
}

#[post("/api/matches")]
pub(super) async fn api_create_match(state: State, body: Json<CreateMatchBody>) -> Result<HttpResponse, AppError> {
    let m = matches::create_match(&state.pool, body.date, body.time, body.price, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// Create the weekly match on the coming Thursday at 21:00.
#[post("/api/matches/next-thursday")]
pub(super) async fn api_create_next_thursday(state: State, body: Option<Json<PriceBody>>) -> Result<HttpResponse, AppError> {
    let price = body.and_then(|b| b.price);
    let m = matches::create_next_thursday_match(&state.pool, price, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(m))
}

#[get("/api/matches/active")]
pub(super) async fn api_active_match(state: State) -> Result<HttpResponse, AppError> {
    match matches::active_match(&state.pool).await? {
        Some(m) => Ok(HttpResponse::Ok().json(m)),
        None => Err(AppError::NotFound("match")),
    }
}

#[get("/api/matches/past")]
pub(super) async fn api_past_matches(state: State, query: Query<PastQuery>) -> Result<HttpResponse, AppError> {
    let past = matches::past_matches(&state.pool, query.limit).await?;
    Ok(HttpResponse::Ok().json(past))
}

#[get("/api/matches/{id}")]
pub(super) async fn api_get_match(state: State, path: Path<MatchPath>) -> Result<HttpResponse, AppError> {
    let m = matches::get_match(&state.pool, path.id).await?;
    Ok(HttpResponse::Ok().json(m))
}

#[put("/api/matches/{id}/status")]
pub(super) async fn api_update_status(
    state: State,
    path: Path<MatchPath>,
    body: Json<StatusBody>,
) -> Result<HttpResponse, AppError> {
    let m = matches::update_match_status(&state.pool, path.id, body.status).await?;
    Ok(HttpResponse::Ok().json(m))
}

#[put("/api/matches/{id}/score")]
pub(super) async fn api_update_score(
    state: State,
    path: Path<MatchPath>,
    body: Json<ScoreBody>,
) -> Result<HttpResponse, AppError> {
    let m = matches::update_match_score(&state.pool, path.id, body.score_a, body.score_b).await?;
    Ok(HttpResponse::Ok().json(m))
}

/// Roster: active, then waitlisted (with rank), then canceled.
#[get("/api/matches/{id}/players")]
pub(super) async fn api_match_players(state: State, path: Path<MatchPath>) -> Result<HttpResponse, AppError> {
    let roster = logic::match_roster(&state.pool, path.id).await?;
    let active_count = roster.iter().filter(|p| p.status == RegistrationStatus::Active).count();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "capacity": state.capacity,
        "active_count": active_count,
        "players": roster,
    })))
}

#[get("/api/matches/{id}/waitlist")]
pub(super) async fn api_waitlist(state: State, path: Path<MatchPath>) -> Result<HttpResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let tables = Tables::load_match(&mut conn, path.id).await?;
    let entries: Vec<_> = logic::waitlist(&tables, path.id)
        .into_iter()
        .enumerate()
        .map(|(i, r)| serde_json::json!({ "registration_id": r.id, "player_id": r.player_id, "position": i + 1 }))
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

/// Proposed balanced lineup; nothing is saved.
#[get("/api/matches/{id}/teams/auto")]
pub(super) async fn api_auto_assign(state: State, path: Path<MatchPath>) -> Result<HttpResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let tables = Tables::load_match(&mut conn, path.id).await?;
    let lineup = logic::auto_assign(&tables, path.id, &mut rand::thread_rng())?;
    Ok(HttpResponse::Ok().json(lineup))
}

#[put("/api/matches/{id}/teams")]
pub(super) async fn api_save_teams(
    state: State,
    path: Path<MatchPath>,
    body: Json<TeamSheet>,
) -> Result<HttpResponse, AppError> {
    logic::save_team_sheet(&state.pool, path.id, &body).await?;
    let roster = logic::match_roster(&state.pool, path.id).await?;
    Ok(HttpResponse::Ok().json(roster))
}

#[get("/api/matches/{id}/teams/power")]
pub(super) async fn api_team_power(state: State, path: Path<MatchPath>) -> Result<HttpResponse, AppError> {
    let mut conn = state.pool.acquire().await?;
    let tables = Tables::load_match(&mut conn, path.id).await?;
    let power = logic::team_power(&tables, path.id)?;
    Ok(HttpResponse::Ok().json(power))
}
