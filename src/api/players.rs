//! Player endpoints: profiles, ratings, photos, statistics and ranking.

use super::State;
use crate::db::Tables;
use crate::error::AppError;
use crate::logic::profile::{self, ProfileUpdate, RatingsUpdate};
use crate::logic::stats::{self, DEFAULT_MIN_MATCHES};
use crate::models::PlayerId;
use actix_web::{
    get, post, put,
    web::{Bytes, Json, Path, Query},
    HttpResponse,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct PlayerPath {
    id: PlayerId,
}

#[derive(Deserialize)]
pub(super) struct ListQuery {
    phone: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct RankingQuery {
    #[serde(default = "default_min_matches")]
    min_matches: u32,
}

fn default_min_matches() -> u32 {
    DEFAULT_MIN_MATCHES
}

/// Every row, read inside one transaction so the three tables agree.
async fn load_all(state: &State) -> Result<Tables, AppError> {
    let mut tx = state.pool.begin().await?;
    let tables = Tables::load_all(&mut tx).await?;
    tx.commit().await?;
    Ok(tables)
}

#[derive(Deserialize)]
pub(super) struct PhotoQuery {
    ext: String,
}

/// All players by name, or the one player with `?phone=`.
#[get("/api/players")]
pub(super) async fn api_list_players(state: State, query: Query<ListQuery>) -> Result<HttpResponse, AppError> {
    match &query.phone {
        Some(phone) => {
            let player = profile::player_by_phone(&state.pool, phone).await?;
            Ok(HttpResponse::Ok().json(player))
        }
        None => {
            let players = profile::list_players(&state.pool).await?;
            Ok(HttpResponse::Ok().json(players))
        }
    }
}

#[get("/api/players/ranking")]
pub(super) async fn api_ranking(state: State, query: Query<RankingQuery>) -> Result<HttpResponse, AppError> {
    let tables = load_all(&state).await?;
    let ranking = stats::player_ranking(&tables, query.min_matches)?;
    Ok(HttpResponse::Ok().json(ranking))
}

#[get("/api/players/{id}")]
pub(super) async fn api_get_player(state: State, path: Path<PlayerPath>) -> Result<HttpResponse, AppError> {
    let player = profile::get_player(&state.pool, path.id).await?;
    Ok(HttpResponse::Ok().json(player))
}

#[put("/api/players/{id}/profile")]
pub(super) async fn api_update_profile(
    state: State,
    path: Path<PlayerPath>,
    body: Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
    let player = profile::update_profile(&state.pool, path.id, &body).await?;
    Ok(HttpResponse::Ok().json(player))
}

#[put("/api/players/{id}/ratings")]
pub(super) async fn api_update_ratings(
    state: State,
    path: Path<PlayerPath>,
    body: Json<RatingsUpdate>,
) -> Result<HttpResponse, AppError> {
    let player = profile::update_ratings(&state.pool, path.id, &body).await?;
    Ok(HttpResponse::Ok().json(player))
}

#[post("/api/players/{id}/confirm")]
pub(super) async fn api_confirm_player(state: State, path: Path<PlayerPath>) -> Result<HttpResponse, AppError> {
    let player = profile::confirm_player(&state.pool, path.id).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// Raw image bytes in the body, file extension in `?ext=`.
#[put("/api/players/{id}/photo")]
pub(super) async fn api_update_photo(
    state: State,
    path: Path<PlayerPath>,
    query: Query<PhotoQuery>,
    body: Bytes,
) -> Result<HttpResponse, AppError> {
    let player = profile::update_player_photo(&state.pool, &state.photos, path.id, &query.ext, &body).await?;
    Ok(HttpResponse::Ok().json(player))
}

#[get("/api/players/{id}/stats")]
pub(super) async fn api_player_stats(state: State, path: Path<PlayerPath>) -> Result<HttpResponse, AppError> {
    let tables = load_all(&state).await?;
    let s = stats::player_stats(&tables, path.id)?;
    Ok(HttpResponse::Ok().json(s))
}

#[get("/api/players/{id}/history")]
pub(super) async fn api_player_history(state: State, path: Path<PlayerPath>) -> Result<HttpResponse, AppError> {
    let tables = load_all(&state).await?;
    let history = stats::match_history(&tables, path.id)?;
    Ok(HttpResponse::Ok().json(history))
}

#[get("/api/players/{id}/teammates")]
pub(super) async fn api_player_teammates(state: State, path: Path<PlayerPath>) -> Result<HttpResponse, AppError> {
    let tables = load_all(&state).await?;
    let list = stats::teammates(&tables, path.id)?;
    Ok(HttpResponse::Ok().json(list))
}
