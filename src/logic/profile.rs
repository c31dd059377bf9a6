//! Player profiles: lookups, contact and rating edits, confirmation, photo replacement.

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{Player, PlayerId, POSITION_WEIGHT_RANGE, POWER_RANGE};
use crate::photos::PhotoStorage;
use serde::Deserialize;

/// All players sorted by name.
pub async fn list_players(pool: &DbPool) -> Result<Vec<Player>> {
    let players = sqlx::query_as::<_, Player>("SELECT * FROM players ORDER BY name COLLATE NOCASE, rowid")
        .fetch_all(pool)
        .await?;
    Ok(players)
}

pub async fn get_player(pool: &DbPool, player_id: PlayerId) -> Result<Player> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("player"))
}

pub async fn player_by_phone(pool: &DbPool, phone: &str) -> Result<Player> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE phone = ?")
        .bind(phone.trim())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("player"))
}

/// Contact fields a player may edit. Absent fields are left alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Phone stays unique across players; an empty email clears it.
pub async fn update_profile(pool: &DbPool, player_id: PlayerId, update: &ProfileUpdate) -> Result<Player> {
    let phone = update.phone.as_deref().map(str::trim);
    if phone == Some("") {
        return Err(AppError::validation("phone cannot be empty"));
    }
    let email = update
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let updated = sqlx::query_as::<_, Player>(
        "UPDATE players SET phone = COALESCE(?, phone), email = CASE WHEN ? THEN ? ELSE email END
         WHERE id = ? RETURNING *",
    )
    .bind(phone)
    .bind(update.email.is_some())
    .bind(email)
    .bind(player_id)
    .fetch_optional(pool)
    .await;

    match updated {
        Ok(player) => player.ok_or(AppError::NotFound("player")),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::validation("phone is already used by another player"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Organizer-set ratings. Absent fields are left alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RatingsUpdate {
    pub power: Option<u8>,
    pub position_weight: Option<u8>,
}

pub async fn update_ratings(pool: &DbPool, player_id: PlayerId, update: &RatingsUpdate) -> Result<Player> {
    if let Some(power) = update.power {
        if !POWER_RANGE.contains(&power) {
            return Err(AppError::validation("power must be between 1 and 10"));
        }
    }
    if let Some(weight) = update.position_weight {
        if !POSITION_WEIGHT_RANGE.contains(&weight) {
            return Err(AppError::validation("position weight must be between 1 and 5"));
        }
    }
    sqlx::query_as::<_, Player>(
        "UPDATE players SET power = COALESCE(?, power), position_weight = COALESCE(?, position_weight)
         WHERE id = ? RETURNING *",
    )
    .bind(update.power)
    .bind(update.position_weight)
    .bind(player_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("player"))
}

pub async fn confirm_player(pool: &DbPool, player_id: PlayerId) -> Result<Player> {
    sqlx::query_as::<_, Player>("UPDATE players SET confirmed = 1 WHERE id = ? RETURNING *")
        .bind(player_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("player"))
}

/// Replace a player's photo.
///
/// Upload the new photo, then point the player at it. If that write fails the fresh upload is
/// removed and the old photo is untouched; only after it succeeds is the old photo deleted
/// (best effort).
pub async fn update_player_photo(
    pool: &DbPool,
    photos: &PhotoStorage,
    player_id: PlayerId,
    extension: &str,
    bytes: &[u8],
) -> Result<Player> {
    let old = get_player(pool, player_id).await?.photo_url;
    let new_url = photos.upload(player_id, extension, bytes).await?;

    let updated = sqlx::query_as::<_, Player>("UPDATE players SET photo_url = ? WHERE id = ? RETURNING *")
        .bind(&new_url)
        .bind(player_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
        .and_then(|p| p.ok_or(AppError::NotFound("player")));
    let player = match updated {
        Ok(player) => player,
        Err(e) => {
            if let Err(cleanup) = photos.delete(&new_url).await {
                log::warn!("Could not delete photo {} after failed update: {}", new_url, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(old) = old.filter(|old| *old != new_url) {
        if let Err(e) = photos.delete(&old).await {
            log::warn!("Could not delete old photo {}: {}", old, e);
        }
    }
    Ok(player)
}
