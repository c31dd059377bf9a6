//! Match scheduling and results: create, next Thursday, active/past lookups, status and score.

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{Match, MatchId, MatchStatus, DEFAULT_PRICE};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

/// Kick-off time of the weekly game.
pub fn default_kickoff() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default()
}

pub async fn create_match(
    pool: &DbPool,
    date: NaiveDate,
    time: NaiveTime,
    price: Option<u32>,
    now: DateTime<Utc>,
) -> Result<Match> {
    let m = Match::new(date, time, price.unwrap_or(DEFAULT_PRICE), now);
    sqlx::query(
        "INSERT INTO matches (id, date, time, status, price, score_a, score_b, created_at)
         VALUES (?, ?, ?, ?, ?, NULL, NULL, ?)",
    )
    .bind(m.id)
    .bind(m.date)
    .bind(m.time)
    .bind(m.status)
    .bind(m.price)
    .bind(m.created_at)
    .execute(pool)
    .await?;
    log::info!("Created match {} on {} {}", m.id, m.date, m.time);
    Ok(m)
}

/// Today if it is Thursday, otherwise the coming Thursday.
pub fn next_thursday(today: NaiveDate) -> NaiveDate {
    let days = (7 + Weekday::Thu.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    today + Duration::days(i64::from(days))
}

/// Create the weekly match for the next Thursday at 21:00.
pub async fn create_next_thursday_match(pool: &DbPool, price: Option<u32>, now: DateTime<Utc>) -> Result<Match> {
    create_match(pool, next_thursday(now.date_naive()), default_kickoff(), price, now).await
}

pub async fn get_match(pool: &DbPool, match_id: MatchId) -> Result<Match> {
    sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("match"))
}

/// All matches, most recently created first (later inserts win timestamp ties).
pub async fn list_matches(pool: &DbPool) -> Result<Vec<Match>> {
    let all = sqlx::query_as::<_, Match>("SELECT * FROM matches ORDER BY created_at DESC, rowid DESC")
        .fetch_all(pool)
        .await?;
    Ok(all)
}

/// The most recently created match that is still registering or ready.
pub async fn active_match(pool: &DbPool) -> Result<Option<Match>> {
    let m = sqlx::query_as::<_, Match>(
        "SELECT * FROM matches WHERE status IN ('registering', 'ready')
         ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(m)
}

/// Completed matches, most recent first.
pub async fn past_matches(pool: &DbPool, limit: usize) -> Result<Vec<Match>> {
    let past = sqlx::query_as::<_, Match>(
        "SELECT * FROM matches WHERE status = 'done' ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;
    Ok(past)
}

pub async fn update_match_status(pool: &DbPool, match_id: MatchId, status: MatchStatus) -> Result<Match> {
    let m = sqlx::query_as::<_, Match>("UPDATE matches SET status = ? WHERE id = ? RETURNING *")
        .bind(status)
        .bind(match_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("match"))?;
    log::info!("Match {} is now {:?}", match_id, status);
    Ok(m)
}

/// Record the final score. Scores arrive as signed integers so that negative input is reported
/// as a validation error rather than a parse failure.
pub async fn update_match_score(pool: &DbPool, match_id: MatchId, score_a: i64, score_b: i64) -> Result<Match> {
    let convert = |s: i64| u32::try_from(s).map_err(|_| AppError::validation("scores must be non-negative integers"));
    let (a, b) = (convert(score_a)?, convert(score_b)?);
    let m = sqlx::query_as::<_, Match>("UPDATE matches SET score_a = ?, score_b = ? WHERE id = ? RETURNING *")
        .bind(a)
        .bind(b)
        .bind(match_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("match"))?;
    log::info!("Match {} score set to {} - {}", match_id, a, b);
    Ok(m)
}
