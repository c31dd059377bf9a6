//! Registration state machine: active / waitlist / canceled, capacity and waitlist promotion.
//!
//! The capacity check happens inside the statement that writes the registration, so two
//! concurrent registrations can never both take the last active slot.

use crate::db::{DbPool, Tables};
use crate::error::{AppError, Result};
use crate::models::{
    MatchId, Player, PlayerId, PlayerWithDetails, Position, Registration, RegistrationId, RegistrationStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};

/// Who is registering. Phone is the natural key; without one a placeholder is generated.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub position: Position,
}

/// What a registration request did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// New registration with an active slot.
    Admitted,
    /// New registration placed on the waitlist (match full).
    Waitlisted,
    /// A canceled registration was brought back.
    Reactivated,
    /// Already active or waitlisted; nothing changed.
    AlreadyRegistered,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegistrationResult {
    pub outcome: RegistrationOutcome,
    pub registration: Registration,
    /// 1-based waitlist rank at the moment of registering.
    pub waitlist_position: Option<usize>,
}

/// Evaluates to 'waitlist' when the match (first bind) already has capacity (second bind)
/// active players, 'active' otherwise.
const ADMISSION_STATUS: &str = "CASE WHEN (SELECT COUNT(*) FROM registrations WHERE match_id = ? AND status = 'active') >= ? \
     THEN 'waitlist' ELSE 'active' END";

/// Number of active registrations for a match.
pub async fn active_player_count<'e, E>(executor: E, match_id: MatchId) -> Result<usize>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE match_id = ? AND status = 'active'")
        .bind(match_id)
        .fetch_one(executor)
        .await?;
    Ok(count as usize)
}

pub async fn get_registration(pool: &DbPool, id: RegistrationId) -> Result<Registration> {
    sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("registration"))
}

/// Register a player for a match.
///
/// - canceled registration: reactivated with `registered_at = now` (waitlisted if the match is full)
/// - active or waitlisted registration: no-op
/// - otherwise: new registration, waitlisted when `capacity` active players are already in
///
/// The player is found by phone (name and preferred position refreshed) or created. Everything
/// runs in one transaction that opens with a write, so concurrent registrations queue up.
pub async fn register_player(
    pool: &DbPool,
    match_id: MatchId,
    identity: &PlayerIdentity,
    capacity: usize,
    now: DateTime<Utc>,
) -> Result<RegistrationResult> {
    let name = identity.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    let phone = identity
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(Player::placeholder_phone);
    let mut candidate = Player::new(name, phone, identity.position, now);
    candidate.email = identity.email.clone().filter(|e| !e.trim().is_empty());

    let mut tx = pool.begin().await?;

    let player_id: PlayerId = sqlx::query_scalar(
        "INSERT INTO players (id, name, phone, email, position, confirmed, power, position_weight, photo_url, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?, NULL, ?)
         ON CONFLICT(phone) DO UPDATE SET name = excluded.name, position = excluded.position
         RETURNING id",
    )
    .bind(candidate.id)
    .bind(&candidate.name)
    .bind(&candidate.phone)
    .bind(&candidate.email)
    .bind(candidate.position)
    .bind(candidate.power)
    .bind(candidate.position_weight)
    .bind(candidate.created_at)
    .fetch_one(&mut *tx)
    .await?;
    if player_id == candidate.id {
        log::info!("Created player {} ({})", candidate.name, player_id);
    }

    let match_exists: Option<MatchId> = sqlx::query_scalar("SELECT id FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?;
    if match_exists.is_none() {
        return Err(AppError::NotFound("match"));
    }

    let existing = sqlx::query_as::<_, Registration>(
        "SELECT * FROM registrations WHERE match_id = ? AND player_id = ?",
    )
    .bind(match_id)
    .bind(player_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (outcome, registration) = match existing {
        Some(reg) if reg.status != RegistrationStatus::Canceled => (RegistrationOutcome::AlreadyRegistered, reg),
        Some(reg) => {
            let reg = sqlx::query_as::<_, Registration>(&format!(
                "UPDATE registrations SET status = {ADMISSION_STATUS}, canceled_at = NULL, registered_at = ?
                 WHERE id = ? RETURNING *"
            ))
            .bind(match_id)
            .bind(capacity as i64)
            .bind(now)
            .bind(reg.id)
            .fetch_one(&mut *tx)
            .await?;
            log::info!("Reactivated registration {} as {:?}", reg.id, reg.status);
            (RegistrationOutcome::Reactivated, reg)
        }
        None => {
            let new = Registration::new(match_id, player_id, RegistrationStatus::Active, now);
            let reg = sqlx::query_as::<_, Registration>(&format!(
                "INSERT INTO registrations (id, match_id, player_id, has_paid, team, status, position, registered_at, canceled_at)
                 VALUES (?, ?, ?, 0, NULL, {ADMISSION_STATUS}, 0, ?, NULL) RETURNING *"
            ))
            .bind(new.id)
            .bind(match_id)
            .bind(player_id)
            .bind(match_id)
            .bind(capacity as i64)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            log::info!("Registered player {} for match {} as {:?}", player_id, match_id, reg.status);
            let outcome = if reg.is_waitlisted() {
                RegistrationOutcome::Waitlisted
            } else {
                RegistrationOutcome::Admitted
            };
            (outcome, reg)
        }
    };

    let waitlist_position = if registration.is_waitlisted() {
        let tables = Tables::load_match(&mut tx, match_id).await?;
        waitlist_position(&tables, registration.id)?
    } else {
        None
    };
    tx.commit().await?;

    Ok(RegistrationResult {
        outcome,
        registration,
        waitlist_position,
    })
}

/// Mark a registration canceled. Returns the match it belongs to, or `None` when it was
/// already canceled (nothing to promote then).
pub async fn cancel_registration(
    pool: &DbPool,
    registration_id: RegistrationId,
    now: DateTime<Utc>,
) -> Result<Option<MatchId>> {
    let canceled: Option<MatchId> = sqlx::query_scalar(
        "UPDATE registrations SET status = 'canceled', canceled_at = ?
         WHERE id = ? AND status != 'canceled' RETURNING match_id",
    )
    .bind(now)
    .bind(registration_id)
    .fetch_optional(pool)
    .await?;

    match canceled {
        Some(match_id) => {
            log::info!("Canceled registration {}", registration_id);
            Ok(Some(match_id))
        }
        None => {
            get_registration(pool, registration_id).await?;
            Ok(None)
        }
    }
}

/// Promote the longest-waiting registration if the match has a free active slot.
/// Team and field position of the promoted registration stay untouched.
pub async fn promote_from_waitlist<'e, E>(executor: E, match_id: MatchId, capacity: usize) -> Result<Option<RegistrationId>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let promoted: Option<RegistrationId> = sqlx::query_scalar(
        "UPDATE registrations SET status = 'active'
         WHERE id = (SELECT id FROM registrations WHERE match_id = ? AND status = 'waitlist'
                     ORDER BY registered_at, rowid LIMIT 1)
           AND (SELECT COUNT(*) FROM registrations WHERE match_id = ? AND status = 'active') < ?
         RETURNING id",
    )
    .bind(match_id)
    .bind(match_id)
    .bind(capacity as i64)
    .fetch_optional(executor)
    .await?;
    if let Some(id) = promoted {
        log::info!("Promoted registration {} from the waitlist", id);
    }
    Ok(promoted)
}

#[derive(Clone, Debug, Serialize)]
pub struct CancelResult {
    pub canceled: RegistrationId,
    pub promoted: Option<RegistrationId>,
}

/// Cancel, then promote from the waitlist as a separate best-effort step: a failed
/// promotion is logged and the cancellation still succeeds.
pub async fn cancel_with_promotion(
    pool: &DbPool,
    registration_id: RegistrationId,
    capacity: usize,
    now: DateTime<Utc>,
) -> Result<CancelResult> {
    let promoted = match cancel_registration(pool, registration_id, now).await? {
        Some(match_id) => match promote_from_waitlist(pool, match_id, capacity).await {
            Ok(promoted) => promoted,
            Err(e) => {
                log::warn!("Waitlist promotion after canceling {} failed: {}", registration_id, e);
                None
            }
        },
        None => None,
    };
    Ok(CancelResult {
        canceled: registration_id,
        promoted,
    })
}

/// Waitlisted registrations of a match, longest waiting first (ties keep insertion order).
pub fn waitlist(tables: &Tables, match_id: MatchId) -> Vec<&Registration> {
    let mut list: Vec<&Registration> = tables.registrations_for(match_id).filter(|r| r.is_waitlisted()).collect();
    list.sort_by_key(|r| r.registered_at);
    list
}

/// 1-based waitlist rank of a registration; `None` if it is not waitlisted.
pub fn waitlist_position(tables: &Tables, registration_id: RegistrationId) -> Result<Option<usize>> {
    let reg = tables.get_registration(registration_id)?;
    Ok(waitlist(tables, reg.match_id)
        .iter()
        .position(|r| r.id == registration_id)
        .map(|i| i + 1))
}

/// Hard-delete a player's registration for a match (admin action, no promotion).
pub async fn remove_player_from_match(pool: &DbPool, match_id: MatchId, player_id: PlayerId) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM registrations WHERE match_id = ? AND player_id = ?")
        .bind(match_id)
        .bind(player_id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("registration"));
    }
    log::info!("Removed player {} from match {}", player_id, match_id);
    Ok(())
}

/// Roster of a match: active first, then waitlisted (with rank), then canceled;
/// each group in registration order.
pub fn players_for_match(tables: &Tables, match_id: MatchId) -> Result<Vec<PlayerWithDetails>> {
    tables.get_match(match_id)?;
    let mut regs: Vec<&Registration> = tables.registrations_for(match_id).collect();
    regs.sort_by_key(|r| r.registered_at);

    let mut roster = Vec::with_capacity(regs.len());
    for status in [
        RegistrationStatus::Active,
        RegistrationStatus::Waitlist,
        RegistrationStatus::Canceled,
    ] {
        for (rank, reg) in regs.iter().filter(|r| r.status == status).enumerate() {
            let player = tables.get_player(reg.player_id)?;
            let mut details = PlayerWithDetails::new(player, reg);
            if status == RegistrationStatus::Waitlist {
                details.waitlist_position = Some(rank + 1);
            }
            roster.push(details);
        }
    }
    Ok(roster)
}

/// Load a match and build its roster.
pub async fn match_roster(pool: &DbPool, match_id: MatchId) -> Result<Vec<PlayerWithDetails>> {
    let mut conn = pool.acquire().await?;
    let tables = Tables::load_match(&mut conn, match_id).await?;
    players_for_match(&tables, match_id)
}
