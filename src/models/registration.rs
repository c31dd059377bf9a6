//! Registration (a player's participation in one match) and the roster read model.

use crate::models::game::{MatchId, Team};
use crate::models::player::{Player, PlayerId, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Unique identifier for a registration.
pub type RegistrationId = Uuid;

/// Participation status for one match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Waitlist,
    Canceled,
}

/// Join of one player and one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: RegistrationId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub has_paid: bool,
    pub team: Option<Team>,
    pub status: RegistrationStatus,
    /// Formation slot number: 0 = unassigned, 1-9 = slot on `team`.
    pub position: u8,
    pub registered_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// New unpaid, unassigned registration.
    pub fn new(match_id: MatchId, player_id: PlayerId, status: RegistrationStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            has_paid: false,
            team: None,
            status,
            position: 0,
            registered_at: now,
            canceled_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Active
    }

    pub fn is_waitlisted(&self) -> bool {
        self.status == RegistrationStatus::Waitlist
    }
}

/// Player profile joined with one registration, as shown on a match page.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerWithDetails {
    pub id: PlayerId,
    pub name: String,
    pub phone: String,
    pub position: Position,
    pub confirmed: bool,
    pub power: u8,
    pub position_weight: u8,
    pub photo_url: Option<String>,
    pub registration_id: RegistrationId,
    pub has_paid: bool,
    pub team: Option<Team>,
    pub status: RegistrationStatus,
    pub field_position: u8,
    pub registered_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    /// 1-based rank in the waitlist (waitlisted entries only).
    pub waitlist_position: Option<usize>,
}

impl PlayerWithDetails {
    pub fn new(player: &Player, reg: &Registration) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            phone: player.phone.clone(),
            position: player.position,
            confirmed: player.confirmed,
            power: player.power,
            position_weight: player.position_weight,
            photo_url: player.photo_url.clone(),
            registration_id: reg.id,
            has_paid: reg.has_paid,
            team: reg.team,
            status: reg.status,
            field_position: reg.position,
            registered_at: reg.registered_at,
            canceled_at: reg.canceled_at,
            waitlist_position: None,
        }
    }
}
