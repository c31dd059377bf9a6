//! Player profile and preferred position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Unique identifier for a player (used in registrations and lookups).
pub type PlayerId = Uuid;

/// Power rating given to new players.
pub const DEFAULT_POWER: u8 = 5;
/// Play-style rating given to new players (1 = defensive, 5 = attacking).
pub const DEFAULT_POSITION_WEIGHT: u8 = 3;

pub const POWER_RANGE: std::ops::RangeInclusive<u8> = 1..=10;
pub const POSITION_WEIGHT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Where the player prefers to play.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    #[default]
    #[serde(rename = "")]
    #[sqlx(rename = "")]
    Unspecified,
}

/// A person who plays (or played) in at least one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Natural key. Players registering without a phone get a `no-phone-` placeholder.
    pub phone: String,
    pub email: Option<String>,
    pub position: Position,
    pub confirmed: bool,
    /// Skill score used for team balancing (1-10).
    pub power: u8,
    /// Attack tendency (1-5).
    pub position_weight: u8,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a new unconfirmed player with default ratings.
    pub fn new(name: impl Into<String>, phone: impl Into<String>, position: Position, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            position,
            confirmed: false,
            power: DEFAULT_POWER,
            position_weight: DEFAULT_POSITION_WEIGHT,
            photo_url: None,
            created_at: now,
        }
    }

    /// Placeholder natural key for players who register without a phone number.
    pub fn placeholder_phone() -> String {
        format!("no-phone-{}", Uuid::new_v4().simple())
    }

    pub fn has_placeholder_phone(&self) -> bool {
        self.phone.starts_with("no-phone-")
    }
}
