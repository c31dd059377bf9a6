//! Match, its lifecycle status, and the two sides.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Pitch fee when the organizer does not give one (pence).
pub const DEFAULT_PRICE: u32 = 750;

/// One of the two sides of a match.
/// Stored as `A` / `B`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize, sqlx::Type)]
pub enum Team {
    A,
    B,
}

/// Lifecycle of a match: registering -> ready -> done.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Open for registrations.
    #[default]
    Registering,
    /// Teams are being (or have been) organized.
    Ready,
    /// Played; scores may be recorded.
    Done,
}

/// A scheduled weekly game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: MatchId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: MatchStatus,
    /// Price per player in minor currency units.
    pub price: u32,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(date: NaiveDate, time: NaiveTime, price: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            time,
            status: MatchStatus::Registering,
            price,
            score_a: None,
            score_b: None,
            created_at: now,
        }
    }

    /// Final score, only once the match is done and both sides have a score.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        match (self.status, self.score_a, self.score_b) {
            (MatchStatus::Done, Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Score of the given side and of its opponent.
    pub fn score_for(&self, team: Team) -> Option<(u32, u32)> {
        let (a, b) = self.final_score()?;
        Some(match team {
            Team::A => (a, b),
            Team::B => (b, a),
        })
    }
}
