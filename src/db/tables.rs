//! Loaded rows: the records one query needs, with lookups for the pure computations
//! (roster, lineups, team power, statistics) that run over them.

use crate::error::{AppError, Result};
use crate::models::{Match, MatchId, Player, PlayerId, Registration, RegistrationId};
use sqlx::SqliteConnection;

/// Rows in load order. Registrations are loaded by insertion order, which breaks
/// registration-time ties.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub matches: Vec<Match>,
    pub players: Vec<Player>,
    pub registrations: Vec<Registration>,
}

impl Tables {
    /// One match with its registrations and their players.
    pub async fn load_match(conn: &mut SqliteConnection, match_id: MatchId) -> Result<Self> {
        let m = sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = ?")
            .bind(match_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(AppError::NotFound("match"))?;
        let registrations =
            sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE match_id = ? ORDER BY rowid")
                .bind(match_id)
                .fetch_all(&mut *conn)
                .await?;
        let players = sqlx::query_as::<_, Player>(
            "SELECT p.* FROM players p JOIN registrations r ON r.player_id = p.id WHERE r.match_id = ?",
        )
        .bind(match_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(Self {
            matches: vec![m],
            players,
            registrations,
        })
    }

    /// Every row; statistics aggregate over the whole history.
    pub async fn load_all(conn: &mut SqliteConnection) -> Result<Self> {
        let matches = sqlx::query_as::<_, Match>("SELECT * FROM matches ORDER BY rowid")
            .fetch_all(&mut *conn)
            .await?;
        let players = sqlx::query_as::<_, Player>("SELECT * FROM players ORDER BY rowid")
            .fetch_all(&mut *conn)
            .await?;
        let registrations = sqlx::query_as::<_, Registration>("SELECT * FROM registrations ORDER BY rowid")
            .fetch_all(&mut *conn)
            .await?;
        Ok(Self {
            matches,
            players,
            registrations,
        })
    }

    pub fn get_match(&self, id: MatchId) -> Result<&Match> {
        self.matches.iter().find(|m| m.id == id).ok_or(AppError::NotFound("match"))
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players.iter().find(|p| p.id == id).ok_or(AppError::NotFound("player"))
    }

    pub fn get_registration(&self, id: RegistrationId) -> Result<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound("registration"))
    }

    pub fn registrations_for(&self, match_id: MatchId) -> impl Iterator<Item = &Registration> {
        self.registrations.iter().filter(move |r| r.match_id == match_id)
    }
}
