//! Team sheets: automatic lineup proposals, saving slot assignments, and team power comparison.

use crate::db::{DbPool, Tables};
use crate::error::{AppError, Result};
use crate::logic::balance::{balance_teams_by_power, total_power};
use crate::logic::registration::players_for_match;
use crate::models::{FormationSlot, MatchId, PlayerWithDetails, Registration, RegistrationId, RegistrationStatus, Team};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Slot -> registration for each side, as submitted by the team organizer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamSheet {
    #[serde(default)]
    pub team_a: BTreeMap<FormationSlot, RegistrationId>,
    #[serde(default)]
    pub team_b: BTreeMap<FormationSlot, RegistrationId>,
}

/// A proposed lineup. Not persisted until saved as a [`TeamSheet`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct Lineup {
    pub team_a: BTreeMap<FormationSlot, PlayerWithDetails>,
    pub team_b: BTreeMap<FormationSlot, PlayerWithDetails>,
    /// Players that did not fit on the nine slots of their side.
    pub unplaced: Vec<PlayerWithDetails>,
}

impl Lineup {
    pub fn to_sheet(&self) -> TeamSheet {
        let ids = |side: &BTreeMap<FormationSlot, PlayerWithDetails>| {
            side.iter().map(|(slot, p)| (*slot, p.registration_id)).collect()
        };
        TeamSheet {
            team_a: ids(&self.team_a),
            team_b: ids(&self.team_b),
        }
    }
}

/// Put one side's players on slots: preferred line first, then any free slot in slot order.
fn place_by_position(players: Vec<PlayerWithDetails>) -> (BTreeMap<FormationSlot, PlayerWithDetails>, Vec<PlayerWithDetails>) {
    let mut slots = BTreeMap::new();
    let mut remaining = Vec::new();

    for player in players {
        match FormationSlot::line_for(player.position)
            .iter()
            .find(|slot| !slots.contains_key(*slot))
        {
            Some(slot) => {
                slots.insert(*slot, player);
            }
            None => remaining.push(player),
        }
    }

    let mut unplaced = Vec::new();
    let mut free = FormationSlot::ALL.iter().filter(|s| !slots.contains_key(*s)).copied().collect::<Vec<_>>().into_iter();
    for player in remaining {
        match free.next() {
            Some(slot) => {
                slots.insert(slot, player);
            }
            None => unplaced.push(player),
        }
    }
    (slots, unplaced)
}

/// Propose a lineup for a match's active players.
///
/// Players already on a team stay on that team, with or without a saved slot; everyone else
/// is balanced by power. Both sides are then laid out on the formation slots by preferred position.
pub fn auto_assign<R: Rng + ?Sized>(tables: &Tables, match_id: MatchId, rng: &mut R) -> Result<Lineup> {
    let active: Vec<PlayerWithDetails> = players_for_match(tables, match_id)?
        .into_iter()
        .filter(|p| p.status == RegistrationStatus::Active)
        .collect();

    let on = |team: Team| active.iter().filter(|p| p.team == Some(team)).cloned().collect::<Vec<_>>();
    let (fixed_a, fixed_b) = (on(Team::A), on(Team::B));
    let unassigned: Vec<_> = active.iter().filter(|p| p.team.is_none()).cloned().collect();

    let teams = balance_teams_by_power(&unassigned, &fixed_a, &fixed_b, rng);
    let (team_a, mut unplaced) = place_by_position(teams.team_a);
    let (team_b, unplaced_b) = place_by_position(teams.team_b);
    unplaced.extend(unplaced_b);

    Ok(Lineup {
        team_a,
        team_b,
        unplaced,
    })
}

/// Save a team sheet: every registration of the match is reset to no team / slot 0, then the
/// sheet is applied. Only active registrations of this match can be placed. Last write wins.
pub async fn save_team_sheet(pool: &DbPool, match_id: MatchId, sheet: &TeamSheet) -> Result<()> {
    let entries: Vec<(Team, FormationSlot, RegistrationId)> = sheet
        .team_a
        .iter()
        .map(|(slot, id)| (Team::A, *slot, *id))
        .chain(sheet.team_b.iter().map(|(slot, id)| (Team::B, *slot, *id)))
        .collect();
    let mut seen = HashSet::new();
    for (_, _, id) in &entries {
        if !seen.insert(*id) {
            return Err(AppError::validation(format!("registration {id} is placed twice")));
        }
    }

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE registrations SET team = NULL, position = 0 WHERE match_id = ?")
        .bind(match_id)
        .execute(&mut *tx)
        .await?;
    let match_exists: Option<MatchId> = sqlx::query_scalar("SELECT id FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?;
    if match_exists.is_none() {
        return Err(AppError::NotFound("match"));
    }

    for (team, slot, id) in entries {
        let reg = sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("registration"))?;
        if reg.match_id != match_id {
            return Err(AppError::validation(format!("registration {id} belongs to another match")));
        }
        if !reg.is_active() {
            return Err(AppError::validation(format!("registration {id} is not active")));
        }
        sqlx::query("UPDATE registrations SET team = ?, position = ? WHERE id = ?")
            .bind(team)
            .bind(slot.number())
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    log::info!("Saved team sheet for match {} ({} players placed)", match_id, seen.len());
    Ok(())
}

/// Move a single registration to a team (or off both teams). The slot is kept only when
/// the team does not change.
pub async fn update_player_team(pool: &DbPool, registration_id: RegistrationId, team: Option<Team>) -> Result<Registration> {
    sqlx::query_as::<_, Registration>(
        "UPDATE registrations SET position = CASE WHEN team IS ? THEN position ELSE 0 END, team = ?
         WHERE id = ? RETURNING *",
    )
    .bind(team)
    .bind(team)
    .bind(registration_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("registration"))
}

/// How even the two sides are.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceLabel {
    VeryBalanced,
    Balanced,
    SlightlyUnbalanced,
    Unbalanced,
}

impl BalanceLabel {
    pub fn from_difference(diff: u32) -> Self {
        match diff {
            0..=2 => BalanceLabel::VeryBalanced,
            3..=5 => BalanceLabel::Balanced,
            6..=10 => BalanceLabel::SlightlyUnbalanced,
            _ => BalanceLabel::Unbalanced,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamPower {
    pub team_a_power: u32,
    pub team_b_power: u32,
    pub team_a_average: f64,
    pub team_b_average: f64,
    pub difference: u32,
    /// `None` when both sides are equal.
    pub stronger: Option<Team>,
    pub balance: BalanceLabel,
}

/// Compare the saved teams of a match (active players only).
pub fn team_power(tables: &Tables, match_id: MatchId) -> Result<TeamPower> {
    let active: Vec<PlayerWithDetails> = players_for_match(tables, match_id)?
        .into_iter()
        .filter(|p| p.status == RegistrationStatus::Active)
        .collect();
    let side = |team: Team| active.iter().filter(|p| p.team == Some(team)).cloned().collect::<Vec<_>>();
    let (a, b) = (side(Team::A), side(Team::B));
    let (pa, pb) = (total_power(&a), total_power(&b));
    let average = |power: u32, n: usize| if n == 0 { 0.0 } else { f64::from(power) / n as f64 };
    let difference = pa.abs_diff(pb);

    Ok(TeamPower {
        team_a_power: pa,
        team_b_power: pb,
        team_a_average: average(pa, a.len()),
        team_b_average: average(pb, b.len()),
        difference,
        stronger: match pa.cmp(&pb) {
            std::cmp::Ordering::Greater => Some(Team::A),
            std::cmp::Ordering::Less => Some(Team::B),
            std::cmp::Ordering::Equal => None,
        },
        balance: BalanceLabel::from_difference(difference),
    })
}
