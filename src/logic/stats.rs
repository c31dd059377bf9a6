//! Player statistics: ranking, per-player stats, match history, teammates and opponents.
//!
//! Only active registrations in completed matches (status `done`, both scores set) count.

use crate::error::Result;
use crate::models::{Match, MatchId, PlayerId, Registration, Team};
use crate::db::Tables;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

/// Minimum completed matches to appear in the ranking.
pub const DEFAULT_MIN_MATCHES: u32 = 2;
/// Relationships need more than this many shared matches to be listed.
const MIN_ENCOUNTERS: u32 = 2;
const MAX_TEAMMATES: usize = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

/// Result for a side of a completed match. A draw needs equal, non-zero scores: 0-0 is a
/// loss for both sides. Without a team the result is a loss.
pub fn outcome(m: &Match, team: Option<Team>) -> Option<Outcome> {
    let (a, b) = m.final_score()?;
    if a == b && a != 0 {
        return Some(Outcome::Draw);
    }
    let (own, other) = match team {
        Some(t) => m.score_for(t)?,
        None => return Some(Outcome::Loss),
    };
    Some(if own > other { Outcome::Win } else { Outcome::Loss })
}

/// Rounded percentage, 0 when there is nothing to divide by.
pub fn win_rate(wins: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(wins) * 100.0 / f64::from(total)).round() as u32
}

/// Active registrations in completed matches, with their match.
fn completed_participations(tables: &Tables) -> impl Iterator<Item = (&Registration, &Match)> {
    let done: HashMap<MatchId, &Match> = tables
        .matches
        .iter()
        .filter(|m| m.final_score().is_some())
        .map(|m| (m.id, m))
        .collect();
    tables
        .registrations
        .iter()
        .filter(|r| r.is_active())
        .filter_map(move |r| done.get(&r.match_id).map(|m| (r, *m)))
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlayerRanking {
    pub player_id: PlayerId,
    pub name: String,
    pub total_matches: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub win_rate: u32,
}

/// Ranking of every player with at least `min_matches` completed matches:
/// win rate descending, then matches played descending.
pub fn player_ranking(tables: &Tables, min_matches: u32) -> Result<Vec<PlayerRanking>> {
    let mut by_player: HashMap<PlayerId, (u32, u32, u32)> = HashMap::new();
    // first-seen order keeps the final sort deterministic for full ties
    let mut order: Vec<PlayerId> = Vec::new();

    for (reg, m) in completed_participations(tables) {
        let Some(result) = outcome(m, reg.team) else {
            continue;
        };
        let entry = by_player.entry(reg.player_id).or_insert_with(|| {
            order.push(reg.player_id);
            (0, 0, 0)
        });
        match result {
            Outcome::Win => entry.0 += 1,
            Outcome::Draw => entry.1 += 1,
            Outcome::Loss => entry.2 += 1,
        }
    }

    let mut ranking = Vec::new();
    for id in order {
        let (wins, draws, losses) = by_player[&id];
        let total_matches = wins + draws + losses;
        if total_matches < min_matches {
            continue;
        }
        ranking.push(PlayerRanking {
            player_id: id,
            name: tables.get_player(id)?.name.clone(),
            total_matches,
            wins,
            draws,
            losses,
            win_rate: win_rate(wins, total_matches),
        });
    }
    ranking.sort_by(|a, b| b.win_rate.cmp(&a.win_rate).then(b.total_matches.cmp(&a.total_matches)));
    Ok(ranking)
}

/// Statistics view of a player (profile page).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PlayerStats {
    pub total_matches: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub win_rate: u32,
    pub team_a_matches: u32,
    pub team_a_wins: u32,
    pub team_a_win_rate: u32,
    pub team_b_matches: u32,
    pub team_b_wins: u32,
    pub team_b_win_rate: u32,
}

pub fn player_stats(tables: &Tables, player_id: PlayerId) -> Result<PlayerStats> {
    tables.get_player(player_id)?;
    let mut stats = PlayerStats::default();

    for (reg, m) in completed_participations(tables).filter(|(r, _)| r.player_id == player_id) {
        let Some(result) = outcome(m, reg.team) else {
            continue;
        };
        stats.total_matches += 1;
        let won = result == Outcome::Win;
        match result {
            Outcome::Win => stats.wins += 1,
            Outcome::Draw => stats.draws += 1,
            Outcome::Loss => stats.losses += 1,
        }
        match reg.team {
            Some(Team::A) => {
                stats.team_a_matches += 1;
                stats.team_a_wins += u32::from(won);
            }
            Some(Team::B) => {
                stats.team_b_matches += 1;
                stats.team_b_wins += u32::from(won);
            }
            None => {}
        }
    }
    stats.win_rate = win_rate(stats.wins, stats.total_matches);
    stats.team_a_win_rate = win_rate(stats.team_a_wins, stats.team_a_matches);
    stats.team_b_win_rate = win_rate(stats.team_b_wins, stats.team_b_matches);
    Ok(stats)
}

/// One past (or upcoming) participation of a player.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub team: Option<Team>,
    pub has_paid: bool,
    /// `None` while the match has no final score.
    pub result: Option<Outcome>,
    /// "a - b" once the match is done.
    pub score: Option<String>,
}

/// All active participations of a player, newest match first.
pub fn match_history(tables: &Tables, player_id: PlayerId) -> Result<Vec<MatchSummary>> {
    tables.get_player(player_id)?;
    let mut history = Vec::new();
    for reg in tables.registrations.iter().filter(|r| r.player_id == player_id && r.is_active()) {
        let m = tables.get_match(reg.match_id)?;
        history.push(MatchSummary {
            match_id: m.id,
            date: m.date,
            time: m.time,
            team: reg.team,
            has_paid: reg.has_paid,
            result: reg.team.and_then(|t| outcome(m, Some(t))),
            score: m.final_score().map(|(a, b)| format!("{a} - {b}")),
        });
    }
    history.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
    Ok(history)
}

/// How the primary player fared with and against another player.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TeammateStats {
    pub player_id: PlayerId,
    pub name: String,
    pub matches_together: u32,
    pub wins_together: u32,
    pub losses_together: u32,
    pub win_rate_together: u32,
    pub matches_against: u32,
    /// Primary player's wins when on the opposing team.
    pub wins_against: u32,
    pub losses_against: u32,
    pub win_rate_against: u32,
}

impl TeammateStats {
    fn encounters(&self) -> u32 {
        self.matches_together + self.matches_against
    }
}

/// Relationships with other players over shared completed matches: more than two shared
/// matches, most frequent first, at most twenty.
pub fn teammates(tables: &Tables, player_id: PlayerId) -> Result<Vec<TeammateStats>> {
    tables.get_player(player_id)?;
    let own_team: HashMap<MatchId, Team> = completed_participations(tables)
        .filter(|(r, _)| r.player_id == player_id)
        .filter_map(|(r, _)| r.team.map(|t| (r.match_id, t)))
        .collect();

    let mut by_player: HashMap<PlayerId, TeammateStats> = HashMap::new();
    let mut order: Vec<PlayerId> = Vec::new();

    for (reg, m) in completed_participations(tables) {
        if reg.player_id == player_id {
            continue;
        }
        let (Some(&mine), Some(theirs)) = (own_team.get(&reg.match_id), reg.team) else {
            continue;
        };
        let result = outcome(m, Some(mine));
        let stats = by_player.entry(reg.player_id).or_insert_with(|| {
            order.push(reg.player_id);
            TeammateStats {
                player_id: reg.player_id,
                ..TeammateStats::default()
            }
        });
        if mine == theirs {
            stats.matches_together += 1;
            match result {
                Some(Outcome::Win) => stats.wins_together += 1,
                Some(Outcome::Loss) => stats.losses_together += 1,
                _ => {}
            }
        } else {
            stats.matches_against += 1;
            match result {
                Some(Outcome::Win) => stats.wins_against += 1,
                Some(Outcome::Loss) => stats.losses_against += 1,
                _ => {}
            }
        }
    }

    let mut result = Vec::new();
    for id in order {
        let Some(mut stats) = by_player.remove(&id) else {
            continue;
        };
        if stats.encounters() <= MIN_ENCOUNTERS {
            continue;
        }
        stats.name = tables.get_player(id)?.name.clone();
        stats.win_rate_together = win_rate(stats.wins_together, stats.matches_together);
        stats.win_rate_against = win_rate(stats.wins_against, stats.matches_against);
        result.push(stats);
    }
    result.sort_by(|a, b| b.encounters().cmp(&a.encounters()));
    result.truncate(MAX_TEAMMATES);
    Ok(result)
}
