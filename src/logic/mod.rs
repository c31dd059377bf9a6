//! Organizer business logic: registration, balancing, lineups, matches, stats, profiles, payments.

pub mod balance;
pub mod lineup;
pub mod matches;
pub mod payments;
pub mod profile;
pub mod registration;
pub mod stats;

pub use balance::{balance_teams_by_power, BalancedTeams, Rated, MAX_TEAM_SIZE};
pub use lineup::{auto_assign, save_team_sheet, team_power, update_player_team, Lineup, TeamPower, TeamSheet};
pub use registration::{
    active_player_count, cancel_registration, cancel_with_promotion, get_registration, match_roster,
    players_for_match, promote_from_waitlist, register_player, remove_player_from_match, waitlist,
    waitlist_position, CancelResult, PlayerIdentity, RegistrationOutcome, RegistrationResult,
};
pub use stats::{match_history, player_ranking, player_stats, teammates, Outcome, PlayerRanking, PlayerStats};
