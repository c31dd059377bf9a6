//! Weekly football organizer: library with models, business logic and the HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logic;
pub mod models;
pub mod payment;
pub mod photos;

pub use config::Config;
pub use db::{DbPool, Tables};
pub use error::{AppError, Result};
pub use logic::{
    active_player_count, auto_assign, balance_teams_by_power, cancel_registration, cancel_with_promotion,
    match_history, match_roster, player_ranking, player_stats, players_for_match, promote_from_waitlist,
    register_player, remove_player_from_match, save_team_sheet, team_power, teammates, update_player_team,
    waitlist, waitlist_position,
};
pub use models::{
    FormationSlot, Match, MatchId, MatchStatus, Player, PlayerId, PlayerWithDetails, Position, Registration,
    RegistrationId, RegistrationStatus, Team,
};
