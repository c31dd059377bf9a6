//! Data structures for the organizer: matches, players, registrations, formation slots.

mod game;
mod lineup;
mod player;
mod registration;

pub use game::{Match, MatchId, MatchStatus, Team, DEFAULT_PRICE};
pub use lineup::FormationSlot;
pub use player::{
    Player, PlayerId, Position, DEFAULT_POSITION_WEIGHT, DEFAULT_POWER, POSITION_WEIGHT_RANGE, POWER_RANGE,
};
pub use registration::{PlayerWithDetails, Registration, RegistrationId, RegistrationStatus};
