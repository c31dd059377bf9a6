//! Power balancing: split a pool of rated players into two teams of similar total power.

use crate::models::{Player, PlayerWithDetails};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Each side stops taking new players at this roster size (unless both sides are full).
pub const MAX_TEAM_SIZE: usize = 8;

/// Anything with a power rating.
pub trait Rated {
    fn power(&self) -> u8;
}

impl Rated for Player {
    fn power(&self) -> u8 {
        self.power
    }
}

impl Rated for PlayerWithDetails {
    fn power(&self) -> u8 {
        self.power
    }
}

/// Result of [`balance_teams_by_power`]: each side is its fixed players followed by new ones.
#[derive(Clone, Debug, Serialize)]
pub struct BalancedTeams<T> {
    pub team_a: Vec<T>,
    pub team_b: Vec<T>,
}

pub fn total_power<T: Rated>(team: &[T]) -> u32 {
    team.iter().map(|p| u32::from(p.power())).sum()
}

/// Distribute `unassigned` over two teams that already hold `existing_a` / `existing_b`.
///
/// 1. Stable sort by power, strongest first.
/// 2. Each player goes to the side with lower total power; on equal power, to the side with
///    fewer players. A full side ([`MAX_TEAM_SIZE`]) passes the player to the other side;
///    when both are full the player goes to A.
/// 3. Only the newly placed players of each side are shuffled; fixed players keep their order.
pub fn balance_teams_by_power<T, R>(unassigned: &[T], existing_a: &[T], existing_b: &[T], rng: &mut R) -> BalancedTeams<T>
where
    T: Rated + Clone,
    R: Rng + ?Sized,
{
    let mut sorted = unassigned.to_vec();
    sorted.sort_by(|a, b| b.power().cmp(&a.power()));

    let mut team_a = existing_a.to_vec();
    let mut team_b = existing_b.to_vec();
    let (mut power_a, mut power_b) = (total_power(&team_a), total_power(&team_b));

    for player in sorted {
        let prefers_a = power_a < power_b || (power_a == power_b && team_a.len() < team_b.len());
        let p = u32::from(player.power());
        if prefers_a && team_a.len() < MAX_TEAM_SIZE {
            power_a += p;
            team_a.push(player);
        } else if team_b.len() < MAX_TEAM_SIZE {
            power_b += p;
            team_b.push(player);
        } else {
            power_a += p;
            team_a.push(player);
        }
    }

    team_a[existing_a.len()..].shuffle(rng);
    team_b[existing_b.len()..].shuffle(rng);

    BalancedTeams { team_a, team_b }
}
