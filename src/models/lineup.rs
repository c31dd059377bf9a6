//! The nine on-field formation slots shared by both teams.

use crate::models::player::Position;
use serde::{Deserialize, Serialize};

/// A named formation slot. Numbering is team-relative: slot 5 exists on both A and B.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormationSlot {
    DefenseLeft,
    DefenseCenter,
    DefenseRight,
    MidfieldLeft,
    MidfieldCenter,
    MidfieldRight,
    ForwardLeft,
    ForwardCenter,
    ForwardRight,
}

impl FormationSlot {
    /// All slots in number order (1..=9).
    pub const ALL: [FormationSlot; 9] = [
        FormationSlot::DefenseLeft,
        FormationSlot::DefenseCenter,
        FormationSlot::DefenseRight,
        FormationSlot::MidfieldLeft,
        FormationSlot::MidfieldCenter,
        FormationSlot::MidfieldRight,
        FormationSlot::ForwardLeft,
        FormationSlot::ForwardCenter,
        FormationSlot::ForwardRight,
    ];

    /// Stored slot number (1-9).
    pub fn number(self) -> u8 {
        Self::ALL.iter().position(|s| *s == self).map_or(0, |i| i as u8 + 1)
    }

    /// Slot for a stored number; `None` for 0 (unassigned) or anything above 9.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=9 => Some(Self::ALL[usize::from(n) - 1]),
            _ => None,
        }
    }

    /// Left, center, right slots of the line matching a preferred position.
    /// Goalkeepers and unspecified players have no line.
    pub fn line_for(position: Position) -> &'static [FormationSlot] {
        match position {
            Position::Defender => &Self::ALL[0..3],
            Position::Midfielder => &Self::ALL[3..6],
            Position::Forward => &Self::ALL[6..9],
            Position::Goalkeeper | Position::Unspecified => &[],
        }
    }
}
