use crate::model::BURST_LIMIT;
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win(Side),
    Draw,
}

impl Outcome {
    pub const fn winner(self) -> Option<Side> {
        match self {
            Outcome::Win(side) => Some(side),
            Outcome::Draw => None,
        }
    }

    /// +1 for a win, -1 for a loss, 0 for a draw, from `side`'s view.
    pub fn signed_for(self, side: Side) -> i8 {
        match self {
            Outcome::Win(winner) if winner == side => 1,
            Outcome::Win(_) => -1,
            Outcome::Draw => 0,
        }
    }
}

/// Resolve a round from both final totals.
///
/// Both bust is a draw, a single bust loses, otherwise the total closer to
/// the limit wins and equal distances draw.
pub fn judge(total_a: u8, total_b: u8) -> Outcome {
    let bust_a = total_a > BURST_LIMIT;
    let bust_b = total_b > BURST_LIMIT;
    match (bust_a, bust_b) {
        (true, true) => Outcome::Draw,
        (true, false) => Outcome::Win(Side::B),
        (false, true) => Outcome::Win(Side::A),
        (false, false) => {
            let distance_a = BURST_LIMIT - total_a;
            let distance_b = BURST_LIMIT - total_b;
            match distance_a.cmp(&distance_b) {
                core::cmp::Ordering::Less => Outcome::Win(Side::A),
                core::cmp::Ordering::Greater => Outcome::Win(Side::B),
                core::cmp::Ordering::Equal => Outcome::Draw,
            }
        }
    }
}
