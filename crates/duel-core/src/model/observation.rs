use crate::model::card::Card;
use serde::{Deserialize, Serialize};

/// What one side can see before it acts: its own total, the opponent's
/// upcard and how many of each rank remain in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub own_total: u8,
    pub opponent_upcard: u8,
    pub remaining: [u8; Card::RANKS],
}

impl Observation {
    pub fn cards_remaining(&self) -> usize {
        self.remaining.iter().map(|&count| count as usize).sum()
    }
}
