use core::fmt;
use serde::{Deserialize, Serialize};

/// A single numbered card. The master deck holds each value in
/// `MIN_VALUE..=MAX_VALUE` exactly once; there are no suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub const MIN_VALUE: u8 = 1;
    pub const MAX_VALUE: u8 = 11;
    pub const RANKS: usize = (Self::MAX_VALUE - Self::MIN_VALUE + 1) as usize;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN_VALUE && value <= Self::MAX_VALUE {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Zero-based position of this rank in rank order.
    pub const fn rank_index(self) -> usize {
        (self.0 - Self::MIN_VALUE) as usize
    }

    pub fn all() -> impl Iterator<Item = Card> {
        (Self::MIN_VALUE..=Self::MAX_VALUE).map(Card)
    }
}

impl TryFrom<u8> for Card {
    type Error = InvalidCard;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Card::new(value).ok_or(InvalidCard(value))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("card value {0} is outside 1..=11")]
pub struct InvalidCard(pub u8);

#[cfg(test)]
mod tests {
    use super::Card;

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Card::new(0).is_none());
        assert!(Card::new(12).is_none());
        assert_eq!(Card::new(11).map(Card::value), Some(11));
    }

    #[test]
    fn all_covers_every_rank_once() {
        let values: Vec<u8> = Card::all().map(Card::value).collect();
        assert_eq!(values, (1..=11).collect::<Vec<_>>());
        assert_eq!(Card::RANKS, 11);
    }

    #[test]
    fn serde_rejects_invalid_value() {
        let ok: Card = serde_json::from_str("7").unwrap();
        assert_eq!(ok.value(), 7);
        assert!(serde_json::from_str::<Card>("12").is_err());
    }
}
