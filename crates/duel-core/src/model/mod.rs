pub mod action;
pub mod card;
pub mod deck;
pub mod hand;
pub mod observation;
pub mod outcome;
pub mod round;
pub mod side;

/// Totals strictly above this value are bust.
pub const BURST_LIMIT: u8 = 21;

/// Sum of a slice of cards. No card has an alternate value.
pub fn total(cards: &[card::Card]) -> u8 {
    cards.iter().map(|card| card.value()).sum()
}

pub const fn is_bust(total: u8) -> bool {
    total > BURST_LIMIT
}
