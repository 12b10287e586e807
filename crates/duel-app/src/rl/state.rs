//! Value-table key for one decision point.
//!
//! A key is the acting side's own total, the opponent's upcard and the
//! remaining count of every rank. The textual form used by the policy store
//! is `total_upcard_c1_..._c11`; every field is a plain integer, so the
//! delimiter can never appear inside a field and distinct keys never share
//! a string.

use duel_core::model::card::Card;
use duel_core::model::deck::Deck;
use duel_core::model::observation::Observation;
use std::fmt;
use std::str::FromStr;

const DELIMITER: char = '_';
const FIELD_COUNT: usize = 2 + Card::RANKS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub own_total: u8,
    pub opponent_upcard: u8,
    pub counts: [u8; Card::RANKS],
}

impl StateKey {
    pub fn new(own_total: u8, opponent_upcard: u8, deck: &Deck) -> Self {
        Self {
            own_total,
            opponent_upcard,
            counts: deck.remaining_counts(),
        }
    }
}

impl From<&Observation> for StateKey {
    fn from(observation: &Observation) -> Self {
        Self {
            own_total: observation.own_total,
            opponent_upcard: observation.opponent_upcard,
            counts: observation.remaining,
        }
    }
}

impl From<Observation> for StateKey {
    fn from(observation: Observation) -> Self {
        Self::from(&observation)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.own_total, self.opponent_upcard)?;
        for count in &self.counts {
            write!(f, "{DELIMITER}{count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateKeyParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field {index} ('{value}') is not a canonical integer in 0..=255")]
    InvalidField { index: usize, value: String },
}

impl FromStr for StateKey {
    type Err = StateKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(StateKeyParseError::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let mut values = [0u8; FIELD_COUNT];
        for (index, field) in fields.iter().enumerate() {
            values[index] = parse_field(field).ok_or_else(|| StateKeyParseError::InvalidField {
                index,
                value: (*field).to_string(),
            })?;
        }

        let mut counts = [0u8; Card::RANKS];
        counts.copy_from_slice(&values[2..]);
        Ok(Self {
            own_total: values[0],
            opponent_upcard: values[1],
            counts,
        })
    }
}

/// Plain decimal digits with no sign and no leading zero, so each value has
/// exactly one textual form.
fn parse_field(field: &str) -> Option<u8> {
    let canonical = !field.is_empty()
        && field.bytes().all(|b| b.is_ascii_digit())
        && (field.len() == 1 || !field.starts_with('0'));
    if canonical { field.parse().ok() } else { None }
}
