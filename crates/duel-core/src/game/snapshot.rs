use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::round::{Round, RoundResult, STAND_LIMIT, TurnState};
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

/// Reasons a parked round cannot be picked up again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("deck and hands do not hold each master card exactly once")]
    CardsNotConserved,
    #[error("turn state {turn:?} disagrees with the recorded result")]
    TurnMismatch { turn: TurnState },
    #[error("live round already meets an end condition")]
    UnresolvedEnd,
    #[error("{actions_taken} actions recorded but decisions sum to {decisions}")]
    ActionCount { actions_taken: u32, decisions: u32 },
}

/// Serializable image of a live round, so a caller can park it between
/// requests and pick it up again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSnapshot {
    pub deck: Vec<Card>,
    pub hands: [Vec<Card>; 2],
    pub turn: TurnState,
    pub consecutive_stands: [u8; 2],
    pub decisions: [u32; 2],
    pub actions_taken: u32,
    pub turn_cap: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RoundResult>,
}

impl RoundSnapshot {
    pub fn capture(round: &Round) -> Self {
        let (deck, hands, consecutive_stands, decisions, actions_taken) = round.raw_parts();
        RoundSnapshot {
            deck: deck.cards().to_vec(),
            hands: [hands[0].cards().to_vec(), hands[1].cards().to_vec()],
            turn: round.turn(),
            consecutive_stands,
            decisions,
            actions_taken,
            turn_cap: round.turn_cap(),
            result: round.result(),
        }
    }

    /// Rebuild the round, rejecting any snapshot that no sequence of
    /// legal actions could have produced.
    pub fn restore(self) -> Result<Round, SnapshotError> {
        let decisions = self.decisions[0].saturating_add(self.decisions[1]);
        if decisions != self.actions_taken {
            return Err(SnapshotError::ActionCount {
                actions_taken: self.actions_taken,
                decisions,
            });
        }
        if (self.turn == TurnState::End) != self.result.is_some() {
            return Err(SnapshotError::TurnMismatch { turn: self.turn });
        }

        let held = self.deck.len() + self.hands.iter().map(Vec::len).sum::<usize>();
        if held != Card::RANKS {
            return Err(SnapshotError::CardsNotConserved);
        }

        let [hand_a, hand_b] = self.hands;
        let mut round = Round::from_parts(
            Deck::from_cards(self.deck),
            [Hand::with_cards(hand_a), Hand::with_cards(hand_b)],
        );
        if !round.conserves_master_deck() {
            return Err(SnapshotError::CardsNotConserved);
        }

        round.restore_progress(
            self.turn,
            self.consecutive_stands,
            self.decisions,
            self.actions_taken,
            self.turn_cap,
            self.result,
        );
        if !round.is_over() && live_round_has_ended(&round) {
            return Err(SnapshotError::UnresolvedEnd);
        }
        Ok(round)
    }

    pub fn to_json(round: &Round) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::capture(round))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn live_round_has_ended(round: &Round) -> bool {
    Side::LOOP.iter().any(|&side| round.hand(side).is_bust())
        || Side::LOOP
            .iter()
            .all(|&side| round.consecutive_stands(side) >= STAND_LIMIT)
        || round.actions_taken() >= round.turn_cap().saturating_mul(2)
}
