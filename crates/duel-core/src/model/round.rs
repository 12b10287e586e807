use crate::model::action::Action;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::observation::Observation;
use crate::model::outcome::{Outcome, judge};
use crate::model::side::Side;
use serde::{Deserialize, Serialize};

/// Consecutive stands each side must reach before the round resolves.
pub const STAND_LIMIT: u8 = 3;
/// Turn pairs after which the round is resolved regardless of play.
pub const MAX_TURN_PAIRS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Turn(Side),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Bust(Side),
    BothStood,
    TurnCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub outcome: Outcome,
    pub reason: EndReason,
    pub totals: [u8; 2],
}

/// Effect of one applied action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub side: Side,
    pub requested: Action,
    pub applied: Action,
    pub drawn: Option<Card>,
    pub total_before: u8,
    pub total_after: u8,
    pub finished: Option<RoundResult>,
}

impl StepOutcome {
    /// A hit that found the deck empty and was applied as a stand.
    pub fn forced_stand(&self) -> bool {
        self.requested == Action::Hit && self.applied == Action::Stand
    }

    pub fn busted(&self) -> bool {
        matches!(
            self.finished,
            Some(RoundResult {
                reason: EndReason::Bust(side),
                ..
            }) if side == self.side
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("side {actual} acted out of turn (expected {expected})")]
    OutOfTurn { expected: Side, actual: Side },
    #[error("the round is already over")]
    RoundOver,
    #[error("deal needs {needed} cards but only {available} remain")]
    InsufficientCards { needed: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    deck: Deck,
    hands: [Hand; 2],
    turn: TurnState,
    consecutive_stands: [u8; 2],
    decisions: [u32; 2],
    actions_taken: u32,
    turn_cap: u32,
    result: Option<RoundResult>,
}

impl Round {
    /// Deal `opening_cards` to side A, then the same number to side B, from
    /// the back of `deck`. Side A acts first.
    pub fn deal(mut deck: Deck, opening_cards: usize) -> Result<Self, RoundError> {
        let needed = opening_cards * 2;
        if deck.len() < needed {
            return Err(RoundError::InsufficientCards {
                needed,
                available: deck.len(),
            });
        }

        let mut hands = [Hand::new(), Hand::new()];
        for side in Side::LOOP {
            for _ in 0..opening_cards {
                if let Some(card) = deck.draw() {
                    hands[side.index()].add(card);
                }
            }
        }

        Ok(Self::from_parts(deck, hands))
    }

    pub(crate) fn from_parts(deck: Deck, hands: [Hand; 2]) -> Self {
        Self {
            deck,
            hands,
            turn: TurnState::Turn(Side::A),
            consecutive_stands: [0; 2],
            decisions: [0; 2],
            actions_taken: 0,
            turn_cap: MAX_TURN_PAIRS,
            result: None,
        }
    }

    /// Override the turn-pair safety cap.
    pub fn with_turn_cap(mut self, turn_pairs: u32) -> Self {
        self.turn_cap = turn_pairs.max(1);
        self
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn hand(&self, side: Side) -> &Hand {
        &self.hands[side.index()]
    }

    pub fn total(&self, side: Side) -> u8 {
        self.hands[side.index()].total()
    }

    pub fn upcard(&self, side: Side) -> Option<Card> {
        self.hands[side.index()].upcard()
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn current_side(&self) -> Option<Side> {
        match self.turn {
            TurnState::Turn(side) => Some(side),
            TurnState::End => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.turn, TurnState::End)
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn consecutive_stands(&self, side: Side) -> u8 {
        self.consecutive_stands[side.index()]
    }

    pub fn decisions(&self, side: Side) -> u32 {
        self.decisions[side.index()]
    }

    /// True until `side` has made its first decision this round.
    pub fn is_first_turn(&self, side: Side) -> bool {
        self.decisions[side.index()] == 0
    }

    pub fn actions_taken(&self) -> u32 {
        self.actions_taken
    }

    pub fn turn_cap(&self) -> u32 {
        self.turn_cap
    }

    pub fn observe(&self, side: Side) -> Observation {
        Observation {
            own_total: self.total(side),
            opponent_upcard: self.upcard(side.other()).map(Card::value).unwrap_or(0),
            remaining: self.deck.remaining_counts(),
        }
    }

    /// Deck and both hands together hold each master card exactly once.
    pub fn conserves_master_deck(&self) -> bool {
        let mut counts = self.deck.remaining_counts();
        for hand in &self.hands {
            for card in hand.iter() {
                counts[card.rank_index()] = counts[card.rank_index()].saturating_add(1);
            }
        }
        counts.iter().all(|&count| count == 1)
    }

    pub fn apply_action(&mut self, side: Side, action: Action) -> Result<StepOutcome, RoundError> {
        let expected = match self.turn {
            TurnState::End => return Err(RoundError::RoundOver),
            TurnState::Turn(expected) => expected,
        };
        if expected != side {
            return Err(RoundError::OutOfTurn {
                expected,
                actual: side,
            });
        }

        let idx = side.index();
        self.decisions[idx] += 1;
        self.actions_taken += 1;
        let total_before = self.total(side);

        let mut drawn = None;
        let applied = match action {
            Action::Hit => match self.deck.draw() {
                Some(card) => {
                    self.hands[idx].add(card);
                    self.consecutive_stands[idx] = 0;
                    drawn = Some(card);
                    Action::Hit
                }
                None => {
                    self.consecutive_stands[idx] = self.consecutive_stands[idx].saturating_add(1);
                    Action::Stand
                }
            },
            Action::Stand => {
                self.consecutive_stands[idx] = self.consecutive_stands[idx].saturating_add(1);
                Action::Stand
            }
        };

        let total_after = self.total(side);
        let finished = if self.hands[idx].is_bust() {
            Some(self.finish(EndReason::Bust(side)))
        } else if self
            .consecutive_stands
            .iter()
            .all(|&count| count >= STAND_LIMIT)
        {
            Some(self.finish(EndReason::BothStood))
        } else if self.actions_taken >= self.turn_cap.saturating_mul(2) {
            Some(self.finish(EndReason::TurnCap))
        } else {
            self.turn = TurnState::Turn(side.other());
            None
        };

        Ok(StepOutcome {
            side,
            requested: action,
            applied,
            drawn,
            total_before,
            total_after,
            finished,
        })
    }

    fn finish(&mut self, reason: EndReason) -> RoundResult {
        let totals = [self.total(Side::A), self.total(Side::B)];
        let result = RoundResult {
            outcome: judge(totals[0], totals[1]),
            reason,
            totals,
        };
        self.turn = TurnState::End;
        self.result = Some(result);
        result
    }

    pub(crate) fn raw_parts(&self) -> (&Deck, &[Hand; 2], [u8; 2], [u32; 2], u32) {
        (
            &self.deck,
            &self.hands,
            self.consecutive_stands,
            self.decisions,
            self.actions_taken,
        )
    }

    pub(crate) fn restore_progress(
        &mut self,
        turn: TurnState,
        consecutive_stands: [u8; 2],
        decisions: [u32; 2],
        actions_taken: u32,
        turn_cap: u32,
        result: Option<RoundResult>,
    ) {
        self.turn = turn;
        self.consecutive_stands = consecutive_stands;
        self.decisions = decisions;
        self.actions_taken = actions_taken;
        self.turn_cap = turn_cap.max(1);
        self.result = result;
    }
}

#[cfg(test)]
mod tests {
    use super::{EndReason, Round, RoundError, STAND_LIMIT, TurnState};
    use crate::model::action::Action;
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::outcome::Outcome;
    use crate::model::side::Side;

    /// Deck whose *last* listed value is drawn first.
    fn stacked(values: &[u8]) -> Deck {
        Deck::from_cards(values.iter().filter_map(|&v| Card::new(v)).collect())
    }

    #[test]
    fn deal_gives_each_side_opening_cards() {
        let round = Round::deal(Deck::shuffled_with_seed(3), 2).unwrap();
        assert_eq!(round.hand(Side::A).len(), 2);
        assert_eq!(round.hand(Side::B).len(), 2);
        assert_eq!(round.deck().len(), 7);
        assert_eq!(round.turn(), TurnState::Turn(Side::A));
        assert!(round.conserves_master_deck());
    }

    #[test]
    fn deal_reports_insufficient_cards() {
        let err = Round::deal(stacked(&[1, 2, 3]), 2).unwrap_err();
        assert_eq!(
            err,
            RoundError::InsufficientCards {
                needed: 4,
                available: 3
            }
        );
    }

    #[test]
    fn acting_out_of_turn_is_rejected() {
        let mut round = Round::deal(Deck::standard(), 1).unwrap();
        let err = round.apply_action(Side::B, Action::Stand).unwrap_err();
        assert_eq!(
            err,
            RoundError::OutOfTurn {
                expected: Side::A,
                actual: Side::B
            }
        );
    }

    #[test]
    fn hit_that_busts_ends_round_for_opponent() {
        // A is dealt 11 and 10, B is dealt 2 and 3; A then draws 5.
        let mut round = Round::deal(stacked(&[5, 3, 2, 10, 11]), 2).unwrap();
        assert_eq!(round.total(Side::A), 21);
        let step = round.apply_action(Side::A, Action::Hit).unwrap();
        assert!(step.busted());
        let result = step.finished.expect("round finished");
        assert_eq!(result.reason, EndReason::Bust(Side::A));
        assert_eq!(result.outcome, Outcome::Win(Side::B));
        assert!(round.is_over());
        assert_eq!(
            round.apply_action(Side::B, Action::Stand),
            Err(RoundError::RoundOver)
        );
    }

    #[test]
    fn hit_resets_stand_counter_and_passes_turn() {
        let mut round = Round::deal(Deck::standard(), 1).unwrap();
        round.apply_action(Side::A, Action::Stand).unwrap();
        round.apply_action(Side::B, Action::Stand).unwrap();
        assert_eq!(round.consecutive_stands(Side::A), 1);
        let step = round.apply_action(Side::A, Action::Hit).unwrap();
        assert_eq!(step.applied, Action::Hit);
        assert_eq!(round.consecutive_stands(Side::A), 0);
        assert_eq!(round.turn(), TurnState::Turn(Side::B));
        assert!(round.conserves_master_deck());
    }

    #[test]
    fn both_sides_standing_three_times_resolves_by_closeness() {
        // A holds 9, B holds 10.
        let mut round = Round::deal(stacked(&[1, 10, 9]), 1).unwrap();
        let mut last = None;
        for _ in 0..STAND_LIMIT {
            round.apply_action(Side::A, Action::Stand).unwrap();
            last = round.apply_action(Side::B, Action::Stand).unwrap().finished;
        }
        let result = last.expect("round resolved");
        assert_eq!(result.reason, EndReason::BothStood);
        assert_eq!(result.outcome, Outcome::Win(Side::B));
    }

    #[test]
    fn one_side_standing_three_times_does_not_end_round() {
        let mut round = Round::deal(Deck::shuffled_with_seed(11), 1).unwrap();
        for _ in 0..STAND_LIMIT {
            round.apply_action(Side::A, Action::Stand).unwrap();
            let step = round.apply_action(Side::B, Action::Hit).unwrap();
            if step.finished.is_some() {
                return;
            }
        }
        assert_eq!(round.consecutive_stands(Side::A), STAND_LIMIT);
        assert!(!round.is_over());
    }

    #[test]
    fn hit_on_empty_deck_is_a_forced_stand() {
        let mut round = Round::deal(stacked(&[4, 6]), 1).unwrap();
        assert!(round.deck().is_empty());
        let step = round.apply_action(Side::A, Action::Hit).unwrap();
        assert!(step.forced_stand());
        assert_eq!(step.drawn, None);
        assert_eq!(round.consecutive_stands(Side::A), 1);
        assert_eq!(round.total(Side::A), 6);
    }

    #[test]
    fn turn_cap_forces_resolution() {
        let mut round = Round::deal(stacked(&[1, 2, 3, 8, 9]), 1)
            .unwrap()
            .with_turn_cap(2);
        round.apply_action(Side::A, Action::Stand).unwrap();
        round.apply_action(Side::B, Action::Stand).unwrap();
        round.apply_action(Side::A, Action::Hit).unwrap();
        let step = round.apply_action(Side::B, Action::Stand).unwrap();
        let result = step.finished.expect("cap reached");
        assert_eq!(result.reason, EndReason::TurnCap);
        assert_eq!(result.totals, [12, 8]);
        assert_eq!(result.outcome, Outcome::Win(Side::A));
    }

    #[test]
    fn first_turn_tracks_each_side() {
        let mut round = Round::deal(Deck::standard(), 1).unwrap();
        assert!(round.is_first_turn(Side::A));
        round.apply_action(Side::A, Action::Stand).unwrap();
        assert!(!round.is_first_turn(Side::A));
        assert!(round.is_first_turn(Side::B));
    }

    #[test]
    fn observation_reflects_deck_and_upcard() {
        let round = Round::deal(stacked(&[1, 7, 4, 10, 2]), 2).unwrap();
        let obs = round.observe(Side::A);
        assert_eq!(obs.own_total, 12);
        assert_eq!(obs.opponent_upcard, 4);
        assert_eq!(obs.cards_remaining(), 1);
        assert_eq!(obs.remaining[0], 1);
    }
}
