//! Drives one round from deal to termination between two policies.

use duel_bot::policy::{Policy, PolicyContext};
use duel_core::model::deck::Deck;
use duel_core::model::observation::Observation;
use duel_core::model::round::{MAX_TURN_PAIRS, Round, RoundError, RoundResult, StepOutcome};
use duel_core::model::side::Side;
use rand::Rng;

/// Seats policies at the two sides of a round.
pub trait Lineup {
    fn policy_for(&mut self, side: Side) -> &mut dyn Policy;
}

/// A different policy on each side.
pub struct Pair<'p> {
    a: &'p mut dyn Policy,
    b: &'p mut dyn Policy,
}

impl<'p> Pair<'p> {
    pub fn new(a: &'p mut dyn Policy, b: &'p mut dyn Policy) -> Self {
        Self { a, b }
    }
}

impl Lineup for Pair<'_> {
    fn policy_for(&mut self, side: Side) -> &mut dyn Policy {
        match side {
            Side::A => &mut *self.a,
            Side::B => &mut *self.b,
        }
    }
}

/// One policy playing both sides (self-play).
pub struct Mirror<'p> {
    policy: &'p mut dyn Policy,
}

impl<'p> Mirror<'p> {
    pub fn new(policy: &'p mut dyn Policy) -> Self {
        Self { policy }
    }
}

impl Lineup for Mirror<'_> {
    fn policy_for(&mut self, _side: Side) -> &mut dyn Policy {
        &mut *self.policy
    }
}

/// One applied action together with what the acting side saw beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub side: Side,
    pub observation: Observation,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeLog {
    pub steps: Vec<StepRecord>,
    pub result: RoundResult,
}

impl EpisodeLog {
    pub fn steps_for(&self, side: Side) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |step| step.side == side)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundEngine {
    opening_cards: usize,
    turn_cap: u32,
}

impl RoundEngine {
    pub fn new(opening_cards: usize) -> Self {
        Self {
            opening_cards,
            turn_cap: MAX_TURN_PAIRS,
        }
    }

    pub fn with_turn_cap(mut self, turn_pairs: u32) -> Self {
        self.turn_cap = turn_pairs;
        self
    }

    pub fn opening_cards(&self) -> usize {
        self.opening_cards
    }

    /// Shuffle a fresh master deck and deal the opening hands.
    pub fn deal<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Round, RoundError> {
        self.deal_from(Deck::shuffled(rng))
    }

    pub fn deal_from(&self, deck: Deck) -> Result<Round, RoundError> {
        Round::deal(deck, self.opening_cards).map(|round| round.with_turn_cap(self.turn_cap))
    }

    /// Alternate turns until the round ends.
    pub fn play(&self, mut round: Round, lineup: &mut dyn Lineup) -> Result<EpisodeLog, RoundError> {
        let mut steps = Vec::new();
        loop {
            let side = round.current_side().ok_or(RoundError::RoundOver)?;
            let observation = round.observe(side);
            let action = {
                let ctx = PolicyContext::new(side, &round);
                lineup.policy_for(side).choose_action(&ctx)
            };
            let outcome = round.apply_action(side, action)?;
            steps.push(StepRecord {
                side,
                observation,
                outcome,
            });
            if let Some(result) = outcome.finished {
                return Ok(EpisodeLog { steps, result });
            }
        }
    }
}
