//! Facade the enclosing application drives: live rounds, decisions for
//! either policy, training runs and policy persistence.

use crate::rl::{Exploration, LearningPolicy, SharedAgent};
use crate::store::{LoadStatus, PolicyStore, StoreError};
use crate::training::{Trainer, TrainingMode, TrainingReport};
use duel_bot::policy::{HeuristicPolicy, Policy, PolicyContext};
use duel_core::model::action::Action;
use duel_core::model::deck::Deck;
use duel_core::model::round::{Round, RoundError, StepOutcome};
use duel_core::model::side::Side;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Opening cards per side in a live round.
pub const LIVE_OPENING_CARDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Heuristic,
    Learning,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Heuristic => "heuristic",
            PolicyKind::Learning => "learning",
        }
    }
}

pub struct DuelController {
    agent: SharedAgent,
    heuristic: HeuristicPolicy,
    trainer: Trainer,
    store: Option<Box<dyn PolicyStore>>,
    rng: StdRng,
}

impl DuelController {
    pub fn new(agent: SharedAgent) -> Self {
        Self::new_with_seed(agent, None)
    }

    pub fn new_with_seed(agent: SharedAgent, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            agent,
            heuristic: HeuristicPolicy::default(),
            trainer: Trainer::default(),
            store: None,
            rng,
        }
    }

    pub fn with_store(mut self, store: impl PolicyStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicPolicy) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_trainer(mut self, trainer: Trainer) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn agent(&self) -> SharedAgent {
        SharedAgent::clone(&self.agent)
    }

    /// Shuffle a fresh deck and deal two cards to each side. Side A moves
    /// first.
    pub fn start_round(&mut self) -> Result<Round, RoundError> {
        Round::deal(Deck::shuffled(&mut self.rng), LIVE_OPENING_CARDS)
    }

    /// Reject out-of-turn or post-round requests before they reach the
    /// round, then apply the action.
    pub fn apply_action(
        &self,
        round: &mut Round,
        side: Side,
        action: Action,
    ) -> Result<StepOutcome, RoundError> {
        match round.current_side() {
            None => Err(RoundError::RoundOver),
            Some(expected) if expected != side => Err(RoundError::OutOfTurn {
                expected,
                actual: side,
            }),
            Some(_) => round.apply_action(side, action),
        }
    }

    /// The action `kind` would take for `side` right now. The learning
    /// policy uses the inference exploration rate.
    pub fn decide(&mut self, kind: PolicyKind, round: &Round, side: Side) -> Action {
        let ctx = PolicyContext::new(side, round);
        match kind {
            PolicyKind::Heuristic => self.heuristic.choose_action(&ctx),
            PolicyKind::Learning => {
                let mut agent = self.agent.write();
                LearningPolicy::new(&mut agent, &mut self.rng, Exploration::Inference)
                    .choose_action(&ctx)
            }
        }
    }

    /// Train the shared agent, then persist it when a store is attached.
    pub fn run_training(
        &mut self,
        mode: TrainingMode,
        episodes: u64,
    ) -> Result<TrainingReport, StoreError> {
        let report = {
            let mut agent = self.agent.write();
            self.trainer.run(&mut agent, mode, episodes, &mut self.rng)
        };
        if self.store.is_some() {
            self.persist()?;
        }
        Ok(report)
    }

    pub fn evaluate(&mut self, episodes: u64) -> TrainingReport {
        let agent = self.agent.read();
        self.trainer.evaluate(&agent, episodes, &mut self.rng)
    }

    /// Save the shared agent's table. Without a store this is a no-op.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.as_deref_mut() {
            Some(store) => self.agent.read().save(store),
            None => Ok(()),
        }
    }

    /// Replace the shared agent's table from the store. Never fails; a
    /// controller without a store reports [`LoadStatus::Missing`].
    pub fn restore(&self) -> LoadStatus {
        match self.store.as_deref() {
            Some(store) => self.agent.write().load(store),
            None => LoadStatus::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{QAgent, shared};
    use crate::store::MemoryStore;
    use duel_core::model::card::Card;
    use duel_core::model::round::TurnState;

    fn controller(seed: u64) -> DuelController {
        DuelController::new_with_seed(shared(QAgent::default()), Some(seed))
            .with_store(MemoryStore::new())
    }

    #[test]
    fn live_round_deals_two_each_and_a_moves_first() {
        let mut controller = controller(1);
        let round = controller.start_round().unwrap();
        assert_eq!(round.hand(Side::A).len(), 2);
        assert_eq!(round.hand(Side::B).len(), 2);
        assert_eq!(round.turn(), TurnState::Turn(Side::A));
    }

    #[test]
    fn out_of_turn_is_rejected_without_touching_the_round() {
        let mut controller = controller(2);
        let mut round = controller.start_round().unwrap();
        let before = round.clone();
        assert_eq!(
            controller.apply_action(&mut round, Side::B, Action::Hit),
            Err(RoundError::OutOfTurn {
                expected: Side::A,
                actual: Side::B
            })
        );
        assert_eq!(round, before);
    }

    #[test]
    fn learning_decision_respects_guards() {
        let mut controller = controller(3);
        // A holds 11 + 10
        let standing = Round::deal(Deck::standard(), LIVE_OPENING_CARDS).unwrap();
        assert_eq!(
            controller.decide(PolicyKind::Learning, &standing, Side::A),
            Action::Stand
        );

        // A holds 3 + 4
        let cards = [11, 10, 9, 2, 1, 4, 3]
            .iter()
            .filter_map(|&v| Card::new(v))
            .collect();
        let hitting = Round::deal(Deck::from_cards(cards), LIVE_OPENING_CARDS).unwrap();
        assert_eq!(
            controller.decide(PolicyKind::Learning, &hitting, Side::A),
            Action::Hit
        );
        assert!(controller.agent().read().table().is_empty());
    }

    #[test]
    fn heuristic_decision_uses_the_configured_policy() {
        let mut controller = controller(6);
        // A holds 11 + 10 and never draws
        let round = Round::deal(Deck::standard(), LIVE_OPENING_CARDS).unwrap();
        assert_eq!(
            controller.decide(PolicyKind::Heuristic, &round, Side::A),
            Action::Stand
        );
    }

    #[test]
    fn training_then_restore_round_trips_through_the_store() {
        let mut controller = controller(4);
        let report = controller
            .run_training(TrainingMode::SelfPlay, 200)
            .unwrap();
        assert_eq!(report.tally.played(), 200);

        let trained = controller.agent().read().table().clone();
        controller.agent().write().replace_table(Default::default());
        assert_eq!(
            controller.restore(),
            LoadStatus::Loaded {
                entries: trained.len()
            }
        );
        assert!(controller.agent().read().table().approx_eq(&trained, 1e-9));
    }

    #[test]
    fn corrupt_store_restores_empty() {
        let controller = DuelController::new_with_seed(shared(QAgent::default()), Some(5))
            .with_store(MemoryStore::with_document("{ definitely not json"));
        assert_eq!(controller.restore(), LoadStatus::Corrupt);
        assert!(controller.agent().read().table().is_empty());
    }
}
