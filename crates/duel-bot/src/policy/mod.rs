mod heuristic;
mod scripted;

pub use heuristic::HeuristicPolicy;
pub use scripted::ScriptedPolicy;

use duel_core::model::action::Action;
use duel_core::model::hand::Hand;
use duel_core::model::round::Round;
use duel_core::model::side::Side;

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub side: Side,
    pub round: &'a Round,
}

impl<'a> PolicyContext<'a> {
    pub fn new(side: Side, round: &'a Round) -> Self {
        Self { side, round }
    }

    pub fn own_hand(&self) -> &'a Hand {
        self.round.hand(self.side)
    }

    pub fn opponent_hand(&self) -> &'a Hand {
        self.round.hand(self.side.other())
    }

    pub fn own_total(&self) -> u8 {
        self.round.total(self.side)
    }
}

/// Unified interface for hit/stand decisions (heuristic, learned, or
/// externally supplied)
pub trait Policy {
    /// Short label used in logs and run summaries
    fn name(&self) -> &str;

    /// Choose the next action for `ctx.side`
    fn choose_action(&mut self, ctx: &PolicyContext) -> Action;
}
