use super::{Policy, PolicyContext};
use crate::bot::{DrawDecision, HeuristicParams, should_draw};
use duel_core::model::action::Action;
use tracing::{Level, event};

/// Rule-based opponent: expected value, bust probability and a moving risk
/// tolerance over the cards still in the deck.
#[derive(Debug, Clone, Default)]
pub struct HeuristicPolicy {
    params: HeuristicParams,
}

impl HeuristicPolicy {
    pub fn new(params: HeuristicParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HeuristicParams {
        &self.params
    }

    pub fn evaluate(&self, ctx: &PolicyContext) -> DrawDecision {
        should_draw(
            ctx.own_hand(),
            ctx.opponent_hand(),
            ctx.round.deck(),
            ctx.round.is_first_turn(ctx.side),
            &self.params,
        )
    }
}

impl Policy for HeuristicPolicy {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn choose_action(&mut self, ctx: &PolicyContext) -> Action {
        let decision = self.evaluate(ctx);
        let action = if decision.draw {
            Action::Hit
        } else {
            Action::Stand
        };
        log_decision(ctx, &decision, action);
        action
    }
}

fn log_decision(ctx: &PolicyContext, decision: &DrawDecision, action: Action) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    event!(
        target: "duel_bot::decide",
        Level::DEBUG,
        side = %ctx.side,
        own_total = ctx.own_total(),
        opponent_total = ctx.opponent_hand().total(),
        deck_remaining = ctx.round.deck().len(),
        first_turn = ctx.round.is_first_turn(ctx.side),
        expected_total = ?decision.expected_total,
        bust_probability = ?decision.bust_probability,
        tolerance = ?decision.tolerance,
        reason = decision.reason.as_str(),
        action = action.as_str(),
    );
}
