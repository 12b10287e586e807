use super::agent::{Exploration, QAgent};
use super::state::StateKey;
use duel_bot::policy::{Policy, PolicyContext};
use duel_core::model::action::Action;
use rand::Rng;
use tracing::{Level, event};

/// Adapts a [`QAgent`] to the [`Policy`] interface for one episode or one
/// live decision.
pub struct LearningPolicy<'a, R: Rng + ?Sized> {
    agent: &'a mut QAgent,
    rng: &'a mut R,
    exploration: Exploration,
}

impl<'a, R: Rng + ?Sized> LearningPolicy<'a, R> {
    pub fn new(agent: &'a mut QAgent, rng: &'a mut R, exploration: Exploration) -> Self {
        Self {
            agent,
            rng,
            exploration,
        }
    }
}

impl<R: Rng + ?Sized> Policy for LearningPolicy<'_, R> {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn choose_action(&mut self, ctx: &PolicyContext) -> Action {
        let observation = ctx.round.observe(ctx.side);
        let state = StateKey::from(&observation);
        let decision = self
            .agent
            .choose(&state, observation.own_total, self.exploration, self.rng);

        if tracing::enabled!(Level::TRACE) {
            event!(
                target: "duel_app::decide",
                Level::TRACE,
                side = %ctx.side,
                state = %state,
                action = decision.action.as_str(),
                source = decision.source.as_str(),
                epsilon = self.agent.exploration_rate(self.exploration),
            );
        }

        decision.action
    }
}
