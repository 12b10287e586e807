use super::{Policy, PolicyContext};
use duel_core::model::action::Action;
use std::collections::VecDeque;

/// Replays actions supplied from outside, e.g. a human player's input.
/// Once the queue runs dry every further decision is a stand.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    queue: VecDeque<Action>,
}

impl ScriptedPolicy {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            queue: actions.into_iter().collect(),
        }
    }

    pub fn push(&mut self, action: Action) {
        self.queue.push_back(action);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn choose_action(&mut self, _ctx: &PolicyContext) -> Action {
        self.queue.pop_front().unwrap_or(Action::Stand)
    }
}
