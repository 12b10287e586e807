//! Per-side transition memory for one episode.
//!
//! Rewards are attached while the log is replayed; learning happens only
//! after the round has ended so the terminal reward is known.

use super::agent::QAgent;
use super::env::EpisodeLog;
use super::rewards::RewardConfig;
use super::state::StateKey;
use duel_core::model::action::Action;
use duel_core::model::side::Side;

/// A single decision of the learning side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateKey,
    /// The action the policy asked for, even when a hit was applied as a
    /// forced stand.
    pub action: Action,
    pub reward: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeMemory {
    transitions: Vec<Transition>,
}

impl EpisodeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `side`'s decisions from `log`, with shaped step rewards and
    /// the terminal reward added to the last one.
    pub fn from_log(log: &EpisodeLog, side: Side, rewards: &RewardConfig) -> Self {
        let mut memory = Self::new();
        for step in log.steps_for(side) {
            memory.record(
                StateKey::from(&step.observation),
                step.outcome.requested,
                rewards.step_reward(&step.outcome),
            );
        }
        memory.add_terminal(rewards.terminal_reward(side, &log.result));
        memory
    }

    pub fn record(&mut self, state: StateKey, action: Action, reward: f64) {
        self.transitions.push(Transition {
            state,
            action,
            reward,
        });
    }

    pub fn add_terminal(&mut self, reward: f64) {
        if let Some(last) = self.transitions.last_mut() {
            last.reward += reward;
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Feed every transition to `agent`, each with the following decision's
    /// state as its successor and none for the last.
    pub fn replay(&self, agent: &mut QAgent) -> usize {
        for (index, transition) in self.transitions.iter().enumerate() {
            let next = self.transitions.get(index + 1).map(|t| &t.state);
            agent.learn(&transition.state, transition.action, transition.reward, next);
        }
        self.transitions.len()
    }
}
