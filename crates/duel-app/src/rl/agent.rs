//! Tabular Q-learning agent.
//!
//! Action selection is an ordered chain: hard guards on the current total
//! run first and short-circuit, and only a state that passes every guard
//! reaches the epsilon-greedy table lookup.

use super::state::StateKey;
use super::table::{ActionValues, QTable};
use crate::store::{LoadStatus, PolicyStore, StoreError};
use duel_core::model::action::Action;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Level, event};

/// At or above this total the agent always stands.
pub const SAFETY_STAND_TOTAL: u8 = 21;
/// At or below this total the agent always hits.
pub const LOW_TOTAL_HIT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// Learning rate.
    pub alpha: f64,
    /// Discount applied to the next state's best value.
    pub gamma: f64,
    /// Starting exploration rate for training.
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub reward_scale: f64,
    /// Exploration rate used outside training.
    pub inference_epsilon: f64,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.3,
            epsilon_decay: 0.99999,
            epsilon_min: 0.01,
            reward_scale: 1.0,
            inference_epsilon: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("epsilon_min {min} exceeds the starting epsilon {start}")]
    FloorAboveStart { min: f64, start: f64 },
}

impl AgentParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        check("alpha", self.alpha, "(0, 1]", |v| v > 0.0 && v <= 1.0)?;
        check("gamma", self.gamma, "[0, 1]", |v| (0.0..=1.0).contains(&v))?;
        check("epsilon", self.epsilon, "[0, 1]", |v| (0.0..=1.0).contains(&v))?;
        check("epsilon_decay", self.epsilon_decay, "(0, 1]", |v| {
            v > 0.0 && v <= 1.0
        })?;
        check("epsilon_min", self.epsilon_min, "[0, 1]", |v| {
            (0.0..=1.0).contains(&v)
        })?;
        check("inference_epsilon", self.inference_epsilon, "[0, 1]", |v| {
            (0.0..=1.0).contains(&v)
        })?;
        check("reward_scale", self.reward_scale, "finite values", f64::is_finite)?;
        if self.epsilon_min > self.epsilon {
            return Err(ParamsError::FloorAboveStart {
                min: self.epsilon_min,
                start: self.epsilon,
            });
        }
        Ok(())
    }
}

fn check(
    field: &'static str,
    value: f64,
    range: &'static str,
    accept: impl Fn(f64) -> bool,
) -> Result<(), ParamsError> {
    if accept(value) {
        Ok(())
    } else {
        Err(ParamsError::OutOfRange {
            field,
            value,
            range,
        })
    }
}

/// Which exploration rate applies to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exploration {
    /// The agent's current decaying rate.
    Training,
    /// The fixed inference rate from [`AgentParams`].
    Inference,
}

/// Which link of the decision chain produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    TerminalSafety,
    LowTotal,
    Explore,
    Exploit,
}

impl DecisionSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionSource::TerminalSafety => "terminal_safety",
            DecisionSource::LowTotal => "low_total",
            DecisionSource::Explore => "explore",
            DecisionSource::Exploit => "exploit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub source: DecisionSource,
}

type Guard = fn(u8) -> Option<Action>;

fn terminal_safety(current_total: u8) -> Option<Action> {
    (current_total >= SAFETY_STAND_TOTAL).then_some(Action::Stand)
}

fn low_total(current_total: u8) -> Option<Action> {
    (current_total <= LOW_TOTAL_HIT).then_some(Action::Hit)
}

const GUARDS: [(DecisionSource, Guard); 2] = [
    (DecisionSource::TerminalSafety, terminal_safety),
    (DecisionSource::LowTotal, low_total),
];

#[derive(Debug, Clone, PartialEq)]
pub struct QAgent {
    table: QTable,
    params: AgentParams,
    epsilon: f64,
}

/// One agent deliberately shared between a trainer and a live controller.
pub type SharedAgent = Arc<RwLock<QAgent>>;

pub fn shared(agent: QAgent) -> SharedAgent {
    Arc::new(RwLock::new(agent))
}

impl Default for QAgent {
    fn default() -> Self {
        Self::new(AgentParams::default())
    }
}

impl QAgent {
    pub fn new(params: AgentParams) -> Self {
        Self {
            table: QTable::new(),
            epsilon: params.epsilon,
            params,
        }
    }

    pub fn with_table(params: AgentParams, table: QTable) -> Self {
        Self {
            table,
            ..Self::new(params)
        }
    }

    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn exploration_rate(&self, exploration: Exploration) -> f64 {
        match exploration {
            Exploration::Training => self.epsilon,
            Exploration::Inference => self.params.inference_epsilon,
        }
    }

    pub fn value(&self, state: &StateKey) -> Option<ActionValues> {
        self.table.get(state).copied()
    }

    pub fn choose_action<R: Rng + ?Sized>(
        &mut self,
        state: &StateKey,
        current_total: u8,
        exploration: Exploration,
        rng: &mut R,
    ) -> Action {
        self.choose(state, current_total, exploration, rng).action
    }

    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        state: &StateKey,
        current_total: u8,
        exploration: Exploration,
        rng: &mut R,
    ) -> Decision {
        for (source, guard) in GUARDS {
            if let Some(action) = guard(current_total) {
                return Decision { action, source };
            }
        }

        let values = *self.table.materialize(*state);
        let rate = self.exploration_rate(exploration);
        if rng.gen_range(0.0..1.0) < rate {
            let action = if rng.gen_bool(0.5) {
                Action::Hit
            } else {
                Action::Stand
            };
            return Decision {
                action,
                source: DecisionSource::Explore,
            };
        }

        Decision {
            action: values.best(),
            source: DecisionSource::Exploit,
        }
    }

    /// One temporal-difference update. An absent or unseen next state
    /// contributes zero future value.
    pub fn learn(&mut self, state: &StateKey, action: Action, reward: f64, next: Option<&StateKey>) {
        let reward = reward * self.params.reward_scale;
        let next_max = next
            .and_then(|key| self.table.get(key))
            .map_or(0.0, ActionValues::max);
        let AgentParams { alpha, gamma, .. } = self.params;
        let value = self.table.materialize(*state).get_mut(action);
        *value += alpha * (reward + gamma * next_max - *value);
    }

    /// Multiply epsilon by the decay factor, floored at `epsilon_min`. Never
    /// raises epsilon.
    pub fn decay_epsilon(&mut self) {
        let decayed = (self.epsilon * self.params.epsilon_decay).max(self.params.epsilon_min);
        self.epsilon = decayed.min(self.epsilon);
    }

    pub fn replace_table(&mut self, table: QTable) {
        self.table = table;
    }

    pub fn save(&self, store: &mut dyn PolicyStore) -> Result<(), StoreError> {
        store.write(&self.table)?;
        event!(
            target: "duel_app::store",
            Level::INFO,
            location = %store.describe(),
            entries = self.table.len(),
            "policy saved"
        );
        Ok(())
    }

    /// Replace the table from `store`. A missing or unreadable store leaves
    /// the table empty and is reported through the returned status only.
    pub fn load(&mut self, store: &dyn PolicyStore) -> LoadStatus {
        match store.read() {
            Ok(Some(table)) => {
                let entries = table.len();
                self.table = table;
                event!(
                    target: "duel_app::store",
                    Level::INFO,
                    location = %store.describe(),
                    entries,
                    "policy loaded"
                );
                LoadStatus::Loaded { entries }
            }
            Ok(None) => {
                self.table.clear();
                event!(
                    target: "duel_app::store",
                    Level::WARN,
                    location = %store.describe(),
                    "no stored policy, starting empty"
                );
                LoadStatus::Missing
            }
            Err(err) => {
                self.table.clear();
                event!(
                    target: "duel_app::store",
                    Level::WARN,
                    location = %store.describe(),
                    error = %err,
                    "stored policy unreadable, starting empty"
                );
                LoadStatus::Corrupt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::model::deck::Deck;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn key(total: u8) -> StateKey {
        StateKey::new(total, 6, &Deck::standard())
    }

    fn agent_with_epsilon(epsilon: f64) -> QAgent {
        QAgent::new(AgentParams {
            epsilon,
            epsilon_min: 0.0,
            inference_epsilon: epsilon,
            ..AgentParams::default()
        })
    }

    #[test]
    fn stands_at_or_above_limit_for_any_epsilon() {
        let mut rng = StdRng::seed_from_u64(1);
        for epsilon in [0.0, 0.5, 1.0] {
            let mut agent = agent_with_epsilon(epsilon);
            for total in 21..=32 {
                for _ in 0..20 {
                    let decision = agent.choose(&key(total), total, Exploration::Training, &mut rng);
                    assert_eq!(decision.action, Action::Stand);
                    assert_eq!(decision.source, DecisionSource::TerminalSafety);
                }
            }
        }
    }

    #[test]
    fn hits_at_or_below_eight_even_without_exploration() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut agent = agent_with_epsilon(0.0);
        let state = key(8);
        agent.replace_table(QTable::from_iter([(
            state,
            ActionValues {
                hit: -5.0,
                stand: 5.0,
            },
        )]));
        for total in 0..=8 {
            let decision = agent.choose(&key(total), total, Exploration::Inference, &mut rng);
            assert_eq!(decision.action, Action::Hit);
            assert_eq!(decision.source, DecisionSource::LowTotal);
        }
    }

    #[test]
    fn guards_do_not_touch_the_table() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut agent = QAgent::default();
        agent.choose_action(&key(4), 4, Exploration::Training, &mut rng);
        agent.choose_action(&key(25), 25, Exploration::Training, &mut rng);
        assert!(agent.table().is_empty());
    }

    #[test]
    fn greedy_follows_table_and_materializes() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut agent = agent_with_epsilon(0.0);
        let state = key(15);

        let first = agent.choose(&state, 15, Exploration::Training, &mut rng);
        assert_eq!(first.action, Action::Hit);
        assert_eq!(first.source, DecisionSource::Exploit);
        assert_eq!(agent.value(&state), Some(ActionValues::default()));

        agent.learn(&state, Action::Stand, 1.0, None);
        assert_eq!(agent.choose_action(&state, 15, Exploration::Training, &mut rng), Action::Stand);
    }

    #[test]
    fn full_exploration_picks_both_actions() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut agent = agent_with_epsilon(1.0);
        let state = key(14);
        let mut seen = [false; 2];
        for _ in 0..200 {
            let decision = agent.choose(&state, 14, Exploration::Training, &mut rng);
            assert_eq!(decision.source, DecisionSource::Explore);
            seen[(decision.action == Action::Stand) as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn learn_applies_td_update() {
        let mut agent = QAgent::default();
        let state = key(13);
        let next = key(17);
        agent.replace_table(QTable::from_iter([(
            next,
            ActionValues {
                hit: -1.0,
                stand: 2.0,
            },
        )]));

        agent.learn(&state, Action::Hit, 1.0, Some(&next));
        // 0 + 0.1 * (1 + 0.9 * 2 - 0)
        let hit = agent.value(&state).map(|v| v.hit).unwrap_or_default();
        assert!((hit - 0.28).abs() < 1e-12);

        // unseen next state contributes nothing and is not materialized
        let unseen = key(19);
        agent.learn(&state, Action::Stand, -1.0, Some(&unseen));
        let stand = agent.value(&state).map(|v| v.stand).unwrap_or_default();
        assert!((stand + 0.1).abs() < 1e-12);
        assert!(agent.value(&unseen).is_none());
    }

    #[test]
    fn reward_scale_multiplies_reward() {
        let mut agent = QAgent::new(AgentParams {
            reward_scale: 2.0,
            ..AgentParams::default()
        });
        let state = key(16);
        agent.learn(&state, Action::Stand, 1.0, None);
        let stand = agent.value(&state).map(|v| v.stand).unwrap_or_default();
        assert!((stand - 0.2).abs() < 1e-12);
    }

    #[test]
    fn decay_is_monotone_and_floored() {
        let mut agent = QAgent::new(AgentParams {
            epsilon: 0.3,
            epsilon_decay: 0.5,
            epsilon_min: 0.05,
            ..AgentParams::default()
        });
        let mut previous = agent.epsilon();
        for _ in 0..20 {
            agent.decay_epsilon();
            assert!(agent.epsilon() <= previous);
            assert!(agent.epsilon() >= 0.05);
            previous = agent.epsilon();
        }
        assert_eq!(agent.epsilon(), 0.05);
    }

    #[test]
    fn validate_rejects_bad_params() {
        assert!(AgentParams::default().validate().is_ok());
        let bad_alpha = AgentParams {
            alpha: 0.0,
            ..AgentParams::default()
        };
        assert!(matches!(
            bad_alpha.validate(),
            Err(ParamsError::OutOfRange { field: "alpha", .. })
        ));
        let floor_above = AgentParams {
            epsilon: 0.1,
            epsilon_min: 0.2,
            ..AgentParams::default()
        };
        assert!(matches!(
            floor_above.validate(),
            Err(ParamsError::FloorAboveStart { .. })
        ));
    }
}
