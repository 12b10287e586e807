mod agent;
mod env;
pub mod experience;
mod policy;
pub mod rewards;
mod state;
mod table;

pub use agent::{
    AgentParams, Decision, DecisionSource, Exploration, LOW_TOTAL_HIT, ParamsError, QAgent,
    SAFETY_STAND_TOTAL, SharedAgent, shared,
};
pub use env::{EpisodeLog, Lineup, Mirror, Pair, RoundEngine, StepRecord};
pub use experience::{EpisodeMemory, Transition};
pub use policy::LearningPolicy;
pub use rewards::{RewardConfig, TerminalRewardMode};
pub use state::{StateKey, StateKeyParseError};
pub use table::{ActionValues, QTable};
