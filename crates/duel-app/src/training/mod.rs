//! Training orchestrator.
//!
//! Runs many engine episodes back to back, learns from each finished
//! episode and decays exploration once per episode. Everything happens on
//! the calling thread.

mod tally;

pub use tally::Tally;

use crate::rl::{
    EpisodeLog, EpisodeMemory, Exploration, LearningPolicy, Mirror, Pair, QAgent, RewardConfig,
    RoundEngine,
};
use duel_bot::bot::HeuristicParams;
use duel_bot::policy::HeuristicPolicy;
use duel_core::model::round::{MAX_TURN_PAIRS, RoundError};
use duel_core::model::side::Side;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{Level, event};

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Learning agent on side A against the heuristic on side B.
    VsHeuristic,
    /// The same agent on both sides, learning from both.
    SelfPlay,
}

impl TrainingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingMode::VsHeuristic => "vs_heuristic",
            TrainingMode::SelfPlay => "self_play",
        }
    }

    pub fn opening_cards(&self) -> usize {
        match self {
            TrainingMode::VsHeuristic => 1,
            TrainingMode::SelfPlay => 2,
        }
    }

    pub fn default_rewards(&self) -> RewardConfig {
        match self {
            TrainingMode::VsHeuristic => RewardConfig::vs_heuristic(),
            TrainingMode::SelfPlay => RewardConfig::self_play(),
        }
    }

    fn learning_sides(&self) -> &'static [Side] {
        match self {
            TrainingMode::VsHeuristic => &[Side::A],
            TrainingMode::SelfPlay => &Side::LOOP,
        }
    }
}

impl FromStr for TrainingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "vs_heuristic" | "heuristic" | "phase1" => Ok(TrainingMode::VsHeuristic),
            "self_play" | "selfplay" | "phase2" => Ok(TrainingMode::SelfPlay),
            _ => Err(format!("Unknown training mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    /// Overrides the mode's default reward configuration.
    pub rewards: Option<RewardConfig>,
    pub heuristic: HeuristicParams,
    /// Episodes between progress events; 0 disables them.
    pub progress_interval: u64,
    pub turn_cap: u32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            rewards: None,
            heuristic: HeuristicParams::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            turn_cap: MAX_TURN_PAIRS,
        }
    }
}

impl TrainerConfig {
    pub fn rewards_for(&self, mode: TrainingMode) -> RewardConfig {
        self.rewards.unwrap_or_else(|| mode.default_rewards())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub mode: TrainingMode,
    pub episodes_requested: u64,
    pub tally: Tally,
    pub final_epsilon: f64,
    pub table_size: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn engine(&self, mode: TrainingMode) -> RoundEngine {
        RoundEngine::new(mode.opening_cards()).with_turn_cap(self.config.turn_cap)
    }

    /// Train `agent` for `episodes` episodes.
    pub fn run<R: Rng + ?Sized>(
        &self,
        agent: &mut QAgent,
        mode: TrainingMode,
        episodes: u64,
        rng: &mut R,
    ) -> TrainingReport {
        let started = Instant::now();
        let engine = self.engine(mode);
        let rewards = self.config.rewards_for(mode);
        let mut tally = Tally::default();

        event!(
            target: "duel_app::train",
            Level::INFO,
            mode = mode.as_str(),
            episodes,
            epsilon = agent.epsilon(),
            table_size = agent.table().len(),
            terminal_reward = rewards.terminal.as_str(),
            shaping = rewards.shaping,
            "training started"
        );

        for episode in 1..=episodes {
            let played = self.play_episode(&engine, agent, mode, Exploration::Training, rng);
            close_episode(agent, mode, &rewards, episode, played, &mut tally);

            let interval = self.config.progress_interval;
            if interval > 0 && episode % interval == 0 {
                log_progress(episode, agent, &tally);
            }
        }

        let report = TrainingReport {
            mode,
            episodes_requested: episodes,
            tally,
            final_epsilon: agent.epsilon(),
            table_size: agent.table().len(),
            elapsed: started.elapsed(),
        };
        event!(
            target: "duel_app::train",
            Level::INFO,
            mode = mode.as_str(),
            agent1_win = report.tally.agent1_win,
            agent2_win = report.tally.agent2_win,
            draw = report.tally.draw,
            skipped = report.tally.skipped,
            epsilon = report.final_epsilon,
            table_size = report.table_size,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "training finished"
        );
        report
    }

    /// Greedy play against the heuristic on a copy of `agent`: no updates,
    /// no decay, inference exploration rate.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        agent: &QAgent,
        episodes: u64,
        rng: &mut R,
    ) -> TrainingReport {
        let started = Instant::now();
        let mode = TrainingMode::VsHeuristic;
        let engine = self.engine(mode);
        let mut greedy = agent.clone();
        let mut tally = Tally::default();

        for _ in 0..episodes {
            match self.play_episode(&engine, &mut greedy, mode, Exploration::Inference, rng) {
                Ok(log) => tally.record(log.result.outcome),
                Err(_) => tally.skipped += 1,
            }
        }

        event!(
            target: "duel_app::train",
            Level::INFO,
            agent1_win = tally.agent1_win,
            agent2_win = tally.agent2_win,
            draw = tally.draw,
            "evaluation finished"
        );

        TrainingReport {
            mode,
            episodes_requested: episodes,
            tally,
            final_epsilon: agent.exploration_rate(Exploration::Inference),
            table_size: agent.table().len(),
            elapsed: started.elapsed(),
        }
    }

    fn play_episode<R: Rng + ?Sized>(
        &self,
        engine: &RoundEngine,
        agent: &mut QAgent,
        mode: TrainingMode,
        exploration: Exploration,
        rng: &mut R,
    ) -> Result<EpisodeLog, RoundError> {
        let round = engine.deal(rng)?;
        let mut learner = LearningPolicy::new(agent, rng, exploration);
        match mode {
            TrainingMode::VsHeuristic => {
                let mut heuristic = HeuristicPolicy::new(self.config.heuristic);
                engine.play(round, &mut Pair::new(&mut learner, &mut heuristic))
            }
            TrainingMode::SelfPlay => engine.play(round, &mut Mirror::new(&mut learner)),
        }
    }
}

/// Learn from a finished episode, or count it as skipped, then decay
/// exploration. Decay happens exactly once per episode either way.
fn close_episode(
    agent: &mut QAgent,
    mode: TrainingMode,
    rewards: &RewardConfig,
    episode: u64,
    played: Result<EpisodeLog, RoundError>,
    tally: &mut Tally,
) {
    match played {
        Ok(log) => {
            for &side in mode.learning_sides() {
                EpisodeMemory::from_log(&log, side, rewards).replay(agent);
            }
            tally.record(log.result.outcome);
        }
        Err(err) => {
            tally.skipped += 1;
            event!(
                target: "duel_app::train",
                Level::WARN,
                episode,
                error = %err,
                "episode skipped"
            );
        }
    }
    agent.decay_epsilon();
}

fn log_progress(episode: u64, agent: &QAgent, tally: &Tally) {
    event!(
        target: "duel_app::train",
        Level::INFO,
        episode,
        epsilon = agent.epsilon(),
        table_size = agent.table().len(),
        agent1_win = tally.agent1_win,
        agent2_win = tally.agent2_win,
        draw = tally.draw,
        "progress"
    );
}
