use duel_core::model::outcome::Outcome;
use duel_core::model::side::Side;
use serde::{Deserialize, Serialize};

/// Outcome counts over a run. Agent 1 is side A, agent 2 is side B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub agent1_win: u64,
    pub agent2_win: u64,
    pub draw: u64,
    /// Episodes that could not be dealt.
    pub skipped: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win(Side::A) => self.agent1_win += 1,
            Outcome::Win(Side::B) => self.agent2_win += 1,
            Outcome::Draw => self.draw += 1,
        }
    }

    /// Episodes that reached a result.
    pub fn played(&self) -> u64 {
        self.agent1_win + self.agent2_win + self.draw
    }

    /// Share of played episodes won by agent 1.
    pub fn agent1_win_rate(&self) -> Option<f64> {
        let played = self.played();
        (played > 0).then(|| self.agent1_win as f64 / played as f64)
    }
}
