//! Reward computation for the learning side.
//!
//! A step earns a small shaping bonus when a hit improves the total without
//! busting. The terminal component depends on [`TerminalRewardMode`] and is
//! folded into the side's last recorded step.

use duel_core::model::round::{RoundResult, StepOutcome};
use duel_core::model::side::Side;
use duel_core::model::{BURST_LIMIT, is_bust};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const SHAPING_BONUS: f64 = 0.1;
pub const BUST_PENALTY: f64 = -10.0;
pub const OPPONENT_BUST_BONUS: f64 = 10.0;
/// Distance used for an opponent who is already bust.
pub const MARGIN_SENTINEL: i32 = 999;

/// +0.1 for a total that went up without busting, else 0.
pub fn intermediate_reward(prev_total: u8, new_total: u8) -> f64 {
    if new_total > prev_total && !is_bust(new_total) {
        SHAPING_BONUS
    } else {
        0.0
    }
}

/// Signed, unclipped difference between the two distances to the limit.
/// Positive when the agent is closer.
pub fn final_margin_reward(agent_total: u8, opponent_total: u8) -> f64 {
    let limit = i32::from(BURST_LIMIT);
    let agent_distance = limit - i32::from(agent_total);
    let opponent_distance = if opponent_total <= BURST_LIMIT {
        limit - i32::from(opponent_total)
    } else {
        MARGIN_SENTINEL
    };
    f64::from(opponent_distance - agent_distance)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalRewardMode {
    /// Bust penalty, opponent-bust bonus, otherwise the final margin.
    Margin,
    /// +1 / -1 / 0 from the judged outcome.
    Outcome,
}

impl TerminalRewardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalRewardMode::Margin => "margin",
            TerminalRewardMode::Outcome => "outcome",
        }
    }

    pub fn reward(&self, side: Side, result: &RoundResult) -> f64 {
        let own = result.totals[side.index()];
        let opponent = result.totals[side.other().index()];
        match self {
            TerminalRewardMode::Margin => {
                if is_bust(own) {
                    BUST_PENALTY
                } else if is_bust(opponent) {
                    OPPONENT_BUST_BONUS + f64::from(BURST_LIMIT - own)
                } else {
                    final_margin_reward(own, opponent)
                }
            }
            TerminalRewardMode::Outcome => f64::from(result.outcome.signed_for(side)),
        }
    }
}

impl FromStr for TerminalRewardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "margin" => Ok(TerminalRewardMode::Margin),
            "outcome" => Ok(TerminalRewardMode::Outcome),
            _ => Err(format!("Unknown terminal reward mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub terminal: TerminalRewardMode,
    pub shaping: bool,
}

impl RewardConfig {
    pub const fn vs_heuristic() -> Self {
        Self {
            terminal: TerminalRewardMode::Margin,
            shaping: true,
        }
    }

    pub const fn self_play() -> Self {
        Self {
            terminal: TerminalRewardMode::Outcome,
            shaping: false,
        }
    }

    pub fn step_reward(&self, step: &StepOutcome) -> f64 {
        if self.shaping {
            intermediate_reward(step.total_before, step.total_after)
        } else {
            0.0
        }
    }

    pub fn terminal_reward(&self, side: Side, result: &RoundResult) -> f64 {
        self.terminal.reward(side, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::model::outcome::judge;
    use duel_core::model::round::EndReason;

    fn result(total_a: u8, total_b: u8, reason: EndReason) -> RoundResult {
        RoundResult {
            outcome: judge(total_a, total_b),
            reason,
            totals: [total_a, total_b],
        }
    }

    #[test]
    fn shaping_only_for_safe_improvement() {
        assert_eq!(intermediate_reward(10, 15), SHAPING_BONUS);
        assert_eq!(intermediate_reward(15, 15), 0.0);
        assert_eq!(intermediate_reward(15, 23), 0.0);
        assert_eq!(intermediate_reward(20, 21), SHAPING_BONUS);
    }

    #[test]
    fn margin_is_signed_distance_difference() {
        assert_eq!(final_margin_reward(20, 17), 3.0);
        assert_eq!(final_margin_reward(17, 20), -3.0);
        assert_eq!(final_margin_reward(19, 19), 0.0);
        // bust opponent uses the sentinel distance
        assert_eq!(final_margin_reward(18, 22), 996.0);
    }

    #[test]
    fn margin_mode_terminal_rewards() {
        let mode = TerminalRewardMode::Margin;
        let a_bust = result(24, 15, EndReason::Bust(Side::A));
        assert_eq!(mode.reward(Side::A, &a_bust), BUST_PENALTY);
        assert_eq!(mode.reward(Side::B, &a_bust), 16.0);

        let stood = result(19, 17, EndReason::BothStood);
        assert_eq!(mode.reward(Side::A, &stood), 2.0);
        assert_eq!(mode.reward(Side::B, &stood), -2.0);
    }

    #[test]
    fn outcome_mode_is_plus_minus_one() {
        let mode = TerminalRewardMode::Outcome;
        let stood = result(19, 17, EndReason::BothStood);
        assert_eq!(mode.reward(Side::A, &stood), 1.0);
        assert_eq!(mode.reward(Side::B, &stood), -1.0);
        let tie = result(18, 18, EndReason::TurnCap);
        assert_eq!(mode.reward(Side::A, &tie), 0.0);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Margin".parse::<TerminalRewardMode>(), Ok(TerminalRewardMode::Margin));
        assert_eq!("outcome".parse::<TerminalRewardMode>(), Ok(TerminalRewardMode::Outcome));
        assert!("ranked".parse::<TerminalRewardMode>().is_err());
    }
}
