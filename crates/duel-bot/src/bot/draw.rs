use super::estimate::{expected_value_and_bust_probability, risk_tolerance};
use super::HeuristicParams;
use duel_core::model::deck::Deck;
use duel_core::model::hand::Hand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    LowTotal,
    FirstTurnLowUpcard,
    FirstTurnExpectedTotal,
    WithinTolerance,
    ChasingOpponent,
    TooRisky,
    NoEstimate,
}

impl DrawReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DrawReason::LowTotal => "low_total",
            DrawReason::FirstTurnLowUpcard => "first_turn_low_upcard",
            DrawReason::FirstTurnExpectedTotal => "first_turn_expected_total",
            DrawReason::WithinTolerance => "within_tolerance",
            DrawReason::ChasingOpponent => "chasing_opponent",
            DrawReason::TooRisky => "too_risky",
            DrawReason::NoEstimate => "no_estimate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawDecision {
    pub draw: bool,
    pub reason: DrawReason,
    pub expected_total: Option<f64>,
    pub bust_probability: Option<f64>,
    pub tolerance: Option<f64>,
}

impl DrawDecision {
    fn new(draw: bool, reason: DrawReason) -> Self {
        Self {
            draw,
            reason,
            expected_total: None,
            bust_probability: None,
            tolerance: None,
        }
    }
}

pub fn should_draw(
    own: &Hand,
    opponent: &Hand,
    deck: &Deck,
    is_first_turn: bool,
    params: &HeuristicParams,
) -> DrawDecision {
    let own_total = own.total();
    if own_total < params.always_hit_below {
        return DrawDecision::new(true, DrawReason::LowTotal);
    }

    let estimate = expected_value_and_bust_probability(own, deck);

    if is_first_turn {
        let upcard_low = own
            .upcard()
            .is_some_and(|card| card.value() <= params.first_turn_upcard_max);
        if upcard_low {
            return DrawDecision::new(true, DrawReason::FirstTurnLowUpcard);
        }
        return match estimate {
            Some(estimate) => DrawDecision {
                draw: estimate.expected_total < params.first_turn_expected_limit,
                reason: DrawReason::FirstTurnExpectedTotal,
                expected_total: Some(estimate.expected_total),
                bust_probability: Some(estimate.bust_probability),
                tolerance: None,
            },
            None => DrawDecision::new(false, DrawReason::NoEstimate),
        };
    }

    let Some(estimate) = estimate else {
        return DrawDecision::new(false, DrawReason::NoEstimate);
    };

    let opponent_total = opponent.total();
    let tolerance = risk_tolerance(own_total, opponent_total, deck, params);
    let reason = if f64::from(own_total) < tolerance
        && estimate.bust_probability < params.max_bust_probability
    {
        DrawReason::WithinTolerance
    } else if own_total < opponent_total
        && estimate.bust_probability < params.chase_max_bust_probability
    {
        DrawReason::ChasingOpponent
    } else {
        DrawReason::TooRisky
    };

    DrawDecision {
        draw: reason != DrawReason::TooRisky,
        reason,
        expected_total: Some(estimate.expected_total),
        bust_probability: Some(estimate.bust_probability),
        tolerance: Some(tolerance),
    }
}
