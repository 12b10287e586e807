mod draw;
mod estimate;
mod params;

pub use draw::{DrawDecision, DrawReason, should_draw};
pub use estimate::{DrawEstimate, expected_value_and_bust_probability, risk_tolerance};
pub use params::HeuristicParams;
