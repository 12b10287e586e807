/// Thresholds for the rule-based opponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicParams {
    /// Below this total the heuristic always hits.
    pub always_hit_below: u8,
    /// On the first turn, an upcard at or under this value hits.
    pub first_turn_upcard_max: u8,
    /// On the first turn, hit when the expected total is under this.
    pub first_turn_expected_limit: f64,
    pub base_tolerance: f64,
    /// Opponent totals at or above this make the heuristic more careful.
    pub strong_opponent_total: u8,
    pub strong_opponent_reduction: f64,
    pub strong_opponent_floor: f64,
    /// Own totals under this lower the tolerance further.
    pub weak_hand_total: u8,
    pub weak_hand_reduction: f64,
    pub max_bust_probability: f64,
    pub chase_max_bust_probability: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            always_hit_below: 12,
            first_turn_upcard_max: 6,
            first_turn_expected_limit: 17.0,
            base_tolerance: 17.0,
            strong_opponent_total: 17,
            strong_opponent_reduction: 2.0,
            strong_opponent_floor: 15.0,
            weak_hand_total: 10,
            weak_hand_reduction: 2.0,
            max_bust_probability: 0.30,
            chase_max_bust_probability: 0.25,
        }
    }
}
