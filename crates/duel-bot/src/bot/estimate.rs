use super::HeuristicParams;
use duel_core::model::card::Card;
use duel_core::model::deck::Deck;
use duel_core::model::hand::Hand;
use duel_core::model::BURST_LIMIT;

/// Outlook of drawing exactly one more card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawEstimate {
    /// Mean of the hypothetical totals over every remaining card.
    pub expected_total: f64,
    /// Share of those hypothetical totals that bust.
    pub bust_probability: f64,
}

/// Enumerate every card left in `deck` as the next draw for `hand`.
///
/// Returns `None` for an empty deck: there is nothing to average, and the
/// caller must not read that as a zero-risk draw.
pub fn expected_value_and_bust_probability(hand: &Hand, deck: &Deck) -> Option<DrawEstimate> {
    let cards = deck.cards();
    if cards.is_empty() {
        return None;
    }

    let base = u32::from(hand.total());
    let mut sum = 0u32;
    let mut busts = 0u32;
    for card in cards {
        let hypothetical = base + u32::from(card.value());
        sum += hypothetical;
        if hypothetical > u32::from(BURST_LIMIT) {
            busts += 1;
        }
    }

    let n = cards.len() as f64;
    Some(DrawEstimate {
        expected_total: f64::from(sum) / n,
        bust_probability: f64::from(busts) / n,
    })
}

/// Total below which the heuristic is still willing to draw. Tightens
/// against a strong opponent, loosens for a weak own hand, and gains a
/// bonus proportional to how full the deck still is.
pub fn risk_tolerance(
    own_total: u8,
    opponent_total: u8,
    deck: &Deck,
    params: &HeuristicParams,
) -> f64 {
    let mut tolerance = params.base_tolerance;
    if opponent_total >= params.strong_opponent_total {
        tolerance =
            (tolerance - params.strong_opponent_reduction).max(params.strong_opponent_floor);
    }
    if own_total < params.weak_hand_total {
        tolerance -= params.weak_hand_reduction;
    }
    tolerance + deck.len() as f64 / Card::RANKS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(values: &[u8]) -> Vec<Card> {
        values.iter().filter_map(|&v| Card::new(v)).collect()
    }

    #[test]
    fn empty_deck_is_undefined_not_zero() {
        let hand = Hand::with_cards(cards(&[10]));
        let deck = Deck::from_cards(Vec::new());
        assert_eq!(expected_value_and_bust_probability(&hand, &deck), None);
    }

    #[test]
    fn averages_every_remaining_card() {
        let hand = Hand::with_cards(cards(&[10, 5]));
        let deck = Deck::from_cards(cards(&[2, 6, 7, 9]));
        let estimate = expected_value_and_bust_probability(&hand, &deck).unwrap();
        assert!((estimate.expected_total - 21.0).abs() < 1e-9);
        assert!((estimate.bust_probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn deck_of_tens_predicts_certain_bust() {
        let hand = Hand::with_cards(cards(&[8, 4]));
        let deck = Deck::from_cards(cards(&[10, 10, 10]));
        let estimate = expected_value_and_bust_probability(&hand, &deck).unwrap();
        assert_eq!(estimate.bust_probability, 1.0);
        assert!((estimate.expected_total - 22.0).abs() < 1e-9);
    }

    #[test]
    fn tolerance_base_plus_full_deck_bonus() {
        let params = HeuristicParams::default();
        let deck = Deck::standard();
        assert!((risk_tolerance(12, 10, &deck, &params) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn tolerance_reductions_stack_and_floor() {
        let params = HeuristicParams::default();
        let empty = Deck::from_cards(Vec::new());
        assert!((risk_tolerance(12, 18, &empty, &params) - 15.0).abs() < 1e-9);
        assert!((risk_tolerance(9, 18, &empty, &params) - 13.0).abs() < 1e-9);
        assert!((risk_tolerance(9, 3, &empty, &params) - 15.0).abs() < 1e-9);

        let tight = HeuristicParams {
            strong_opponent_reduction: 5.0,
            ..HeuristicParams::default()
        };
        assert!((risk_tolerance(12, 20, &empty, &tight) - 15.0).abs() < 1e-9);
    }
}
