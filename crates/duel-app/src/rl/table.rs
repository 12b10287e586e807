use super::state::StateKey;
use duel_core::model::action::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Estimated return of each action from one state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionValues {
    pub hit: f64,
    pub stand: f64,
}

impl ActionValues {
    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::Hit => self.hit,
            Action::Stand => self.stand,
        }
    }

    pub fn get_mut(&mut self, action: Action) -> &mut f64 {
        match action {
            Action::Hit => &mut self.hit,
            Action::Stand => &mut self.stand,
        }
    }

    pub fn max(&self) -> f64 {
        self.hit.max(self.stand)
    }

    /// Action with the strictly greater value; a tie goes to hit.
    pub fn best(&self) -> Action {
        if self.stand > self.hit {
            Action::Stand
        } else {
            Action::Hit
        }
    }
}

/// Lazily grown value table. Entries appear on first access, both actions
/// at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    entries: HashMap<StateKey, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&ActionValues> {
        self.entries.get(key)
    }

    pub fn materialize(&mut self, key: StateKey) -> &mut ActionValues {
        self.entries.entry(key).or_default()
    }

    pub fn insert(&mut self, key: StateKey, values: ActionValues) {
        self.entries.insert(key, values);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.entries.iter()
    }

    /// Same keys, and every value within `tolerance`.
    pub fn approx_eq(&self, other: &QTable, tolerance: f64) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(key, values)| {
                other.get(key).is_some_and(|theirs| {
                    (values.hit - theirs.hit).abs() <= tolerance
                        && (values.stand - theirs.stand).abs() <= tolerance
                })
            })
    }
}

impl FromIterator<(StateKey, ActionValues)> for QTable {
    fn from_iter<I: IntoIterator<Item = (StateKey, ActionValues)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::model::deck::Deck;

    #[test]
    fn materialized_entry_starts_at_zero() {
        let mut table = QTable::new();
        let key = StateKey::new(14, 3, &Deck::standard());
        assert!(table.get(&key).is_none());
        assert_eq!(*table.materialize(key), ActionValues::default());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn best_prefers_hit_on_ties() {
        assert_eq!(ActionValues::default().best(), Action::Hit);
        let values = ActionValues {
            hit: -0.5,
            stand: 0.25,
        };
        assert_eq!(values.best(), Action::Stand);
        assert_eq!(values.max(), 0.25);
    }

    #[test]
    fn approx_eq_checks_keys_and_values() {
        let key = StateKey::new(12, 5, &Deck::standard());
        let mut a = QTable::new();
        a.insert(key, ActionValues { hit: 1.0, stand: 0.0 });
        let mut b = a.clone();
        assert!(a.approx_eq(&b, 1e-12));
        b.materialize(key).hit += 1e-9;
        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&b, 1e-12));
        b.materialize(StateKey::new(13, 5, &Deck::standard()));
        assert!(!a.approx_eq(&b, 1e-6));
    }
}
