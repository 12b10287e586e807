use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hit,
    Stand,
}

impl Action {
    /// Insertion order of actions in a value-table entry. Greedy ties go to
    /// the earlier action.
    pub const ALL: [Action; 2] = [Action::Hit, Action::Stand];

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hit" | "h" => Ok(Action::Hit),
            "stand" | "s" => Ok(Action::Stand),
            other => Err(format!("Unknown action: {other}")),
        }
    }
}
