use core::fmt;
use serde::{Deserialize, Serialize};

/// One of the two duel participants. `A` always acts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    A = 0,
    B = 1,
}

impl Side {
    pub const LOOP: [Side; 2] = [Side::A, Side::B];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::A),
            1 => Some(Side::B),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Side::A => "A",
            Side::B => "B",
        };
        f.write_str(label)
    }
}
