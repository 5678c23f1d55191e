//! Dice types, pools, and rolling.
//!
//! Attacks roll pools of six-sided dice; duels roll a single nine-sided die
//! per side; the opponent's hidden duel bonus comes from a ten-sided die.

pub mod pool;
pub mod roll;

pub use pool::DicePool;
pub use roll::RollResult;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// A fair die with a fixed number of faces numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Die {
    sides: u32,
}

impl Die {
    /// The damage die.
    pub const D6: Die = Die { sides: 6 };
    /// The duel round die.
    pub const D9: Die = Die { sides: 9 };
    /// The hidden duel bonus die.
    pub const D10: Die = Die { sides: 10 };

    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        self.sides
    }

    /// Roll the die once.
    pub fn roll(self, rng: &mut StdRng) -> u32 {
        rng.random_range(1..=self.sides)
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides)
    }
}
