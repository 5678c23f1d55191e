//! Dice pool construction and rolling.

use rand::rngs::StdRng;

use super::Die;
use super::roll::RollResult;

/// A number of identical dice rolled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicePool {
    /// The kind of die in the pool.
    pub die: Die,
    /// How many dice are rolled.
    pub count: u32,
}

impl DicePool {
    /// Create a pool of `count` dice of the given kind.
    pub fn new(die: Die, count: u32) -> Self {
        Self { die, count }
    }

    /// A pool of six-sided damage dice.
    pub fn damage(count: u32) -> Self {
        Self::new(Die::D6, count)
    }

    /// Roll all dice in the pool using the given RNG.
    pub fn roll(&self, rng: &mut StdRng) -> RollResult {
        let values = (0..self.count).map(|_| self.die.roll(rng)).collect();
        RollResult {
            die: self.die,
            values,
        }
    }
}
