//! Dice roll results.

use serde::{Deserialize, Serialize};

use super::Die;

/// The outcome of rolling a [`DicePool`](super::DicePool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// The kind of die that was rolled.
    pub die: Die,
    /// Face values in roll order.
    pub values: Vec<u32>,
}

impl RollResult {
    /// Sum of all face values.
    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }

    /// How many dice landed on their highest face.
    pub fn count_max_faces(&self) -> usize {
        let max = self.die.sides();
        self.values.iter().filter(|&&v| v == max).count()
    }

    /// A roll is critical when at least two dice show the highest face.
    pub fn is_critical(&self) -> bool {
        self.count_max_faces() >= 2
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.values.iter().map(u32::to_string).collect();
        write!(f, "{}", values.join("+"))
    }
}
