//! Damage sources and armor mitigation.
//!
//! A hit is first turned into a raw amount (flat value or a pool of d6,
//! with a critical bonus when two or more dice show a six), then mitigated
//! by the target's current armor according to the damage type.

use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::dice::{DicePool, RollResult};
use crate::error::{MechError, MechResult};

/// Bonus added to a rolled raw amount when the roll is critical.
pub const CRITICAL_BONUS: u32 = 5;

/// How a hit interacts with armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Armor absorbs half its current value (rounded down).
    Melee,
    /// Armor absorbs its full current value.
    Projectile,
    /// Ignores armor entirely.
    Special,
}

impl DamageType {
    /// Every damage type, in display order.
    pub const ALL: [DamageType; 3] = [Self::Melee, Self::Projectile, Self::Special];

    /// How much of the raw amount the given armor removes.
    pub fn mitigation(self, armor: u32) -> u32 {
        match self {
            Self::Melee => armor / 2,
            Self::Projectile => armor,
            Self::Special => 0,
        }
    }
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Melee => write!(f, "Melee"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Special => write!(f, "Special"),
        }
    }
}

impl FromStr for DamageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "melee" => Ok(Self::Melee),
            "projectile" => Ok(Self::Projectile),
            "special" => Ok(Self::Special),
            other => Err(format!(
                "unknown damage type '{other}', use: melee, projectile, special"
            )),
        }
    }
}

/// Where the raw amount of an attack comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// A fixed amount.
    Flat(u32),
    /// Sum of this many six-sided dice.
    Dice(u32),
}

impl DamageSource {
    /// Build a source from the two optional command arguments.
    ///
    /// Exactly one of them must be present.
    pub fn from_options(flat: Option<u32>, dice: Option<u32>) -> MechResult<Self> {
        match (flat, dice) {
            (Some(amount), None) => Ok(Self::Flat(amount)),
            (None, Some(count)) => Ok(Self::Dice(count)),
            (Some(_), Some(_)) => Err(MechError::ConflictingDamage),
            (None, None) => Err(MechError::MissingDamage),
        }
    }

    /// Produce the raw amount, rolling dice if needed.
    pub fn roll(self, rng: &mut StdRng) -> RawDamage {
        match self {
            Self::Flat(amount) => RawDamage {
                amount,
                roll: None,
                critical: false,
            },
            Self::Dice(count) => RawDamage::from_roll(DicePool::damage(count).roll(rng)),
        }
    }
}

/// The raw amount of a hit before mitigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDamage {
    /// Amount after any critical bonus.
    pub amount: u32,
    /// The dice behind the amount, if it was rolled.
    pub roll: Option<RollResult>,
    /// Whether the critical bonus was applied.
    pub critical: bool,
}

impl RawDamage {
    /// Turn a roll into a raw amount, applying [`CRITICAL_BONUS`] when critical.
    pub fn from_roll(roll: RollResult) -> Self {
        let critical = roll.is_critical();
        let bonus = if critical { CRITICAL_BONUS } else { 0 };
        Self {
            amount: roll.total() + bonus,
            roll: Some(roll),
            critical,
        }
    }
}

/// How a resolved hit reads at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Some damage went through to HP.
    Dealt,
    /// Armor stopped the hit exactly.
    Blocked,
    /// Armor stopped the hit with room to spare.
    Neglected,
}

/// The result of mitigating one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Raw amount before mitigation.
    pub raw: u32,
    /// Amount removed by armor.
    pub mitigation: u32,
    /// `raw - mitigation`; negative when armor had surplus.
    pub net: i64,
    /// Armor before the hit.
    pub armor_before: u32,
    /// Armor after wear.
    pub armor_after: u32,
}

impl Resolution {
    /// Damage that actually reaches HP.
    pub fn dealt(&self) -> u32 {
        u32::try_from(self.net.max(0)).unwrap_or(u32::MAX)
    }

    /// HP remaining after applying this hit.
    pub fn hp_after(&self, hp: u32) -> u32 {
        hp.saturating_sub(self.dealt())
    }

    /// Classify the hit.
    pub fn outcome(&self) -> HitOutcome {
        match self.net {
            n if n > 0 => HitOutcome::Dealt,
            0 => HitOutcome::Blocked,
            _ => HitOutcome::Neglected,
        }
    }
}

/// Mitigate a raw hit against the current armor.
///
/// Armor wears by one point whenever it is non-zero and the hit was not
/// absorbed with surplus (`net >= 0`). A hit that armor overwhelms leaves the
/// armor untouched.
pub fn resolve(raw: u32, kind: DamageType, armor: u32) -> Resolution {
    let mitigation = kind.mitigation(armor);
    let net = i64::from(raw) - i64::from(mitigation);
    let armor_after = if armor != 0 && net >= 0 {
        armor - 1
    } else {
        armor
    };
    Resolution {
        raw,
        mitigation,
        net,
        armor_before: armor,
        armor_after,
    }
}
