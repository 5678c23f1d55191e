//! Combatants tracked in an encounter.

use ares_mechanics::Resolution;
use serde::{Deserialize, Serialize};

use crate::markup::Color;
use crate::settings::Settings;

/// Placeholder shown instead of hidden numbers.
pub const HIDDEN_STAT: &str = "???";

/// One combatant.
///
/// `current_hp <= max_hp` and `current_armor <= max_armor` hold after every
/// mutation made through [`CombatEncounter`](super::CombatEncounter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Remaining HP.
    pub current_hp: u32,
    /// HP cap.
    pub max_hp: u32,
    /// Remaining armor.
    #[serde(default)]
    pub current_armor: u32,
    /// Armor cap.
    #[serde(default)]
    pub max_armor: u32,
    /// Whether numbers are concealed from players.
    #[serde(default)]
    pub is_hidden: bool,
    /// Whether the target fights on the players' side.
    #[serde(default)]
    pub is_friendly: bool,
}

/// How a living target is colored in the status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCategory {
    /// On the players' side.
    Friendly,
    /// A hostile at or above the boss HP threshold.
    Boss,
    /// Any other hostile.
    Hostile,
}

impl TargetCategory {
    /// Panel color for a living target of this category.
    pub fn color(self) -> Color {
        match self {
            Self::Friendly => Color::Blue,
            Self::Boss => Color::Pink,
            Self::Hostile => Color::Green,
        }
    }
}

impl Target {
    /// A target at full HP and armor.
    pub fn new(max_hp: u32, max_armor: u32) -> Self {
        Self {
            current_hp: max_hp,
            max_hp,
            current_armor: max_armor,
            max_armor,
            is_hidden: false,
            is_friendly: false,
        }
    }

    /// Whether the target is at 0 HP.
    pub fn is_down(&self) -> bool {
        self.current_hp == 0
    }

    /// Apply a mitigated hit.
    pub fn take_hit(&mut self, resolution: &Resolution) {
        self.current_hp = resolution.hp_after(self.current_hp);
        self.current_armor = resolution.armor_after.min(self.max_armor);
    }

    /// Restore up to `amount` HP, returning how much was actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp.saturating_sub(self.current_hp));
        self.current_hp += healed;
        healed
    }

    /// Color category, given the table settings.
    pub fn category(&self, settings: &Settings) -> TargetCategory {
        if self.is_friendly {
            TargetCategory::Friendly
        } else if self.max_hp >= settings.boss_hp_level {
            TargetCategory::Boss
        } else {
            TargetCategory::Hostile
        }
    }

    /// `hp[cur/max]`, concealed when hidden.
    pub fn hp_text(&self) -> String {
        if self.is_hidden {
            format!("hp[{HIDDEN_STAT}/{HIDDEN_STAT}]")
        } else {
            format!("hp[{}/{}]", self.current_hp, self.max_hp)
        }
    }

    /// `ap[cur/max]`, concealed when hidden.
    pub fn ap_text(&self) -> String {
        if self.is_hidden {
            format!("ap[{HIDDEN_STAT}/{HIDDEN_STAT}]")
        } else {
            format!("ap[{}/{}]", self.current_armor, self.max_armor)
        }
    }

    /// One-line description used in moderator confirmations.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "hp[{}/{}] ap[{}/{}]",
            self.current_hp, self.max_hp, self.current_armor, self.max_armor
        );
        if self.is_hidden {
            out.push_str(" hidden");
        }
        if self.is_friendly {
            out.push_str(" friendly");
        }
        out
    }
}

/// Zero-pad a stat to three digits.
pub fn stat(value: u32) -> String {
    format!("{value:03}")
}
