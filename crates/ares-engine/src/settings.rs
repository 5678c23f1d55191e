//! Read-only table settings.
//!
//! Settings come from a TOML document (by default `settings.ares`). Unknown
//! keys are ignored and a missing or malformed file falls back to defaults.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Numeric limits and optional display assets shared by all engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Highest HP a target may be given.
    pub max_hp: u32,
    /// Highest armor a target may be given.
    pub max_armor: u32,
    /// Hostile targets with at least this much max HP are shown as bosses.
    pub boss_hp_level: u32,
    /// Highest flat damage or heal amount per command.
    pub max_damage: u32,
    /// Most dice an attack may roll.
    pub max_dice: u32,
    /// Fixed RNG seed; sessions are reproducible when set.
    pub seed: Option<u64>,
    /// Icon shown before the combat name in the status panel.
    pub embed_icon: Option<String>,
    /// Decorations appended to narrations.
    pub emojis: Emojis,
    /// Images attached to finished panels.
    pub images: Images,
    /// Icons shown on panels.
    pub icons: Icons,
}

/// Decorations appended to combat narrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emojis {
    /// Used when a combat starts.
    pub combat_start: Option<String>,
    /// Used when an attack deals damage without taking the target down.
    pub attack: Option<String>,
    /// Used when an attack takes a target down.
    pub kill: Option<String>,
}

/// Images attached to terminal panels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    /// Shown when a terminal is breached.
    pub terminal_success: Option<String>,
    /// Shown when a terminal locks down.
    pub terminal_failure: Option<String>,
}

/// Icons shown in panel headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Icons {
    /// Shown next to the duel header.
    pub duel_embed: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_hp: 100,
            max_armor: 20,
            boss_hp_level: 100,
            max_damage: 100,
            max_dice: 10,
            seed: None,
            embed_icon: None,
            emojis: Emojis::default(),
            images: Images::default(),
            icons: Icons::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load settings from a file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
                return Self::default();
            }
        };
        match Self::from_toml(&text) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "settings loaded");
                settings
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not parse settings, using defaults");
                Self::default()
            }
        }
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the boss HP threshold.
    pub fn with_boss_hp_level(mut self, level: u32) -> Self {
        self.boss_hp_level = level;
        self
    }

    /// Build an RNG for one engine.
    ///
    /// With a seed, each `stream` gets its own reproducible sequence;
    /// without one, the RNG is seeded from the OS.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_os_rng(),
        }
    }
}
