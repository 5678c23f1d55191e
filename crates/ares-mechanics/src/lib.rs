//! Table mechanics for the Ares encounter aid.
//!
//! Provides six-sided damage dice with critical detection, layered
//! damage/armor mitigation, and the hexadecimal code generator used by the
//! terminal mini-game. Nothing here owns session state; the engines in
//! `ares-engine` call into these pure helpers.

pub mod code;
pub mod damage;
pub mod dice;
pub mod error;

pub use code::CodeGenerator;
pub use damage::{DamageSource, DamageType, HitOutcome, RawDamage, Resolution, resolve};
pub use dice::{DicePool, Die, RollResult};
pub use error::{MechError, MechResult};
