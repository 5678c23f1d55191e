//! Session engines for the Ares encounter aid.
//!
//! Three independent keyed registries back the table commands: a combat
//! encounter roster with damage/heal resolution and a live status panel, a
//! code-breaking terminal mini-game, and a tug-of-war duel. Each engine
//! renders panels through a [`Responder`] and broadcasts its entity names
//! through a [`ChangeFeed`] whenever the set of names changes.

pub mod actor;
pub mod combat;
pub mod duel;
pub mod error;
pub mod feed;
pub mod markup;
pub mod panel;
pub mod settings;
pub mod store;
pub mod terminal;

pub use actor::{Actor, UserId};
pub use combat::{Attack, CombatEncounter, Heal, NewTarget, Target, TargetEdit};
pub use duel::{Duel, DuelArena, RoundReport};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use feed::{ChangeFeed, ChoiceReceiver};
pub use markup::{Color, Markup, Weight};
pub use panel::{MessageHandle, Panel, PanelField, RecordingResponder, Responder};
pub use settings::Settings;
pub use store::{FileStore, MemoryStore, SnapshotStore};
pub use terminal::{Answer, AnswerKind, HackReport, PuzzleParams, TerminalDeck, TerminalPuzzle};
