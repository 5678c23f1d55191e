//! Error types for the session engines.

use ares_mechanics::MechError;
use thiserror::Error;

use crate::actor::UserId;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Broad category of an [`EngineError`], used by the dispatcher to decide
/// how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument is missing or arguments contradict each other.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// The operation is not legal in the current state.
    StateConflict,
    /// The caller is not the actor this entity is bound to.
    Authorization,
    /// Something the caller cannot fix (generation exhausted, I/O).
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not found"),
            Self::StateConflict => write!(f, "state conflict"),
            Self::Authorization => write!(f, "authorization"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Errors that can occur while handling a table command.
///
/// Every failing operation leaves engine state unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Dice, damage, or code generation failed.
    #[error(transparent)]
    Mechanics(#[from] MechError),

    /// An edit named no field to change.
    #[error("either target_health, target_armor, target_hidden or target_friendly has to be specified")]
    NoFieldsGiven,

    /// A numeric argument fell outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Argument name.
        field: &'static str,
        /// Given value.
        value: i64,
        /// Smallest allowed value.
        min: i64,
        /// Largest allowed value.
        max: i64,
    },

    /// A hack picked an answer slot that does not exist.
    #[error("answer must be between 0 and {max}, got {index}")]
    AnswerOutOfRange {
        /// Requested slot.
        index: usize,
        /// Highest valid slot.
        max: usize,
    },

    /// No target with this name is in the roster.
    #[error("target {0} not found")]
    UnknownTarget(String),

    /// A removal named a target that is not in the roster.
    #[error("target {0} not found")]
    NotFound(String),

    /// Status was requested for an empty roster.
    #[error("there are no targets")]
    EmptyRoster,

    /// No terminal with this name is active.
    #[error("terminal {0} not found")]
    UnknownTerminal(String),

    /// No duel against this opponent is active.
    #[error("duel with {0} not found")]
    UnknownDuel(String),

    /// A target with this name already exists.
    #[error("target {0} already exists")]
    DuplicateTarget(String),

    /// A terminal with this name already exists.
    #[error("terminal {0} already exists")]
    DuplicateName(String),

    /// The opponent is already in an active duel.
    #[error("{0} already partakes in a duel")]
    OpponentBusy(String),

    /// Attacks and heals need a started combat.
    #[error("you can't partake in a combat that did not start")]
    NotStarted,

    /// The combat was already started.
    #[error("combat already started")]
    AlreadyStarted,

    /// The target is at 0 HP and cannot be attacked.
    #[error("target {0} is already down")]
    TargetDown(String),

    /// Reveal is not allowed on the last attempt.
    #[error("you can't reveal new characters on the last attempt")]
    CannotReveal,

    /// Every character of the sequence is already visible.
    #[error("there are no hidden characters left to reveal")]
    NothingToReveal,

    /// The terminal is bound to a different hacker.
    #[error("expecting {expected}, and you are not them")]
    WrongHacker {
        /// The assigned hacker.
        expected: UserId,
    },

    /// Only the challenger may roll in a duel.
    #[error("this duel is between {opponent} and {challenger}, not you")]
    WrongPlayer {
        /// The duel's opponent label.
        opponent: String,
        /// The challenger bound to the duel.
        challenger: UserId,
    },

    /// Reading or writing a snapshot failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The roster could not be encoded.
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] toml::ser::Error),
}

impl EngineError {
    /// The broad category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Mechanics(MechError::GenerationExhausted { .. }) => ErrorKind::Internal,
            Self::Mechanics(_) => ErrorKind::Validation,
            Self::NoFieldsGiven | Self::OutOfRange { .. } | Self::AnswerOutOfRange { .. } => {
                ErrorKind::Validation
            }
            Self::UnknownTarget(_)
            | Self::NotFound(_)
            | Self::EmptyRoster
            | Self::UnknownTerminal(_)
            | Self::UnknownDuel(_) => ErrorKind::NotFound,
            Self::DuplicateTarget(_)
            | Self::DuplicateName(_)
            | Self::OpponentBusy(_)
            | Self::NotStarted
            | Self::AlreadyStarted
            | Self::TargetDown(_)
            | Self::CannotReveal
            | Self::NothingToReveal => ErrorKind::StateConflict,
            Self::WrongHacker { .. } | Self::WrongPlayer { .. } => ErrorKind::Authorization,
            Self::Io(_) | Self::Encode(_) => ErrorKind::Internal,
        }
    }
}

/// Check that `value` lies in `min..=max`.
pub(crate) fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> EngineResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
