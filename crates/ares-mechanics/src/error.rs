//! Error types for the mechanics layer.

/// Errors that can occur while rolling damage or generating codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MechError {
    /// An attack supplied neither a flat damage value nor a dice count.
    #[error("either a flat damage value or a dice count has to be given")]
    MissingDamage,

    /// An attack supplied both a flat damage value and a dice count.
    #[error("only one of flat damage or dice count can be given at the same time")]
    ConflictingDamage,

    /// A code length outside the supported range was requested.
    #[error("code length must be between {min} and {max}, got {length}")]
    InvalidCodeLength {
        /// Requested length.
        length: usize,
        /// Smallest supported length.
        min: usize,
        /// Largest supported length.
        max: usize,
    },

    /// The generator gave up finding a code distinct from all issued ones.
    #[error("could not generate a unique code after {attempts} attempts")]
    GenerationExhausted {
        /// Number of draws made before giving up.
        attempts: u32,
    },
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
