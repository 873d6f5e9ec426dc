//! Error types for the puzzle engine.

use crate::phases::Phase;

/// Error raised by the tile registry.
///
/// Every producer of slot indices is expected to validate them first, so an
/// `InvalidSlot` reaching the registry is a defect in the caller.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RegistryError {
    /// Slot index outside `[0, len)`.
    #[display("Slot {} is out of range for {} tiles", slot, len)]
    InvalidSlot {
        /// Requested slot.
        slot: usize,
        /// Number of slots in the registry.
        len: usize,
    },

    /// Two parallel inputs disagree on length.
    #[display("Expected {} entries, got {}", expected, actual)]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A slot assignment is not a permutation of `[0, N)`.
    #[display("Not a permutation: {}", _0)]
    NotAPermutation(String),

    /// A postcondition failed after a mutation.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for RegistryError {}

/// Request rejected by the level lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum LifecycleError {
    /// Every level has been completed; nothing more can be loaded.
    #[display("All levels are complete")]
    Terminal,

    /// `advance` requires the current level to be solved.
    #[display("Cannot advance while {}", _0)]
    NotSolved(Phase),

    /// The request needs a playable level (`Ready` or `Solved`).
    #[display("No playable level while {}", _0)]
    NotPlayable(Phase),

    /// No level in the catalog carries this number.
    #[display("No level numbered {}", _0)]
    UnknownLevel(u32),
}

impl std::error::Error for LifecycleError {}

/// Failure to load the level catalog.
///
/// Always recovered by substituting the built-in fallback level.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CatalogError {
    /// The catalog holds no levels.
    #[display("Level catalog is empty")]
    Empty,

    /// The catalog could not be parsed.
    #[display("Failed to parse level catalog: {}", _0)]
    Parse(String),
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
