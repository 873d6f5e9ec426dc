//! Lifecycle phases and the events a session reports.

use crate::geometry::SourceRect;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a puzzle session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Phase {
    /// Waiting for an image; taps are discarded.
    Loading,
    /// Playable.
    Ready,
    /// Current level solved; taps are discarded until advance or reshuffle.
    Solved,
    /// No levels left. Terminal.
    AllLevelsComplete,
}

impl Phase {
    /// Whether a level is on screen (`Ready` or `Solved`).
    pub fn has_level(&self) -> bool {
        matches!(self, Phase::Ready | Phase::Solved)
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::AllLevelsComplete)
    }
}

/// Notification for the surrounding UI, drained with
/// `PuzzleSession::drain_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A level load started.
    LevelLoading {
        /// Catalog index.
        level_index: usize,
        /// Load generation.
        generation: u64,
    },
    /// The level is built and playable.
    LevelReady {
        /// Catalog index.
        level_index: usize,
        /// Whether the placeholder raster is in use.
        placeholder: bool,
    },
    /// Image acquisition failed; the placeholder is shown instead.
    AcquisitionFailed {
        /// Catalog index.
        level_index: usize,
        /// Failure description.
        message: String,
    },
    /// The level was solved. Fired once per level instance.
    LevelComplete {
        /// Catalog index.
        level_index: usize,
    },
    /// Advance was requested past the last level.
    AllLevelsComplete,
}

/// What a tap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TapOutcome {
    /// Dropped: no playable level (loading, solved or finished).
    Discarded,
    /// Dropped: slot or pointer outside the grid.
    OutOfRange,
    /// Slot selected.
    Selected(usize),
    /// Selection cleared.
    Deselected(usize),
    /// Two slots swapped; not solved yet.
    Swapped(usize, usize),
    /// Two slots swapped and the level is now solved.
    Completed(usize, usize),
}

/// Everything a renderer needs to draw one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    /// Display slot.
    pub slot: usize,
    /// Source region to draw there.
    pub source_rect: SourceRect,
    /// Correct slot of the tile shown.
    pub correct_slot: usize,
    /// Whether the slot is the current selection.
    pub selected: bool,
}

impl CellView {
    /// Whether the tile shown here is in its correct slot.
    pub fn is_home(&self) -> bool {
        self.slot == self.correct_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_only_ready_and_solved_have_level() {
        let with_level: Vec<Phase> = Phase::iter().filter(Phase::has_level).collect();
        assert_eq!(with_level, vec![Phase::Ready, Phase::Solved]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::AllLevelsComplete.to_string(), "AllLevelsComplete");
        assert!(Phase::AllLevelsComplete.is_terminal());
        assert!(!Phase::Solved.is_terminal());
    }
}
