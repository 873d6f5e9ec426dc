//! Click-driven selection state machine.
//!
//! Turns a stream of `tap(slot)` events into select, deselect and swap
//! transitions. It never touches the registry itself; the session applies
//! the swaps it asks for.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    NoSelection,
    /// One slot awaits a second tap.
    Selected(usize),
}

impl Selection {
    /// Selected slot, if any.
    pub fn slot(&self) -> Option<usize> {
        match self {
            Selection::NoSelection => None,
            Selection::Selected(slot) => Some(*slot),
        }
    }
}

/// Effect of one accepted tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// First tap: the slot is now selected.
    Select(usize),
    /// Same slot tapped twice: selection cleared.
    Deselect(usize),
    /// Two distinct slots tapped: swap them.
    Swap(usize, usize),
}

/// Selection state plus the bounds and freeze flag it is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMachine {
    selection: Selection,
    slot_count: usize,
    frozen: bool,
}

impl SelectionMachine {
    /// Creates a machine for a grid of `slot_count` slots.
    pub fn new(slot_count: usize) -> Self {
        Self {
            selection: Selection::NoSelection,
            slot_count,
            frozen: false,
        }
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Whether taps are currently ignored.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Feeds one tap.
    ///
    /// Returns `None` for out-of-range slots and while frozen; neither is an
    /// error since pointer rounding can produce edge indices.
    #[instrument(skip(self), fields(selection = ?self.selection))]
    pub fn tap(&mut self, slot: usize) -> Option<Transition> {
        if self.frozen {
            debug!("Tap ignored: frozen");
            return None;
        }
        if slot >= self.slot_count {
            debug!(slot_count = self.slot_count, "Tap ignored: out of range");
            return None;
        }

        let (next, transition) = match self.selection {
            Selection::NoSelection => (Selection::Selected(slot), Transition::Select(slot)),
            Selection::Selected(held) if held == slot => {
                (Selection::NoSelection, Transition::Deselect(slot))
            }
            Selection::Selected(held) => (Selection::NoSelection, Transition::Swap(held, slot)),
        };
        self.selection = next;
        Some(transition)
    }

    /// Stops accepting taps and clears the selection.
    pub fn freeze(&mut self) {
        self.selection = Selection::NoSelection;
        self.frozen = true;
    }

    /// Clears the selection and accepts taps again.
    pub fn reset(&mut self) {
        self.selection = Selection::NoSelection;
        self.frozen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tap_selects() {
        let mut machine = SelectionMachine::new(9);
        assert_eq!(machine.tap(4), Some(Transition::Select(4)));
        assert_eq!(machine.selection(), Selection::Selected(4));
    }

    #[test]
    fn test_same_slot_twice_deselects() {
        for slot in 0..9 {
            let mut machine = SelectionMachine::new(9);
            machine.tap(slot);
            assert_eq!(machine.tap(slot), Some(Transition::Deselect(slot)));
            assert_eq!(machine.selection(), Selection::NoSelection);
        }
    }

    #[test]
    fn test_distinct_slots_swap() {
        let mut machine = SelectionMachine::new(9);
        machine.tap(2);
        assert_eq!(machine.tap(6), Some(Transition::Swap(2, 6)));
        assert_eq!(machine.selection(), Selection::NoSelection);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut machine = SelectionMachine::new(4);
        machine.tap(1);
        assert_eq!(machine.tap(4), None);
        assert_eq!(machine.selection(), Selection::Selected(1));
    }

    #[test]
    fn test_frozen_ignores_taps() {
        let mut machine = SelectionMachine::new(4);
        machine.tap(1);
        machine.freeze();
        assert_eq!(machine.selection(), Selection::NoSelection);
        assert_eq!(machine.tap(2), None);

        machine.reset();
        assert_eq!(machine.tap(2), Some(Transition::Select(2)));
    }
}
