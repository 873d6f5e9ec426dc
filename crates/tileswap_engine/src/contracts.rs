//! Contract-based validation for registry mutations.
//!
//! Contracts pair a precondition on the state and action with a
//! postcondition relating the state before and after: {P} action {Q}.

use crate::error::RegistryError;
use crate::invariants::{InvariantSet, RegistryInvariants};
use crate::registry::TileRegistry;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), RegistryError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), RegistryError>;
}

// ─────────────────────────────────────────────────────────────
//  Swap Action
// ─────────────────────────────────────────────────────────────

/// Request to exchange the tiles displayed at two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct Swap {
    /// First slot.
    pub first: usize,
    /// Second slot.
    pub second: usize,
}

impl std::fmt::Display for Swap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.first, self.second)
    }
}

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the slot exists in the registry.
pub struct SlotInRange;

impl SlotInRange {
    /// Fails with `InvalidSlot` when `slot` is outside `[0, N)`.
    pub fn check(slot: usize, registry: &TileRegistry) -> Result<(), RegistryError> {
        if slot < registry.len() {
            Ok(())
        } else {
            warn!(slot, len = registry.len(), "Slot out of range");
            Err(RegistryError::InvalidSlot {
                slot,
                len: registry.len(),
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Swap Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for swap actions.
///
/// Preconditions:
/// - Both slots are in range
///
/// Postconditions:
/// - Current and correct slots are still permutations
/// - The slot index still matches the tiles
/// - Exactly one revision was consumed
pub struct SwapContract;

impl Contract<TileRegistry, Swap> for SwapContract {
    fn pre(registry: &TileRegistry, action: &Swap) -> Result<(), RegistryError> {
        SlotInRange::check(action.first, registry)?;
        SlotInRange::check(action.second, registry)
    }

    fn post(before: &TileRegistry, after: &TileRegistry) -> Result<(), RegistryError> {
        RegistryInvariants::check_all(after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            RegistryError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })?;

        if after.revision() != before.revision() + 1 {
            return Err(RegistryError::InvariantViolation(format!(
                "Postcondition failed: revision moved from {} to {}",
                before.revision(),
                after.revision()
            )));
        }
        Ok(())
    }
}

/// Asserts that all registry invariants hold (debug builds only).
#[instrument(skip(registry), fields(tiles = registry.len()))]
pub fn assert_invariants(registry: &TileRegistry) {
    debug_assert!(
        RegistryInvariants::check_all(registry).is_ok(),
        "Registry invariants violated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{partition, GridShape};

    fn registry() -> TileRegistry {
        TileRegistry::from_rects(partition(200, 200, GridShape::new(2, 2)))
    }

    #[test]
    fn test_precondition_in_range() {
        assert!(SwapContract::pre(&registry(), &Swap::new(0, 3)).is_ok());
    }

    #[test]
    fn test_precondition_out_of_range() {
        assert!(matches!(
            SwapContract::pre(&registry(), &Swap::new(4, 0)),
            Err(RegistryError::InvalidSlot { slot: 4, len: 4 })
        ));
    }

    #[test]
    fn test_postcondition_holds_after_swap() {
        let before = registry();
        let mut after = before.clone();
        after.swap(1, 2).unwrap();
        assert!(SwapContract::post(&before, &after).is_ok());
    }

    #[test]
    fn test_postcondition_detects_corruption() {
        let before = registry();
        let mut after = before.clone();
        after.swap(1, 2).unwrap();
        after.tiles[0].current_slot = 1;
        assert!(matches!(
            SwapContract::post(&before, &after),
            Err(RegistryError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_postcondition_requires_one_revision() {
        let before = registry();
        assert!(SwapContract::post(&before, &before).is_err());
    }
}
