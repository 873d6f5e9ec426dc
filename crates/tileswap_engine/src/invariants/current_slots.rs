//! Current slots form a permutation: no two tiles share a slot, no slot is empty.

use super::{is_permutation, Invariant};
use crate::registry::{Tile, TileRegistry};

/// Invariant: current slots are a permutation of `[0, N)`.
pub struct CurrentSlotsPermutation;

impl Invariant<TileRegistry> for CurrentSlotsPermutation {
    fn holds(registry: &TileRegistry) -> bool {
        is_permutation(registry.tiles().iter().map(Tile::current_slot))
    }

    fn description() -> &'static str {
        "Current slots are a permutation of [0, N)"
    }
}
