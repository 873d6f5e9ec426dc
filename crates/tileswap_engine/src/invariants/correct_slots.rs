//! Correct slots form a permutation and never change during play.

use super::{is_permutation, Invariant};
use crate::registry::{Tile, TileRegistry};

/// Invariant: correct slots are a permutation of `[0, N)`.
pub struct CorrectSlotsPermutation;

impl Invariant<TileRegistry> for CorrectSlotsPermutation {
    fn holds(registry: &TileRegistry) -> bool {
        is_permutation(registry.tiles().iter().map(Tile::correct_slot))
    }

    fn description() -> &'static str {
        "Correct slots are a permutation of [0, N)"
    }
}
