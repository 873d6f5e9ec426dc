//! The slot → tile index agrees with every tile's current slot.

use super::Invariant;
use crate::registry::TileRegistry;

/// Invariant: `tile_at(t.current_slot)` is `t` for every tile `t`.
pub struct SlotIndexConsistent;

impl Invariant<TileRegistry> for SlotIndexConsistent {
    fn holds(registry: &TileRegistry) -> bool {
        if registry.slot_index.len() != registry.tiles.len() {
            return false;
        }
        registry
            .tiles
            .iter()
            .enumerate()
            .all(|(position, tile)| registry.slot_index.get(tile.current_slot) == Some(&position))
    }

    fn description() -> &'static str {
        "Slot index matches every tile's current slot"
    }
}
