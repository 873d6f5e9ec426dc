//! Tile records and the slot → tile index.

use crate::contracts::{Contract, Swap, SwapContract};
use crate::error::RegistryError;
use crate::geometry::SourceRect;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One piece of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub(crate) source_rect: SourceRect,
    pub(crate) correct_slot: usize,
    pub(crate) current_slot: usize,
}

impl Tile {
    /// Region of the source image this tile shows.
    pub fn source_rect(&self) -> SourceRect {
        self.source_rect
    }

    /// Slot this tile occupies when the puzzle is solved.
    pub fn correct_slot(&self) -> usize {
        self.correct_slot
    }

    /// Slot this tile is currently displayed at.
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Whether the tile sits in its correct slot.
    pub fn is_home(&self) -> bool {
        self.current_slot == self.correct_slot
    }
}

/// Ordered tiles of one level plus an O(1) slot lookup.
///
/// `slot_index[s]` is the position in `tiles` of the tile currently at slot
/// `s`. Every mutation keeps both views in step and bumps `revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRegistry {
    pub(crate) tiles: Vec<Tile>,
    pub(crate) slot_index: Vec<usize>,
    revision: u64,
}

impl TileRegistry {
    /// Builds a registry in the identity arrangement.
    ///
    /// `correct_slots[i]` is the correct slot of the tile cut from `rects[i]`;
    /// the list must be a permutation of `[0, N)`.
    #[instrument(skip_all, fields(tiles = rects.len()))]
    pub fn build(rects: Vec<SourceRect>, correct_slots: &[usize]) -> Result<Self, RegistryError> {
        if rects.len() != correct_slots.len() {
            return Err(RegistryError::LengthMismatch {
                expected: rects.len(),
                actual: correct_slots.len(),
            });
        }
        check_permutation(correct_slots)?;

        let tiles: Vec<Tile> = rects
            .into_iter()
            .zip(correct_slots.iter().copied())
            .map(|(source_rect, slot)| Tile {
                source_rect,
                correct_slot: slot,
                current_slot: slot,
            })
            .collect();

        let mut registry = Self {
            slot_index: vec![0; tiles.len()],
            tiles,
            revision: 0,
        };
        registry.reindex();
        debug!(tiles = registry.len(), "Registry built");
        Ok(registry)
    }

    /// Builds a registry where the tile cut from `rects[i]` belongs at slot `i`.
    pub fn from_rects(rects: Vec<SourceRect>) -> Self {
        let len = rects.len();
        let tiles = rects
            .into_iter()
            .enumerate()
            .map(|(slot, source_rect)| Tile {
                source_rect,
                correct_slot: slot,
                current_slot: slot,
            })
            .collect();
        Self {
            tiles,
            slot_index: (0..len).collect(),
            revision: 0,
        }
    }

    /// Number of tiles (and slots).
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True for an empty grid.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All tiles, in build order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Counter bumped on every change to the arrangement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Tile currently displayed at `slot`.
    pub fn tile_at(&self, slot: usize) -> Option<&Tile> {
        self.slot_index.get(slot).map(|&tile| &self.tiles[tile])
    }

    /// Current slot of every tile, in build order.
    pub fn current_slots(&self) -> Vec<usize> {
        self.tiles.iter().map(Tile::current_slot).collect()
    }

    /// Exchanges the tiles displayed at slots `a` and `b`.
    #[instrument(skip(self), fields(tiles = self.len()))]
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), RegistryError> {
        let action = Swap::new(a, b);
        SwapContract::pre(self, &action)?;

        #[cfg(any(debug_assertions, feature = "strict-contracts"))]
        let before = self.clone();

        let tile_a = self.slot_index[a];
        let tile_b = self.slot_index[b];
        self.tiles[tile_a].current_slot = b;
        self.tiles[tile_b].current_slot = a;
        self.slot_index.swap(a, b);
        self.revision += 1;

        #[cfg(any(debug_assertions, feature = "strict-contracts"))]
        SwapContract::post(&before, self)?;

        debug!(a, b, revision = self.revision, "Swapped slots");
        Ok(())
    }

    /// Places tile `i` at slot `order[i]` for every tile.
    #[instrument(skip_all, fields(tiles = self.len()))]
    pub fn arrange(&mut self, order: &[usize]) -> Result<(), RegistryError> {
        if order.len() != self.len() {
            return Err(RegistryError::LengthMismatch {
                expected: self.len(),
                actual: order.len(),
            });
        }
        check_permutation(order)?;

        for (tile, &slot) in self.tiles.iter_mut().zip(order) {
            tile.current_slot = slot;
        }
        self.reindex();
        self.revision += 1;
        Ok(())
    }

    /// Moves every tile back to its correct slot.
    #[instrument(skip(self), fields(tiles = self.len()))]
    pub fn reset_to_identity(&mut self) {
        for tile in &mut self.tiles {
            tile.current_slot = tile.correct_slot;
        }
        self.reindex();
        self.revision += 1;
    }

    fn reindex(&mut self) {
        for (position, tile) in self.tiles.iter().enumerate() {
            self.slot_index[tile.current_slot] = position;
        }
    }
}

/// Checks that `slots` holds every value of `[0, len)` exactly once.
fn check_permutation(slots: &[usize]) -> Result<(), RegistryError> {
    let mut seen = vec![false; slots.len()];
    for &slot in slots {
        match seen.get_mut(slot) {
            Some(flag) if !*flag => *flag = true,
            Some(_) => {
                return Err(RegistryError::NotAPermutation(format!(
                    "slot {} appears more than once",
                    slot
                )));
            }
            None => {
                return Err(RegistryError::NotAPermutation(format!(
                    "slot {} is out of range for {} tiles",
                    slot,
                    slots.len()
                )));
            }
        }
    }
    Ok(())
}
