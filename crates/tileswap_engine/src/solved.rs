//! Solved-state detection.

use crate::registry::{Tile, TileRegistry};

/// True iff every tile sits in its correct slot.
///
/// Pure and O(N); any caching belongs to the caller.
pub fn is_solved(registry: &TileRegistry) -> bool {
    registry.tiles().iter().all(Tile::is_home)
}

/// Number of tiles already in their correct slot.
pub fn tiles_home(registry: &TileRegistry) -> usize {
    registry.tiles().iter().filter(|tile| tile.is_home()).count()
}

/// Solved flag memoised against the registry revision.
///
/// Any mutation bumps the revision, which invalidates the cached value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolvedCache {
    entry: Option<(u64, bool)>,
}

impl SolvedCache {
    /// Returns the cached flag if it was computed for this revision.
    pub fn get(&self, registry: &TileRegistry) -> Option<bool> {
        match self.entry {
            Some((revision, solved)) if revision == registry.revision() => Some(solved),
            _ => None,
        }
    }

    /// Recomputes the flag if stale and returns it.
    pub fn refresh(&mut self, registry: &TileRegistry) -> bool {
        if let Some(solved) = self.get(registry) {
            return solved;
        }
        let solved = is_solved(registry);
        self.entry = Some((registry.revision(), solved));
        solved
    }

    /// Drops the cached value.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{partition, GridShape};

    #[test]
    fn test_empty_and_single_are_solved() {
        assert!(is_solved(&TileRegistry::from_rects(Vec::new())));
        assert!(is_solved(&TileRegistry::from_rects(partition(
            10,
            10,
            GridShape::new(1, 1)
        ))));
    }

    #[test]
    fn test_swap_unsolves_and_swap_back_solves() {
        let mut reg = TileRegistry::from_rects(partition(90, 90, GridShape::new(3, 3)));
        reg.swap(2, 7).unwrap();
        assert!(!is_solved(&reg));
        assert_eq!(tiles_home(&reg), 7);
        reg.swap(2, 7).unwrap();
        assert!(is_solved(&reg));
    }

    #[test]
    fn test_cache_invalidated_by_swap() {
        let mut reg = TileRegistry::from_rects(partition(90, 90, GridShape::new(3, 1)));
        let mut cache = SolvedCache::default();
        assert!(cache.refresh(&reg));
        assert_eq!(cache.get(&reg), Some(true));

        reg.swap(0, 1).unwrap();
        assert_eq!(cache.get(&reg), None);
        assert!(!cache.refresh(&reg));

        cache.invalidate();
        assert_eq!(cache.get(&reg), None);
    }
}
