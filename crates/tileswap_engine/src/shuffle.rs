//! Permutation engine: random, never-solved arrangements.

use crate::contracts::assert_invariants;
use crate::registry::TileRegistry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// Source of uniformly random permutations.
///
/// Chosen once when a session is built; the session never swaps strategies
/// mid-level.
pub trait Shuffler {
    /// Returns a permutation of `0..len`, every ordering equally likely.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// Fisher–Yates shuffle over any `rand` generator.
#[derive(Debug, Clone)]
pub struct FisherYates<R> {
    rng: R,
}

impl<R: Rng> FisherYates<R> {
    /// Wraps a generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl FisherYates<StdRng> {
    /// Deterministic shuffler for a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Shuffler seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Shuffler for FisherYates<R> {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

impl<S: Shuffler + ?Sized> Shuffler for Box<S> {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (**self).permutation(len)
    }
}

/// Assigns a fresh random arrangement to the registry.
///
/// For two or more tiles the identity arrangement is redrawn, so a level
/// never starts solved. Grids of zero or one tile are left untouched.
/// Returns the number of draws taken.
#[instrument(skip_all, fields(tiles = registry.len()))]
pub fn shuffle<S: Shuffler + ?Sized>(registry: &mut TileRegistry, shuffler: &mut S) -> usize {
    let len = registry.len();
    if len <= 1 {
        debug!("Grid too small to shuffle");
        return 0;
    }

    let mut draws = 0;
    let order = loop {
        draws += 1;
        let order = shuffler.permutation(len);
        if !is_identity(&order) {
            break order;
        }
        debug!(draws, "Drew identity arrangement, redrawing");
    };

    // order[p] is the slot for the tile at build position p
    if let Err(e) = registry.arrange(&order) {
        // A Shuffler that returns a non-permutation is a bug in that Shuffler
        tracing::error!(error = %e, "Shuffler produced an invalid arrangement");
        debug_assert!(false, "Shuffler produced an invalid arrangement: {}", e);
        registry.reset_to_identity();
        return draws;
    }
    assert_invariants(registry);
    debug!(draws, "Shuffled");
    draws
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &slot)| i == slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{partition, GridShape};
    use crate::solved::is_solved;

    /// Replays scripted permutations, then falls back to rotation.
    struct Scripted {
        draws: Vec<Vec<usize>>,
    }

    impl Shuffler for Scripted {
        fn permutation(&mut self, len: usize) -> Vec<usize> {
            if self.draws.is_empty() {
                (0..len).map(|i| (i + 1) % len).collect()
            } else {
                self.draws.remove(0)
            }
        }
    }

    fn registry(columns: u32, rows: u32) -> TileRegistry {
        TileRegistry::from_rects(partition(600, 600, GridShape::new(columns, rows)))
    }

    #[test]
    fn test_identity_draw_is_redrawn() {
        let mut reg = registry(2, 1);
        let mut shuffler = Scripted {
            draws: vec![vec![0, 1], vec![0, 1], vec![1, 0]],
        };
        assert_eq!(shuffle(&mut reg, &mut shuffler), 3);
        assert_eq!(reg.current_slots(), vec![1, 0]);
        assert!(!is_solved(&reg));
    }

    #[test]
    fn test_single_tile_untouched() {
        let mut reg = registry(1, 1);
        let mut shuffler = FisherYates::from_seed(7);
        assert_eq!(shuffle(&mut reg, &mut shuffler), 0);
        assert!(is_solved(&reg));
        assert_eq!(reg.revision(), 0);
    }

    #[test]
    fn test_seeded_shuffle_is_deterministic() {
        let mut a = registry(4, 4);
        let mut b = registry(4, 4);
        shuffle(&mut a, &mut FisherYates::from_seed(42));
        shuffle(&mut b, &mut FisherYates::from_seed(42));
        assert_eq!(a.current_slots(), b.current_slots());
    }

    #[test]
    fn test_fisher_yates_returns_permutation() {
        let mut shuffler = FisherYates::from_seed(3);
        let mut order = shuffler.permutation(25);
        order.sort_unstable();
        assert_eq!(order, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_two_tiles_always_swapped() {
        // Only one non-identity arrangement exists for N = 2
        for seed in 0..50 {
            let mut reg = registry(1, 2);
            shuffle(&mut reg, &mut FisherYates::from_seed(seed));
            assert_eq!(reg.current_slots(), vec![1, 0]);
        }
    }

    #[test]
    fn test_orderings_roughly_uniform() {
        // 3 tiles: 5 non-identity orderings, each should show up often
        let mut counts = std::collections::HashMap::new();
        let mut shuffler = FisherYates::from_seed(11);
        for _ in 0..3000 {
            let mut reg = registry(3, 1);
            shuffle(&mut reg, &mut shuffler);
            *counts.entry(reg.current_slots()).or_insert(0usize) += 1;
        }
        assert_eq!(counts.len(), 5);
        assert!(counts.values().all(|&n| n > 450 && n < 750), "{:?}", counts);
    }
}
