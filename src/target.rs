use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::error::PlacementError;
use crate::grid::OccupancyGrid;
use crate::Cell;

pub trait PlacementStrategy {
    /// Pick a cell the chain does not occupy, uniformly among free cells.
    fn place(&self, grid: &OccupancyGrid, rng: &mut dyn RngCore) -> Result<Cell, PlacementError>;
}

fn board_full(grid: &OccupancyGrid) -> PlacementError {
    PlacementError::BoardFull {
        width: grid.width(),
        height: grid.height(),
    }
}

/// Draw random cells until one is free, giving up after `max_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct RejectionSampling {
    pub max_attempts: usize,
}

impl PlacementStrategy for RejectionSampling {
    fn place(&self, grid: &OccupancyGrid, rng: &mut dyn RngCore) -> Result<Cell, PlacementError> {
        if grid.is_empty() {
            return Err(board_full(grid));
        }
        for _ in 0..self.max_attempts {
            let c = Cell::new(
                rng.random_range(0..grid.width()),
                rng.random_range(0..grid.height()),
            );
            if !grid.occupied(c) {
                return Ok(c);
            }
        }
        Err(board_full(grid))
    }
}

/// Collect every free cell, then choose one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSampling;

impl PlacementStrategy for DirectSampling {
    fn place(&self, grid: &OccupancyGrid, rng: &mut dyn RngCore) -> Result<Cell, PlacementError> {
        let free: Vec<Cell> = grid.free_cells().collect();
        free.choose(rng).copied().ok_or_else(|| board_full(grid))
    }
}

/// Rejection sampling below `threshold`, direct sampling at or above it.
///
/// Rejection sampling degrades as the chain fills the board; the full
/// scan of direct sampling is bounded regardless of density.
///
/// An exhausted rejection sampler hands over to direct sampling, so the
/// only failure left is a board with no free cell at all.
#[derive(Debug, Clone, Copy)]
pub struct AdaptivePlacement {
    pub threshold: u32,
    pub sparse: RejectionSampling,
    pub dense: DirectSampling,
}

impl AdaptivePlacement {
    pub fn new(threshold: u32, max_attempts: usize) -> Self {
        Self {
            threshold,
            sparse: RejectionSampling { max_attempts },
            dense: DirectSampling,
        }
    }

    pub fn strategy_for(&self, score: u32) -> &dyn PlacementStrategy {
        if score < self.threshold {
            &self.sparse
        } else {
            &self.dense
        }
    }

    pub fn place(
        &self,
        score: u32,
        grid: &OccupancyGrid,
        rng: &mut dyn RngCore,
    ) -> Result<Cell, PlacementError> {
        match self.strategy_for(score).place(grid, rng) {
            Ok(c) => Ok(c),
            Err(_) if score < self.threshold => {
                debug!(score, "rejection sampling exhausted, scanning board");
                self.dense.place(grid, rng)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    /// A board with a random scatter of occupied cells covering `fill` of it.
    fn scattered(w: i32, h: i32, fill: f64, rng: &mut ChaCha8Rng) -> OccupancyGrid {
        let mut g = OccupancyGrid::new(w, h);
        for x in 0..w {
            for y in 0..h {
                if rng.random_bool(fill) {
                    g.set_occupied(Cell::new(x, y), true);
                }
            }
        }
        g
    }

    fn never_lands_on_chain(strategy: &dyn PlacementStrategy, fill: f64) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let g = scattered(12, 9, fill, &mut rng);
            if g.free_cells().next().is_none() {
                continue;
            }
            let c = strategy.place(&g, &mut rng).unwrap();
            assert!(c.x >= 0 && c.x < 12 && c.y >= 0 && c.y < 9);
            assert!(!g.occupied(c), "placed on occupied cell {c:?}");
        }
    }

    #[test]
    fn rejection_sampling_avoids_chain() {
        never_lands_on_chain(&RejectionSampling { max_attempts: 100_000 }, 0.3);
    }

    #[test]
    fn direct_sampling_avoids_chain() {
        never_lands_on_chain(&DirectSampling, 0.9);
    }

    #[test]
    fn direct_sampling_finds_the_last_free_cell() {
        let mut g = OccupancyGrid::new(3, 3);
        for x in 0..3 {
            for y in 0..3 {
                g.set_occupied(Cell::new(x, y), true);
            }
        }
        g.set_occupied(Cell::new(2, 2), false);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(DirectSampling.place(&g, &mut rng), Ok(Cell::new(2, 2)));
    }

    #[test]
    fn direct_sampling_reaches_every_free_cell() {
        let mut g = OccupancyGrid::new(3, 2);
        g.set_occupied(Cell::new(0, 0), true);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let seen: HashSet<Cell> = (0..500)
            .map(|_| DirectSampling.place(&g, &mut rng).unwrap())
            .collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn full_board_is_an_error_not_a_hang() {
        let mut g = OccupancyGrid::new(2, 2);
        for c in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            g.set_occupied(Cell::new(c.0, c.1), true);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let full = Err(PlacementError::BoardFull { width: 2, height: 2 });
        assert_eq!(DirectSampling.place(&g, &mut rng), full);
        assert_eq!(RejectionSampling { max_attempts: 50 }.place(&g, &mut rng), full);
        assert_eq!(AdaptivePlacement::new(10, 50).place(0, &g, &mut rng), full);
    }

    #[test]
    fn adaptive_falls_back_when_sampling_runs_dry() {
        let mut g = OccupancyGrid::new(4, 4);
        for x in 0..4 {
            for y in 0..4 {
                g.set_occupied(Cell::new(x, y), true);
            }
        }
        g.set_occupied(Cell::new(1, 3), false);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // Zero attempts: rejection sampling always fails, direct must answer.
        let placer = AdaptivePlacement::new(100, 0);
        assert_eq!(placer.place(5, &g, &mut rng), Ok(Cell::new(1, 3)));
    }

    #[test]
    fn strategy_switches_at_threshold() {
        let mut g = OccupancyGrid::new(2, 2);
        g.set_occupied(Cell::new(0, 0), true);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // With no attempts allowed only the direct sampler can succeed.
        let placer = AdaptivePlacement::new(670, 0);
        assert!(placer.strategy_for(669).place(&g, &mut rng).is_err());
        assert!(placer.strategy_for(670).place(&g, &mut rng).is_ok());
    }
}
