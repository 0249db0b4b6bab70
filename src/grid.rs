use crate::{Cell, Coord};

/// Dense occupancy map over the playable interior.
///
/// Cells are linearized as `x * height + y`. The grid does no bounds
/// checking of its own; callers only pass cells inside the board.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    width: Coord,
    height: Coord,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(width: Coord, height: Coord) -> Self {
        let size = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![false; size],
        }
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    #[inline]
    fn idx(&self, c: Cell) -> usize {
        (c.x * self.height + c.y) as usize
    }

    #[inline]
    pub fn occupied(&self, c: Cell) -> bool {
        self.cells[self.idx(c)]
    }

    #[inline]
    pub fn set_occupied(&mut self, c: Cell, on: bool) {
        let i = self.idx(c);
        self.cells[i] = on;
    }

    /// Inverse of the linearization.
    #[inline]
    pub fn cell_at(&self, idx: usize) -> Cell {
        let idx = idx as Coord;
        Cell::new(idx / self.height, idx % self.height)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }

    /// Every unoccupied cell, in linearization order.
    pub fn free_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, on)| !**on)
            .map(|(i, _)| self.cell_at(i))
    }
}
