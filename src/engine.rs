use std::collections::VecDeque;

use crate::grid::OccupancyGrid;
use crate::{Cell, Direction};

/// The player's body, head first.
///
/// Contiguity is a property of how the chain is built (one `STEP` per
/// tick); it is never re-validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    cells: VecDeque<Cell>,
}

impl Chain {
    pub fn new(start: Cell) -> Self {
        Self {
            cells: VecDeque::from([start]),
        }
    }

    /// Build a chain from cells listed head first. Panics on an empty list.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let cells: VecDeque<Cell> = cells.into_iter().collect();
        assert!(!cells.is_empty(), "chain needs at least a head");
        Self { cells }
    }

    pub fn head(&self) -> Cell {
        *self.cells.front().expect("chain is non-empty")
    }

    /// The segment directly behind the head, if any.
    pub fn neck(&self) -> Option<Cell> {
        self.cells.get(1).copied()
    }

    pub fn tail(&self) -> Cell {
        *self.cells.back().expect("chain is non-empty")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn contains(&self, c: Cell) -> bool {
        self.cells.contains(&c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfHit,
}

/// Outcome of advancing the chain by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Plain move. `trail` is the cell the renderer must erase, absent when
    /// the head moved straight into the cell the tail just left.
    Moved { trail: Option<Cell> },
    /// The head landed on the target; the chain is one segment longer.
    Grew,
    Died(Collision),
}

impl Step {
    pub fn died(self) -> bool {
        matches!(self, Step::Died(_))
    }

    pub fn grew(self) -> bool {
        matches!(self, Step::Grew)
    }

    pub fn trail(self) -> Option<Cell> {
        match self {
            Step::Moved { trail } => trail,
            _ => None,
        }
    }
}

#[inline]
fn in_bounds(grid: &OccupancyGrid, c: Cell) -> bool {
    c.x >= 0 && c.x < grid.width() && c.y >= 0 && c.y < grid.height()
}

/// Advance `chain` one cell along `velocity`, keeping `grid` in sync.
///
/// Collisions are evaluated wall first, then self, then target. Self
/// collision is checked after the tail has been popped, so the cell being
/// vacated this tick never counts as body.
pub fn advance(
    chain: &mut Chain,
    velocity: Direction,
    grid: &mut OccupancyGrid,
    target: Cell,
) -> Step {
    let head = chain.head().stepped(velocity);
    chain.cells.push_front(head);

    // Out-of-bounds heads never touch the grid.
    if !in_bounds(grid, head) {
        return Step::Died(Collision::Wall);
    }
    grid.set_occupied(head, true);

    let vacated = chain.cells.pop_back().expect("chain has head and prior head");

    if chain.cells.iter().skip(1).any(|&c| c == head) {
        return Step::Died(Collision::SelfHit);
    }

    if head == target {
        chain.cells.push_back(vacated);
        return Step::Grew;
    }

    if vacated == head {
        return Step::Moved { trail: None };
    }
    grid.set_occupied(vacated, false);
    Step::Moved {
        trail: Some(vacated),
    }
}
