pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod input;
pub mod render;
pub mod scores;
pub mod session;
pub mod target;

pub use config::GameConfig;
pub use engine::{Chain, Collision, Step};
pub use error::{ConfigError, PlacementError, StoreError};
pub use grid::OccupancyGrid;
pub use input::Inbox;
pub use scores::{JsonFileStore, Leaderboard, MemoryStore, ScoreRecord, ScoreStore};
pub use session::{EndReason, Frontend, Phase, Session, Tick, TickClock};
pub use target::{AdaptivePlacement, DirectSampling, PlacementStrategy, RejectionSampling};

use serde::{Deserialize, Serialize};

/// Integer coordinate type for grid cells (not pixels)
pub type Coord = i32;

/// Distance the chain travels per tick.
pub const STEP: Coord = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: Coord,
    pub y: Coord,
}

impl Cell {
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one `STEP` towards `dir`.
    #[inline]
    pub fn stepped(self, dir: Direction) -> Self {
        let (dx, dy) = dir.dx_dy();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Velocity of the chain. Always a cardinal unit vector scaled by `STEP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn dx_dy(self) -> (Coord, Coord) {
        match self {
            Self::Up => (0, -STEP),
            Self::Down => (0, STEP),
            Self::Left => (-STEP, 0),
            Self::Right => (STEP, 0),
        }
    }

    /// The axis carrying this velocity's non-zero component.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Self::Up | Self::Down => Axis::Vertical,
            Self::Left | Self::Right => Axis::Horizontal,
        }
    }
}
