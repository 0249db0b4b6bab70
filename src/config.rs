use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{Cell, Coord, Direction};

/// Colour as an RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const PALE: Rgb = Rgb(0xe0, 0xe0, 0xe0);
}

/// Screen footprint of one board cell (terminal columns x rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub cols: u16,
    pub rows: u16,
}

/// Largest board accepted, in cells.
pub const MAX_CELLS: i64 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: Coord,
    pub height: Coord,
    /// Cell the single-segment chain starts on
    pub start: Cell,
    pub start_direction: Direction,
    /// Ticks per second at score 0
    pub initial_fps: f64,
    /// Added to the tick rate on every growth event
    pub fps_increment: f64,
    /// Scores below this place targets by rejection sampling, at or above by direct sampling
    pub dense_threshold: u32,
    /// Draws rejection sampling may take before handing over to direct sampling
    pub max_rejection_attempts: usize,
    pub cell_size: CellSize,
    pub chain_color: Rgb,
    pub target_color: Rgb,
    pub restart_delay_ms: u64,
    /// Key the high-score list is stored under
    pub score_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        let width = 50;
        let height = 25;
        Self {
            width,
            height,
            start: Cell::new(1, 12),
            start_direction: Direction::Right,
            initial_fps: 4.0,
            fps_increment: 0.5,
            dense_threshold: 670,
            max_rejection_attempts: (width * height * 2) as usize,
            cell_size: CellSize { cols: 2, rows: 1 },
            chain_color: Rgb::PALE,
            target_color: Rgb::RED,
            restart_delay_ms: 1000,
            score_key: "snakeScore".to_owned(),
        }
    }
}

impl GameConfig {
    /// Default configuration on a custom board size.
    pub fn new(width: Coord, height: Coord) -> Self {
        Self {
            width,
            height,
            start: Cell::new(1.min(width.saturating_sub(1)), height / 2),
            max_rejection_attempts: (width.max(1) as usize)
                .saturating_mul(height.max(1) as usize)
                .saturating_mul(2),
            ..Default::default()
        }
    }

    /// Read a JSON config file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "board must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let cells = i64::from(self.width) * i64::from(self.height);
        if cells < 2 {
            return Err(ConfigError::Invalid(
                "board needs room for the chain and a target".to_owned(),
            ));
        }
        if cells > MAX_CELLS {
            return Err(ConfigError::Invalid(format!(
                "board of {}x{} exceeds {MAX_CELLS} cells",
                self.width, self.height
            )));
        }
        let fits = |cells: Coord, per_cell: u16| {
            u32::try_from(cells)
                .ok()
                .and_then(|n| n.checked_mul(u32::from(per_cell)))
                .and_then(|n| n.checked_add(2))
                .is_some_and(|n| n <= u32::from(u16::MAX))
        };
        if !fits(self.width, self.cell_size.cols) || !fits(self.height, self.cell_size.rows) {
            return Err(ConfigError::Invalid(format!(
                "board of {}x{} does not fit on a terminal",
                self.width, self.height
            )));
        }
        if !self.in_bounds(self.start) {
            return Err(ConfigError::Invalid(format!(
                "start cell ({}, {}) lies outside the board",
                self.start.x, self.start.y
            )));
        }
        if !self.initial_fps.is_finite() || self.initial_fps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_fps must be positive, got {}",
                self.initial_fps
            )));
        }
        if !self.fps_increment.is_finite() || self.fps_increment < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fps_increment must be non-negative, got {}",
                self.fps_increment
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn in_bounds(&self, c: Cell) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.start, Cell::new(1, 12));
        assert_eq!(cfg.start_direction, Direction::Right);
        assert_eq!(cfg.dense_threshold, 670);
    }

    #[test]
    fn rejects_start_outside_board() {
        let cfg = GameConfig {
            start: Cell::new(50, 0),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_single_cell_board() {
        let cfg = GameConfig {
            start: Cell::new(0, 0),
            ..GameConfig::new(1, 1)
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_board_without_overflow() {
        let huge = GameConfig {
            start: Cell::new(0, 0),
            ..GameConfig::new(70_000, 70_000)
        };
        assert!(matches!(huge.validate(), Err(ConfigError::Invalid(_))));

        let extreme = GameConfig {
            start: Cell::new(0, 0),
            ..GameConfig::new(i32::MAX, i32::MAX)
        };
        assert!(matches!(extreme.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_board_wider_than_terminal() {
        // 40_000 cells of two columns each overflow a u16 footprint.
        let wide = GameConfig {
            start: Cell::new(0, 0),
            ..GameConfig::new(40_000, 2)
        };
        assert!(matches!(wide.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn new_tolerates_extreme_width() {
        let cfg = GameConfig::new(i32::MIN, 4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_fps() {
        let cfg = GameConfig {
            initial_fps: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: GameConfig = serde_json::from_str(r#"{"width": 30, "initial_fps": 6.0}"#).unwrap();
        assert_eq!(cfg.width, 30);
        assert_eq!(cfg.height, 25);
        assert_eq!(cfg.initial_fps, 6.0);
        assert_eq!(cfg.score_key, "snakeScore");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snake.json");
        std::fs::write(&path, r#"{"height": 10, "start": {"x": 0, "y": 5}}"#).unwrap();
        let cfg = GameConfig::load(&path).unwrap();
        assert_eq!(cfg.height, 10);
        assert_eq!(cfg.start, Cell::new(0, 5));
    }

    #[test]
    fn custom_board_centres_start_row() {
        let cfg = GameConfig::new(10, 8);
        assert_eq!(cfg.start, Cell::new(1, 4));
        assert_eq!(cfg.max_rejection_attempts, 160);
        assert!(cfg.validate().is_ok());
    }
}
