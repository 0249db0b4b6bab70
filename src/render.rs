use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::config::{CellSize, Rgb};
use crate::scores::ScoreRecord;
use crate::session::Frontend;
use crate::{Cell, Coord};

const GLYPH: char = '█';

/// Terminal render sink: per-cell colours plus the score panel.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: Coord,
    pub height: Coord,
    cells: Vec<Option<Rgb>>,
    cell_size: CellSize,
    score: u32,
    top_scores: Vec<ScoreRecord>,
    game_over: bool,
}

impl Canvas {
    pub fn new(width: Coord, height: Coord, cell_size: CellSize) -> Self {
        let size = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![None; size],
            cell_size,
            score: 0,
            top_scores: Vec::new(),
            game_over: false,
        }
    }

    #[inline]
    fn idx(&self, x: Coord, y: Coord) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }

    pub fn get(&self, x: Coord, y: Coord) -> Option<Rgb> {
        self.idx(x, y).and_then(|i| self.cells[i])
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn top_scores(&self) -> &[ScoreRecord] {
        &self.top_scores
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Size of the rendered board in terminal columns and rows.
    pub fn footprint(&self) -> (u16, u16) {
        let span = |cells: Coord, per_cell: u16| {
            u16::try_from(cells.max(0))
                .unwrap_or(u16::MAX)
                .saturating_mul(per_cell)
        };
        (
            span(self.width, self.cell_size.cols),
            span(self.height, self.cell_size.rows),
        )
    }

    /// Board as styled lines, each cell `cols` glyphs wide and `rows` lines tall.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let cols = self.cell_size.cols.max(1) as usize;
        let rows = self.cell_size.rows.max(1) as usize;
        let mut out = Vec::with_capacity(self.height.max(0) as usize * rows);
        for y in 0..self.height {
            let spans: Vec<Span<'static>> = (0..self.width)
                .map(|x| match self.get(x, y) {
                    Some(Rgb(r, g, b)) => Span::styled(
                        GLYPH.to_string().repeat(cols),
                        Style::default().fg(Color::Rgb(r, g, b)),
                    ),
                    None => Span::raw(" ".repeat(cols)),
                })
                .collect();
            for _ in 0..rows {
                out.push(Line::from(spans.clone()));
            }
        }
        out
    }

    /// Print the board in simple ascii
    fn strmap(&self) -> String {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.get(x, y).is_some() { '8' } else { '.' })
                    .collect::<String>()
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl std::fmt::Display for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.strmap())
    }
}

impl Frontend for Canvas {
    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.game_over = false;
    }

    fn draw(&mut self, cell: Cell, size: CellSize, color: Rgb) {
        self.cell_size = size;
        if let Some(i) = self.idx(cell.x, cell.y) {
            self.cells[i] = Some(color);
        }
    }

    fn erase(&mut self, cell: Cell, size: CellSize) {
        self.cell_size = size;
        if let Some(i) = self.idx(cell.x, cell.y) {
            self.cells[i] = None;
        }
    }

    fn show_score(&mut self, score: u32) {
        self.score = score;
    }

    fn show_top_scores(&mut self, records: &[ScoreRecord]) {
        self.top_scores = records.to_vec();
    }

    fn show_game_over(&mut self) {
        self.game_over = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: CellSize = CellSize { cols: 1, rows: 1 };

    #[test]
    fn draw_and_erase() {
        let mut c = Canvas::new(4, 2, ONE);
        c.draw(Cell::new(0, 0), ONE, Rgb::RED);
        c.draw(Cell::new(3, 1), ONE, Rgb::PALE);
        assert_eq!(c.to_string(), "8...\n...8");
        c.erase(Cell::new(0, 0), ONE);
        assert_eq!(c.to_string(), "....\n...8");
        assert_eq!(c.get(3, 1), Some(Rgb::PALE));
    }

    #[test]
    fn off_board_cells_are_ignored() {
        let mut c = Canvas::new(3, 3, ONE);
        c.draw(Cell::new(-1, 0), ONE, Rgb::RED);
        c.draw(Cell::new(3, 0), ONE, Rgb::RED);
        c.draw(Cell::new(0, 3), ONE, Rgb::RED);
        assert_eq!(c.to_string(), "...\n...\n...");
    }

    #[test]
    fn clear_wipes_board_and_banner() {
        let mut c = Canvas::new(2, 2, ONE);
        c.draw(Cell::new(1, 1), ONE, Rgb::RED);
        c.show_game_over();
        c.clear();
        assert_eq!(c.to_string(), "..\n..");
        assert!(!c.is_game_over());
    }

    #[test]
    fn lines_follow_cell_size() {
        let size = CellSize { cols: 2, rows: 2 };
        let mut c = Canvas::new(3, 1, size);
        c.draw(Cell::new(1, 0), size, Rgb::RED);
        let lines = c.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].width(), 6);
        assert_eq!(lines[0].spans[1].content, "██");
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::Rgb(0xff, 0, 0)));
        assert_eq!(c.footprint(), (6, 2));
    }

    #[test]
    fn footprint_saturates_instead_of_wrapping() {
        let c = Canvas::new(70_000, 1, CellSize { cols: 2, rows: 1 });
        assert_eq!(c.footprint(), (u16::MAX, 1));
    }

    #[test]
    fn score_panel_state() {
        let mut c = Canvas::new(1, 1, ONE);
        c.show_score(7);
        c.show_top_scores(&[ScoreRecord::new("d", 7)]);
        assert_eq!(c.score(), 7);
        assert_eq!(c.top_scores().len(), 1);
    }
}
