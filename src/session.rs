use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::{CellSize, GameConfig, Rgb};
use crate::engine::{self, Chain, Collision, Step};
use crate::error::ConfigError;
use crate::grid::OccupancyGrid;
use crate::input::{self, Inbox};
use crate::scores::{ScoreRecord, ScoreStore};
use crate::target::AdaptivePlacement;
use crate::{Cell, Direction};

/// Render sink and score display consumed by a session.
pub trait Frontend {
    /// Wipe the whole board.
    fn clear(&mut self);
    fn draw(&mut self, cell: Cell, size: CellSize, color: Rgb);
    fn erase(&mut self, cell: Cell, size: CellSize);
    fn show_score(&mut self, score: u32);
    fn show_top_scores(&mut self, records: &[ScoreRecord]);
    fn show_game_over(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Died(Collision),
    /// No free cell was left for the next target.
    BoardFull,
    /// Ended from outside (restart) while still alive.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Ended(EndReason),
}

/// What a call to [`Session::tick`] or [`Session::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing happened: not running yet, already ended, or not due.
    Idle,
    Advanced(Step),
    Ended(EndReason),
}

/// Drift-correcting tick schedule.
///
/// A tick is due once more than one interval has elapsed since the anchor;
/// the anchor then moves to `now - (elapsed mod interval)`, so a late tick
/// does not push every later tick back.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    previous: Instant,
}

impl TickClock {
    pub fn new(now: Instant) -> Self {
        Self { previous: now }
    }

    pub fn interval(fps: f64) -> Duration {
        Duration::from_secs_f64(1.0 / fps).max(Duration::from_nanos(1))
    }

    pub fn due(&mut self, now: Instant, fps: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.previous);
        let interval = Self::interval(fps);
        if elapsed <= interval {
            return false;
        }
        let drift = elapsed.as_nanos() % interval.as_nanos();
        self.previous = now - Duration::from_nanos(drift as u64);
        true
    }

    pub fn time_until_next(&self, now: Instant, fps: f64) -> Duration {
        Self::interval(fps).saturating_sub(now.saturating_duration_since(self.previous))
    }
}

/// One game, `Starting -> Running -> Ended`. Owns the chain, grid, target
/// and score; turns wait in the inbox until the next tick.
#[derive(Debug)]
pub struct Session<S: ScoreStore> {
    cfg: GameConfig,
    chain: Chain,
    velocity: Direction,
    inbox: Inbox,
    grid: OccupancyGrid,
    target: Cell,
    placement: AdaptivePlacement,
    rng: ChaCha8Rng,
    score: u32,
    fps: f64,
    alive: bool,
    death: Option<Collision>,
    phase: Phase,
    clock: TickClock,
    store: S,
}

impl<S: ScoreStore> Session<S> {
    pub fn with_seed(cfg: GameConfig, store: S, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, store, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Fresh session: single-cell chain on `cfg.start`, score 0, target placed.
    /// Fails if `cfg` does not validate.
    pub fn with_rng(cfg: GameConfig, store: S, rng: ChaCha8Rng) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let chain = Chain::new(cfg.start);
        let mut grid = OccupancyGrid::new(cfg.width, cfg.height);
        grid.set_occupied(cfg.start, true);

        let mut session = Self {
            chain,
            velocity: cfg.start_direction,
            inbox: Inbox::new(),
            grid,
            target: cfg.start,
            placement: AdaptivePlacement::new(cfg.dense_threshold, cfg.max_rejection_attempts),
            rng,
            score: 0,
            fps: cfg.initial_fps,
            alive: true,
            death: None,
            phase: Phase::Starting,
            clock: TickClock::new(Instant::now()),
            store,
            cfg,
        };
        if let Err(e) = session.replace_target() {
            warn!(error = %e, "no room for a first target");
            session.phase = Phase::Ended(EndReason::BoardFull);
        }
        Ok(session)
    }

    /// Create a new session with non-deterministic seed
    pub fn new(cfg: GameConfig, store: S) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, store, ChaCha8Rng::from_os_rng())
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn head(&self) -> Cell {
        self.chain.head()
    }

    pub fn velocity(&self) -> Direction {
        self.velocity
    }

    pub fn target(&self) -> Cell {
        self.target
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store over to the next session.
    pub fn into_store(self) -> S {
        self.store
    }

    fn replace_target(&mut self) -> Result<(), crate::PlacementError> {
        self.target = self.placement.place(self.score, &self.grid, &mut self.rng)?;
        Ok(())
    }

    fn paint(&self, out: &mut dyn Frontend, cell: Cell, color: Rgb) {
        out.draw(cell, self.cfg.cell_size, color);
    }

    /// Paint the opening frame and begin ticking from `now`.
    pub fn start(&mut self, now: Instant, out: &mut dyn Frontend) {
        if self.phase != Phase::Starting {
            return;
        }
        out.clear();
        self.paint(out, self.chain.head(), self.cfg.chain_color);
        self.paint(out, self.target, self.cfg.target_color);
        out.show_score(self.score);
        out.show_top_scores(self.store.load(&self.cfg.score_key).records());
        self.clock = TickClock::new(now);
        self.phase = Phase::Running;
        info!(
            width = self.cfg.width,
            height = self.cfg.height,
            fps = self.fps,
            "session started"
        );
    }

    /// Request a turn. Returns whether the input gate admitted it; an
    /// admitted turn takes effect at the start of the next tick.
    pub fn steer(&mut self, dir: Direction) -> bool {
        if matches!(self.phase, Phase::Ended(_)) {
            return false;
        }
        let current = self.inbox.peek().unwrap_or(self.velocity);
        let admitted = input::admits(dir, current, &self.chain, self.score);
        if admitted {
            self.inbox.put(dir);
        }
        admitted
    }

    /// Tick if the clock says one is due; end right away once dead.
    pub fn poll(&mut self, now: Instant, out: &mut dyn Frontend) -> Tick {
        if self.phase != Phase::Running {
            return Tick::Idle;
        }
        if !self.alive || self.clock.due(now, self.fps) {
            self.tick(out)
        } else {
            Tick::Idle
        }
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.clock.time_until_next(now, self.fps)
    }

    /// Advance one step regardless of the clock.
    pub fn tick(&mut self, out: &mut dyn Frontend) -> Tick {
        if self.phase != Phase::Running {
            return Tick::Idle;
        }
        if !self.alive {
            return Tick::Ended(self.end(out));
        }

        if let Some(v) = self.inbox.take() {
            self.velocity = v;
        }

        let step = engine::advance(&mut self.chain, self.velocity, &mut self.grid, self.target);
        let mut board_full = false;
        match step {
            Step::Died(collision) => {
                self.alive = false;
                self.death = Some(collision);
                info!(score = self.score, ?collision, "chain died");
                self.paint(out, self.chain.head(), self.cfg.chain_color);
                self.paint(out, self.target, self.cfg.target_color);
                return Tick::Advanced(step);
            }
            Step::Grew => {
                self.score += 1;
                self.fps += self.cfg.fps_increment;
                out.show_score(self.score);
                debug!(score = self.score, fps = self.fps, len = self.chain.len(), "grew");
                if let Err(e) = self.replace_target() {
                    warn!(error = %e, "board is full");
                    board_full = true;
                }
            }
            Step::Moved { .. } => {}
        }

        if let Some(trail) = step.trail() {
            out.erase(trail, self.cfg.cell_size);
        }
        self.paint(out, self.chain.head(), self.cfg.chain_color);
        if board_full {
            return Tick::Ended(self.finish(EndReason::BoardFull, out));
        }
        self.paint(out, self.target, self.cfg.target_color);
        Tick::Advanced(step)
    }

    /// End the session: persist the score, report game over if the chain
    /// died, and show the ranked list. Only the first call has effects.
    pub fn end(&mut self, out: &mut dyn Frontend) -> EndReason {
        let reason = match self.death {
            Some(collision) => EndReason::Died(collision),
            None => EndReason::Abandoned,
        };
        self.finish(reason, out)
    }

    fn finish(&mut self, reason: EndReason, out: &mut dyn Frontend) -> EndReason {
        if let Phase::Ended(already) = self.phase {
            return already;
        }
        self.phase = Phase::Ended(reason);

        if let Err(e) = self.store.save(&self.cfg.score_key, ScoreRecord::today(self.score)) {
            warn!(error = %e, score = self.score, "could not save score");
        }
        if !self.alive {
            out.show_game_over();
        }
        out.show_top_scores(self.store.load(&self.cfg.score_key).records());
        info!(score = self.score, ?reason, "session ended");
        reason
    }
}
