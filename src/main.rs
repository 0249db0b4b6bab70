use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use gridsnake::render::Canvas;
use gridsnake::{Direction, GameConfig, JsonFileStore, Phase, Session};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::Stylize,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "gridsnake")]
#[command(version, about = "Grid snake in the terminal")]
struct Cli {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board width in cells
    #[arg(long)]
    width: Option<i32>,

    /// Board height in cells
    #[arg(long)]
    height: Option<i32>,

    /// Starting tick rate
    #[arg(long)]
    fps: Option<f64>,

    /// Seed for target placement
    #[arg(long)]
    seed: Option<u64>,

    /// High-score file
    #[arg(long, default_value = "snake-scores.json")]
    scores: PathBuf,

    /// Write logs here (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;
    let cfg = build_config(&cli)?;

    // --- Init terminal ---
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
    terminal.clear()?;

    let res = run(&mut terminal, cfg, JsonFileStore::new(&cli.scores), cli.seed);

    // --- Restore terminal even on error ---
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn init_tracing(path: Option<&std::path::Path>) -> Result<()> {
    // The alternate screen owns stdout/stderr, so logs only go to a file.
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(())
}

fn build_config(cli: &Cli) -> Result<GameConfig> {
    let mut cfg = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if cli.width.is_some() || cli.height.is_some() {
        let resized = GameConfig::new(
            cli.width.unwrap_or(cfg.width),
            cli.height.unwrap_or(cfg.height),
        );
        cfg.width = resized.width;
        cfg.height = resized.height;
        cfg.start = resized.start;
        cfg.max_rejection_attempts = resized.max_rejection_attempts;
    }
    if let Some(fps) = cli.fps {
        cfg.initial_fps = fps;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn new_session(
    cfg: &GameConfig,
    store: JsonFileStore,
    seed: Option<u64>,
) -> Result<Session<JsonFileStore>> {
    let session = match seed {
        Some(seed) => Session::with_seed(cfg.clone(), store, seed),
        None => Session::new(cfg.clone(), store),
    }?;
    Ok(session)
}

enum KeyIntent {
    Steer(Direction),
    Restart,
    Quit,
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: GameConfig,
    store: JsonFileStore,
    mut seed: Option<u64>,
) -> Result<()> {
    let mut canvas = Canvas::new(cfg.width, cfg.height, cfg.cell_size);
    let mut session = new_session(&cfg, store, seed)?;
    session.start(Instant::now(), &mut canvas);

    // Set while the "new game" delay is running.
    let mut restart_at: Option<Instant> = None;

    loop {
        // --- Input (non-blocking) ---
        let now = Instant::now();
        let timeout = match restart_at {
            Some(at) => at.saturating_duration_since(now),
            None if session.phase() == Phase::Running => session.time_until_next(now),
            None => Duration::from_millis(100),
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match map_key(key) {
                        Some(KeyIntent::Quit) => {
                            session.end(&mut canvas);
                            break;
                        }
                        Some(KeyIntent::Restart) if restart_at.is_none() => {
                            session.end(&mut canvas);
                            restart_at = Some(Instant::now() + cfg.restart_delay());
                        }
                        Some(KeyIntent::Steer(dir)) => {
                            session.steer(dir);
                        }
                        _ => {}
                    }
                }
            }
        }

        // --- Restart after the display delay ---
        if restart_at.is_some_and(|at| Instant::now() >= at) {
            restart_at = None;
            let store = session.into_store();
            seed = seed.map(|s| s.wrapping_add(1));
            session = new_session(&cfg, store, seed)?;
            session.start(Instant::now(), &mut canvas);
            info!("new game");
        }

        // --- Tick ---
        session.poll(Instant::now(), &mut canvas);

        // --- Render ---
        terminal.draw(|f| draw_frame(f, &canvas, restart_at.is_some()))?;
    }

    Ok(())
}

fn draw_frame(f: &mut ratatui::Frame, canvas: &Canvas, restarting: bool) {
    let area = f.area();

    let title = if restarting {
        " SNAKE ".to_owned()
    } else if canvas.is_game_over() {
        " DEAD SNAKE (r: new game, q: quit) ".to_owned()
    } else {
        format!(" SNAKE | score: {} ", canvas.score())
    };

    // --- Fit frame to game board ---
    let (board_w, board_h) = canvas.footprint();
    let outer_w = board_w.saturating_add(2);
    let outer_h = board_h.saturating_add(2);
    let panel_w = 28u16;

    // Center board plus score panel within the terminal area.
    let total_w = outer_w.saturating_add(panel_w);
    let x = area.x.saturating_add(area.width.saturating_sub(total_w) / 2);
    let y = area.y.saturating_add(area.height.saturating_sub(outer_h) / 2);
    let frame_area = Rect::new(x, y, total_w.min(area.width), outer_h.min(area.height));
    let [board_area, panel_area] =
        Layout::horizontal([Constraint::Length(outer_w), Constraint::Length(panel_w)])
            .areas(frame_area);

    let board = Paragraph::new(canvas.lines())
        .block(Block::default().borders(Borders::ALL).title(title.bold()));
    f.render_widget(board, board_area);

    let mut rows: Vec<Line> = canvas
        .top_scores()
        .iter()
        .map(|r| Line::from(format!("{}  {}", r.date, r.score)))
        .collect();
    if rows.is_empty() {
        rows.push(Line::from("no scores yet".italic()));
    }
    let panel = Paragraph::new(rows)
        .block(Block::default().borders(Borders::ALL).title(" top scores "));
    f.render_widget(panel, panel_area);
}

/// Arrow keys, hjkl and wasd steer; anything unrecognised is ignored.
fn map_key(key: KeyEvent) -> Option<KeyIntent> {
    let intent = match key.code {
        // Quit keys
        KeyCode::Char('q') | KeyCode::Esc => KeyIntent::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyIntent::Quit,

        KeyCode::Char('r') | KeyCode::Char('n') => KeyIntent::Restart,

        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => KeyIntent::Steer(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => {
            KeyIntent::Steer(Direction::Down)
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('a') => {
            KeyIntent::Steer(Direction::Left)
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('d') => {
            KeyIntent::Steer(Direction::Right)
        }

        _ => return None,
    };
    Some(intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Option<Direction> {
        match map_key(KeyEvent::new(code, KeyModifiers::NONE)) {
            Some(KeyIntent::Steer(d)) => Some(d),
            _ => None,
        }
    }

    #[test]
    fn arrows_and_vim_keys_steer() {
        assert_eq!(press(KeyCode::Up), Some(Direction::Up));
        assert_eq!(press(KeyCode::Char('j')), Some(Direction::Down));
        assert_eq!(press(KeyCode::Char('a')), Some(Direction::Left));
        assert_eq!(press(KeyCode::Right), Some(Direction::Right));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(map_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)).is_none());
        assert!(map_key(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(map_key(key), Some(KeyIntent::Quit)));
    }

    #[test]
    fn cli_flags_resize_board() {
        let cli = Cli::parse_from(["gridsnake", "--width", "20", "--height", "10", "--fps", "6"]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!((cfg.width, cfg.height), (20, 10));
        assert_eq!(cfg.start.y, 5);
        assert_eq!(cfg.initial_fps, 6.0);
    }

    #[test]
    fn cli_rejects_board_too_large_for_a_terminal() {
        let cli = Cli::parse_from(["gridsnake", "--width", "70000", "--height", "70000"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn second_subscriber_install_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_tracing(None).is_ok());
        assert!(init_tracing(Some(&dir.path().join("a.log"))).is_ok());
        let err = init_tracing(Some(&dir.path().join("b.log"))).unwrap_err();
        assert!(err.to_string().contains("log subscriber"));
    }
}
