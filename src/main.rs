use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dodge_game::compute::{init_state, tick};
use dodge_game::config::GameConfig;
use dodge_game::display::{self, score_line, Viewport, MIN_HEIGHT, MIN_WIDTH};
use dodge_game::entities::{GameState, GameStatus};
use dodge_game::error::GameError;
use dodge_game::input::KeyTracker;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// How long the final frame stays on screen after the hit limit is reached.
const GAME_OVER_HOLD: Duration = Duration::from_secs(2);

// ── Logging ───────────────────────────────────────────────────────────────────

/// Log to `--log-file` at `info` by default, otherwise to stderr only when
/// `RUST_LOG` asks for it, since stderr shares the game's terminal.
fn init_logging(config: &GameConfig) -> Result<(), GameError> {
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| GameError::Logger(format!("{}: {}", path.display(), e)))?;
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
                .init();
        }
    }
    Ok(())
}

// ── Terminal guard ────────────────────────────────────────────────────────────

/// Owns raw mode.  Dropping it undoes every terminal change made after
/// raw mode was enabled, including on early error returns, so errors are
/// printed to a sane terminal.
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self, GameError> {
        terminal::enable_raw_mode()?;
        Ok(TerminalGuard { enhanced: false })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = display::restore_screen(&mut stdout(), self.enhanced);
        let _ = terminal::disable_raw_mode();
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs one session until the user quits or the hit limit is reached and
/// returns the time since `program_start` at which play stopped.
///
/// Input is drained without blocking at the top of every frame and fed to
/// a `KeyTracker` keyed by the simulation's own frame counter.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    keys: &mut KeyTracker,
    rng: &mut StdRng,
    program_start: Instant,
) -> Result<Duration, GameError> {
    let session_start = Instant::now();

    loop {
        let frame_start = Instant::now();
        let frame = state.frame;
        keys.expire(frame);

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while event::poll(Duration::ZERO)? {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = event::read()? else {
                continue;
            };
            match kind {
                KeyEventKind::Press => match code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        log::info!("quit requested at frame {}", frame);
                        return Ok(program_start.elapsed());
                    }
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        log::info!("interrupted at frame {}", frame);
                        return Ok(program_start.elapsed());
                    }
                    _ => keys.press(code, frame),
                },
                KeyEventKind::Repeat => keys.press(code, frame),
                KeyEventKind::Release => keys.release(code),
            }
        }

        let now = session_start.elapsed();
        let input = keys.input(frame);
        *state = tick(state, &input, now, rng);

        // When this frame ends the session, this is when play stopped.
        let play_time = program_start.elapsed();

        let (width, height) = terminal::size()?;
        display::render(out, state, Viewport { width, height }, now)?;

        if state.status == GameStatus::GameOver {
            log::info!("game over after {:.2}s", now.as_secs_f32());
            std::thread::sleep(GAME_OVER_HOLD);
            return Ok(play_time);
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // The score clock starts with the process, not the session.
    let program_start = Instant::now();
    let config = GameConfig::parse();

    match run(&config, program_start) {
        Ok(play_time) => {
            if let Some(line) = score_line(config.variant, play_time) {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: &GameConfig, program_start: Instant) -> Result<Duration, GameError> {
    config.validate()?;
    init_logging(config)?;

    let (width, height) = terminal::size()?;
    let view = Viewport { width, height };
    if !view.is_big_enough() {
        return Err(GameError::TerminalTooSmall {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut state = init_state(config.rules(), config.enemies, &mut rng);
    log::info!(
        "starting {:?} session: {} enemies, clamp {:?}, seed {:?}",
        config.variant,
        config.enemies,
        config.clamp,
        config.seed
    );

    let mut out = BufWriter::new(stdout());

    // Everything after this point is undone when `guard` drops.
    let mut guard = TerminalGuard::enter()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Ask kitty-protocol terminals for key-release events; others get the
    // classic press-only tracking.
    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        out.execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
        guard.enhanced = true;
    }
    log::info!("key release events: {}", release_events);

    let mut keys = KeyTracker::new(release_events);
    let result = game_loop(&mut out, &mut state, &mut keys, &mut rng, program_start);
    out.flush()?;
    drop(guard);

    log::info!("session ended with {} hit(s) after {} frames", state.hits, state.frame);
    result
}
