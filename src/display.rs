/// Rendering layer: all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state.  No game logic is performed; this module only translates
/// state into terminal commands, scaling the 800x600 world onto the grid
/// of cells inside the border.
use std::io::Write;
use std::time::Duration;

use crossterm::{
    cursor,
    event::PopKeyboardEnhancementFlags,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};

use crate::compute::{enemy_pulse_scale, overlay_tinted};
use crate::config::{Variant, HIT_LIMIT};
use crate::entities::{Bounds, Enemy, GameState, GameStatus, WORLD_HEIGHT, WORLD_WIDTH};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_TIME: Color = Color::Yellow;
const C_HUD_HITS: Color = Color::Red;
const C_INVINCIBLE: Color = Color::Magenta;
const C_PLAYER: Color = Color::Green;
const C_ENEMY: Color = Color::Red;
const C_ENEMY_FLASH: Color = Color::White;
const C_OVERLAY: Color = Color::DarkRed;
const C_HINT: Color = Color::DarkGrey;

/// Smallest terminal the play area still makes sense in.
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 15;

/// Terminal size in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn is_big_enough(&self) -> bool {
        self.width >= MIN_WIDTH && self.height >= MIN_HEIGHT
    }

    // Play area: columns 1..width-1, rows 2..height-2.
    fn cols(&self) -> f32 {
        self.width.saturating_sub(2) as f32
    }

    fn rows(&self) -> f32 {
        self.height.saturating_sub(4) as f32
    }

    /// Cell rectangle `(col0, row0, col1, row1)` (end-exclusive) covering
    /// `b`, clipped to the play area.  `None` when nothing is visible.
    pub fn cells(&self, b: &Bounds) -> Option<(u16, u16, u16, u16)> {
        let sx = self.cols() / WORLD_WIDTH;
        let sy = self.rows() / WORLD_HEIGHT;
        let c0 = (b.left * sx).floor().max(0.0);
        let r0 = (b.top * sy).floor().max(0.0);
        // Always at least one cell so tiny shapes stay visible.
        let c1 = (b.right() * sx).ceil().max(c0 + 1.0).min(self.cols());
        let r1 = (b.bottom() * sy).ceil().max(r0 + 1.0).min(self.rows());
        if c0 >= c1 || r0 >= r1 {
            return None;
        }
        Some((c0 as u16 + 1, r0 as u16 + 2, c1 as u16 + 1, r1 as u16 + 2))
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame at session time `now`.
pub fn render<W: Write>(
    out: &mut W,
    state: &GameState,
    view: Viewport,
    now: Duration,
) -> std::io::Result<()> {
    // Erasing with a background colour set fills the screen with it.
    if overlay_tinted(state, now) {
        out.queue(style::SetBackgroundColor(C_OVERLAY))?;
    }
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_hud(out, state, view, now)?;

    let scale = enemy_pulse_scale(&state.rules, now);
    for enemy in &state.enemies {
        draw_enemy(out, enemy, view, scale)?;
    }
    draw_rect(out, &state.player.actor.bounds(), view, C_PLAYER)?;

    draw_controls_hint(out, view)?;

    if state.status == GameStatus::GameOver {
        draw_game_over(out, view, now)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    let inner = "─".repeat(view.width.saturating_sub(2) as usize);
    let top = 1;
    let bottom = view.height.saturating_sub(2);
    let right = view.width.saturating_sub(1);

    out.queue(style::SetForegroundColor(C_BORDER))?;
    for row in top..=bottom {
        out.queue(cursor::MoveTo(0, row))?;
        if row == top {
            out.queue(Print(format!("┌{}┐", inner)))?;
        } else if row == bottom {
            out.queue(Print(format!("└{}┘", inner)))?;
        } else {
            // Walls only; the play area in between is left as cleared.
            out.queue(Print("│"))?;
            out.queue(cursor::MoveTo(right, row))?;
            out.queue(Print("│"))?;
        }
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    state: &GameState,
    view: Viewport,
    now: Duration,
) -> std::io::Result<()> {
    // Hits, left
    let remaining = HIT_LIMIT.saturating_sub(state.hits) as usize;
    let hits_str = format!(
        "Hits: {}{}",
        "●".repeat(state.hits.min(HIT_LIMIT) as usize),
        "○".repeat(remaining)
    );
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HITS))?;
    out.queue(Print(&hits_str))?;

    // Time, centre
    let time_str = format!("Time: {:>7.2}s", now.as_secs_f32());
    let tx = (view.width / 2).saturating_sub(time_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(tx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(&time_str))?;

    // Invincibility tag, right
    if state.is_invincible() {
        let tag = "[ INVINCIBLE ]";
        let rx = view.width.saturating_sub(tag.len() as u16 + 1);
        out.queue(cursor::MoveTo(rx, 0))?;
        out.queue(style::SetForegroundColor(C_INVINCIBLE))?;
        out.queue(Print(tag))?;
    }

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_enemy<W: Write>(
    out: &mut W,
    enemy: &Enemy,
    view: Viewport,
    scale: f32,
) -> std::io::Result<()> {
    let b = enemy.actor.bounds();
    // Pulse around the centre; purely visual.
    let (w, h) = (b.width * scale, b.height * scale);
    let scaled = Bounds {
        left: b.left + (b.width - w) / 2.0,
        top: b.top + (b.height - h) / 2.0,
        width: w,
        height: h,
    };
    let color = if enemy.is_flashing() { C_ENEMY_FLASH } else { C_ENEMY };
    draw_rect(out, &scaled, view, color)
}

fn draw_rect<W: Write>(
    out: &mut W,
    bounds: &Bounds,
    view: Viewport,
    color: Color,
) -> std::io::Result<()> {
    let Some((c0, r0, c1, r1)) = view.cells(bounds) else {
        return Ok(());
    };
    let row_str = "█".repeat((c1 - c0) as usize);
    out.queue(style::SetForegroundColor(color))?;
    for row in r0..r1 {
        out.queue(cursor::MoveTo(c0, row))?;
        out.queue(Print(&row_str))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("← → ↑ ↓ : Move   Q : Quit"))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(out: &mut W, view: Viewport, now: Duration) -> std::io::Result<()> {
    let survived = format!("Survived: {:.2}s", now.as_secs_f32());
    let lines: [(&str, Color); 4] = [
        ("╔════════════════════╗", Color::Red),
        ("║    GAME  OVER      ║", Color::Red),
        ("╚════════════════════╝", Color::Red),
        (&survived, Color::Yellow),
    ];

    let cx = view.width / 2;
    let start_row = (view.height / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }

    Ok(())
}

// ── Terminal restore ──────────────────────────────────────────────────────────

/// Undo the screen changes made at startup: keyboard enhancement flags
/// (when they were pushed), hidden cursor and alternate screen.  Raw mode
/// is left to the caller.
pub fn restore_screen<W: Write>(out: &mut W, enhanced: bool) -> std::io::Result<()> {
    if enhanced {
        out.queue(PopKeyboardEnhancementFlags)?;
    }
    out.queue(style::ResetColor)?;
    out.queue(cursor::Show)?;
    out.queue(terminal::LeaveAlternateScreen)?;
    out.flush()
}

// ── Exit line ─────────────────────────────────────────────────────────────────

/// Line printed to stdout once the terminal is restored.  Only the advanced
/// variant keeps score; `play_time` is measured from program start to the
/// frame that ended play.
pub fn score_line(variant: Variant, play_time: Duration) -> Option<String> {
    match variant {
        Variant::Advanced => Some(format!("Your Score: {:.2}", play_time.as_secs_f64())),
        Variant::Classic => None,
    }
}
