/// Game entity types: plain data plus the small amount of per-actor
/// behaviour (speed bookkeeping, bounds snapshots) that belongs to them.
///
/// Everything here is `Clone`; accessors hand out value copies so the
/// update functions in `compute` can stay pure.
use std::time::Duration;

use crate::config::Rules;

/// Width of the simulated world, in world units (pixels in the original).
pub const WORLD_WIDTH: f32 = 800.0;
/// Height of the simulated world.
pub const WORLD_HEIGHT: f32 = 600.0;

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Strict overlap test: rectangles that only share an edge do not
    /// intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        left < right && top < bottom
    }
}

// ── Actors ────────────────────────────────────────────────────────────────────

/// Shared moving-shape state for the player and the enemies.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    /// Top-left corner.
    pub pos: Vec2,
    pub size: Vec2,
    /// Displacement per poll, always non-negative.
    pub speed: f32,
    /// Nominal speed restored by `reset_speed`.
    pub base_speed: f32,
}

impl Actor {
    pub fn new(pos: Vec2, size: Vec2, base_speed: f32) -> Self {
        Self {
            pos,
            size,
            speed: base_speed,
            base_speed,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            left: self.pos.x,
            top: self.pos.y,
            width: self.size.x,
            height: self.size.y,
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn reset_speed(&mut self) {
        self.speed = self.base_speed;
    }

    /// Halve the current speed. The base speed is left untouched.
    pub fn reduce_speed(&mut self) {
        self.speed *= 0.5;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub actor: Actor,
}

/// Vertical travel direction of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    /// +1 for `Down` (screen y grows downwards), -1 for `Up`.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Down => 1.0,
            Direction::Up => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }
}

/// Short highlight shown on an enemy after it hits the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlashState {
    Normal,
    Flashing { since: Duration },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub actor: Actor,
    pub direction: Direction,
    pub flash: FlashState,
}

impl Enemy {
    pub fn is_flashing(&self) -> bool {
        matches!(self.flash, FlashState::Flashing { .. })
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Directional keys held during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

// ── Session timers ────────────────────────────────────────────────────────────

/// Start times of the periodic enemy events, measured from session start.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timers {
    pub last_reversal: Duration,
    pub last_speed_increase: Duration,
}

/// Time elapsed between `event` and `now`, zero if `now` is earlier.
pub fn elapsed_since(event: Duration, now: Duration) -> Duration {
    now.saturating_sub(event)
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

/// The entire game state.  Cloneable so pure update functions can
/// return a new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    /// Number of registered hits; never decreases.
    pub hits: u32,
    /// Opening time of the current invincibility window, if one is open.
    pub invincible_since: Option<Duration>,
    pub timers: Timers,
    pub status: GameStatus,
    pub rules: Rules,
    pub frame: u64,
}

impl GameState {
    pub fn is_invincible(&self) -> bool {
        self.invincible_since.is_some()
    }
}
