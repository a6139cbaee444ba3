/// Command-line configuration and the tuning constants derived from it.
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::GameError;

// ── Fixed gameplay constants ──────────────────────────────────────────────────

pub const PLAYER_SIZE: f32 = 50.0;
pub const ENEMY_SIZE: f32 = 50.0;

/// Fraction of base speed every actor moves at during invincibility.
pub const SLOW_FACTOR: f32 = 0.25;

pub const INVINCIBILITY: Duration = Duration::from_millis(500);
pub const FLASH: Duration = Duration::from_millis(100);
pub const DIRECTION_REVERSAL_INTERVAL: Duration = Duration::from_secs(10);
pub const SPEED_INCREASE_INTERVAL: Duration = Duration::from_secs(1);

/// Blink period of the red overlay, and the tinted part of each period.
pub const BLINK_PERIOD_MS: u128 = 100;
pub const BLINK_ON_MS: u128 = 50;

/// Hits that end the session.
pub const HIT_LIMIT: u32 = 3;

// ── Option enums ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Constant enemy speed.
    Classic,
    /// Enemy speed escalates every second, enemies pulse, score is printed on exit.
    Advanced,
}

/// How the player is kept inside the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClampPolicy {
    /// The whole square stays on screen.
    Shape,
    /// Only the top-left corner is clamped; the square may hang off the edge.
    Point,
}

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Clone)]
#[command(name = "dodge_game")]
#[command(about = "Dodge the falling blocks. Three hits and you're out.")]
pub struct GameConfig {
    #[arg(long, value_enum, default_value_t = Variant::Classic)]
    pub variant: Variant,

    /// Number of enemies spawned at session start.
    #[arg(long, default_value_t = 5)]
    pub enemies: usize,

    #[arg(long, value_enum, default_value_t = ClampPolicy::Shape)]
    pub clamp: ClampPolicy,

    /// RNG seed; random if omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Player displacement per frame, in world units.
    #[arg(long, default_value_t = 12.0)]
    pub player_speed: f32,

    /// Enemy displacement per frame, in world units.
    #[arg(long, default_value_t = 6.0)]
    pub enemy_speed: f32,

    /// Enemy speed added every second in the advanced variant.
    #[arg(long, default_value_t = 0.3)]
    pub speed_increment: f32,

    /// Upper bound for escalated enemy speed. Uncapped if omitted.
    #[arg(long)]
    pub max_enemy_speed: Option<f32>,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::parse_from(["dodge_game"])
    }
}

impl GameConfig {
    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), GameError> {
        let speeds = [
            ("player-speed", self.player_speed),
            ("enemy-speed", self.enemy_speed),
            ("speed-increment", self.speed_increment),
        ];
        for (name, value) in speeds {
            if !value.is_finite() || value < 0.0 {
                return Err(GameError::InvalidConfig(format!(
                    "--{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if let Some(cap) = self.max_enemy_speed {
            if !cap.is_finite() || cap < self.enemy_speed {
                return Err(GameError::InvalidConfig(format!(
                    "--max-enemy-speed ({}) must be at least --enemy-speed ({})",
                    cap, self.enemy_speed
                )));
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        let advanced = self.variant == Variant::Advanced;
        Rules {
            clamp: self.clamp,
            player_speed: self.player_speed,
            enemy_speed: self.enemy_speed,
            speed_increment: if advanced { Some(self.speed_increment) } else { None },
            max_enemy_speed: self.max_enemy_speed,
            pulse: advanced,
        }
    }
}

/// Tuning values the simulation reads every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rules {
    pub clamp: ClampPolicy,
    pub player_speed: f32,
    pub enemy_speed: f32,
    /// Per-second enemy speed escalation; `None` disables it.
    pub speed_increment: Option<f32>,
    pub max_enemy_speed: Option<f32>,
    /// Cosmetic enemy scale oscillation.
    pub pulse: bool,
}

impl Default for Rules {
    fn default() -> Self {
        GameConfig::default().rules()
    }
}
