/// Pure game-logic functions.
///
/// Every public function takes an immutable reference to the current
/// `GameState` (or a single entity), the session time `now` where timing
/// matters, and, where needed, an RNG handle, and returns a brand-new value.
/// Side effects are limited to the injected RNG and log output.
use std::f32::consts::TAU;
use std::time::Duration;

use rand::Rng;

use crate::config::{
    ClampPolicy, Rules, BLINK_ON_MS, BLINK_PERIOD_MS, DIRECTION_REVERSAL_INTERVAL, ENEMY_SIZE,
    FLASH, HIT_LIMIT, INVINCIBILITY, PLAYER_SIZE, SLOW_FACTOR, SPEED_INCREASE_INTERVAL,
};
use crate::entities::{
    elapsed_since, Actor, Direction, Enemy, FlashState, GameState, GameStatus, Input, Player,
    Timers, Vec2, WORLD_HEIGHT, WORLD_WIDTH,
};

/// Amplitude of the cosmetic enemy pulse, as a fraction of full size.
const PULSE_AMPLITUDE: f32 = 0.2;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the initial game state: player in the middle of the world,
/// `enemy_count` enemies scattered at random, all heading down.
pub fn init_state(rules: Rules, enemy_count: usize, rng: &mut impl Rng) -> GameState {
    let player = Player {
        actor: Actor::new(
            Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0),
            Vec2::new(PLAYER_SIZE, PLAYER_SIZE),
            rules.player_speed,
        ),
    };

    let enemies = (0..enemy_count)
        .map(|_| {
            let x = rng.gen_range(0.0..WORLD_WIDTH);
            let y = rng.gen_range(0.0..WORLD_HEIGHT);
            new_enemy(Vec2::new(x, y), rules.enemy_speed)
        })
        .collect();

    GameState {
        player,
        enemies,
        hits: 0,
        invincible_since: None,
        timers: Timers::default(),
        status: GameStatus::Playing,
        rules,
        frame: 0,
    }
}

pub fn new_enemy(pos: Vec2, speed: f32) -> Enemy {
    Enemy {
        actor: Actor::new(pos, Vec2::new(ENEMY_SIZE, ENEMY_SIZE), speed),
        direction: Direction::Down,
        flash: FlashState::Normal,
    }
}

// ── Player ───────────────────────────────────────────────────────────────────

/// Move the player one poll's worth in direction (`dx`, `dy`), each in
/// {-1, 0, 1}, then clamp to the viewport according to `clamp`.
pub fn move_player(player: &Player, dx: f32, dy: f32, clamp: ClampPolicy) -> Player {
    let actor = &player.actor;
    let (max_x, max_y) = match clamp {
        ClampPolicy::Shape => (WORLD_WIDTH - actor.size.x, WORLD_HEIGHT - actor.size.y),
        ClampPolicy::Point => (WORLD_WIDTH, WORLD_HEIGHT),
    };
    let x = (actor.pos.x + dx * actor.speed).clamp(0.0, max_x.max(0.0));
    let y = (actor.pos.y + dy * actor.speed).clamp(0.0, max_y.max(0.0));
    Player {
        actor: Actor {
            pos: Vec2::new(x, y),
            ..actor.clone()
        },
    }
}

/// Apply every pressed direction key as its own move, in the order
/// left, right, up, down.
pub fn apply_input(player: &Player, input: &Input, clamp: ClampPolicy) -> Player {
    let moves = [
        (input.left, -1.0, 0.0),
        (input.right, 1.0, 0.0),
        (input.up, 0.0, -1.0),
        (input.down, 0.0, 1.0),
    ];
    moves
        .iter()
        .filter(|(pressed, _, _)| *pressed)
        .fold(player.clone(), |p, &(_, dx, dy)| move_player(&p, dx, dy, clamp))
}

// ── Enemies ──────────────────────────────────────────────────────────────────

pub fn move_enemy(enemy: &Enemy) -> Enemy {
    let mut next = enemy.clone();
    next.actor.pos.y += enemy.actor.speed * enemy.direction.sign();
    next
}

pub fn is_out_of_bounds(enemy: &Enemy) -> bool {
    enemy.actor.pos.y > WORLD_HEIGHT || enemy.actor.pos.y < 0.0
}

/// Re-enter at a random column: at the top when travelling down,
/// at the bottom when travelling up.
pub fn reset_enemy_position(enemy: &Enemy, rng: &mut impl Rng) -> Enemy {
    let x = rng.gen_range(0.0..WORLD_WIDTH);
    let y = match enemy.direction {
        Direction::Down => 0.0,
        Direction::Up => WORLD_HEIGHT,
    };
    let mut next = enemy.clone();
    next.actor.pos = Vec2::new(x, y);
    next
}

pub fn reverse_direction(enemy: &Enemy) -> Enemy {
    Enemy {
        direction: enemy.direction.reversed(),
        ..enemy.clone()
    }
}

/// Add `increment` to the current speed, never exceeding `cap`.
pub fn increase_speed(enemy: &Enemy, increment: f32, cap: Option<f32>) -> Enemy {
    let mut next = enemy.clone();
    let speed = enemy.actor.speed + increment;
    next.actor.speed = match cap {
        Some(max) => speed.min(max),
        None => speed,
    };
    next
}

pub fn flash(enemy: &Enemy, now: Duration) -> Enemy {
    Enemy {
        flash: FlashState::Flashing { since: now },
        ..enemy.clone()
    }
}

/// Drop the highlight once it has been shown for longer than `FLASH`.
pub fn update_flash(enemy: &Enemy, now: Duration) -> Enemy {
    match enemy.flash {
        FlashState::Flashing { since } if elapsed_since(since, now) > FLASH => Enemy {
            flash: FlashState::Normal,
            ..enemy.clone()
        },
        _ => enemy.clone(),
    }
}

/// Render-only scale factor for the pulsing enemies; 1.0 when disabled.
pub fn enemy_pulse_scale(rules: &Rules, now: Duration) -> f32 {
    if !rules.pulse {
        return 1.0;
    }
    1.0 + PULSE_AMPLITUDE * (TAU * now.as_secs_f32()).sin()
}

// ── Invincibility ────────────────────────────────────────────────────────────

/// Whether the red overlay is showing at `now`: 50 ms on, 50 ms off while
/// an invincibility window is open.
pub fn overlay_tinted(state: &GameState, now: Duration) -> bool {
    match state.invincible_since {
        Some(since) => elapsed_since(since, now).as_millis() % BLINK_PERIOD_MS < BLINK_ON_MS,
        None => false,
    }
}

/// Index of the first enemy (in order) overlapping the player.
pub fn first_collision(player: &Player, enemies: &[Enemy]) -> Option<usize> {
    let bounds = player.actor.bounds();
    enemies
        .iter()
        .position(|e| bounds.intersects(&e.actor.bounds()))
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the simulation by one frame at session time `now`.  All
/// randomness comes through `rng` so callers control determinism.
///
/// A finished session is returned unchanged.
pub fn tick(state: &GameState, input: &Input, now: Duration, rng: &mut impl Rng) -> GameState {
    if state.status == GameStatus::GameOver {
        return state.clone();
    }
    let rules = state.rules;

    // ── 1. Player input ─────────────────────────────────────────────────────
    let mut player = apply_input(&state.player, input, rules.clamp);

    // ── 2. Enemy motion & flash ─────────────────────────────────────────────
    let mut enemies: Vec<Enemy> = state
        .enemies
        .iter()
        .map(|e| {
            let moved = move_enemy(e);
            let placed = if is_out_of_bounds(&moved) {
                reset_enemy_position(&moved, rng)
            } else {
                moved
            };
            update_flash(&placed, now)
        })
        .collect();

    // ── 3. Collision (only outside an invincibility window) ─────────────────
    let mut hits = state.hits;
    let mut invincible_since = state.invincible_since;
    let mut status = GameStatus::Playing;

    if invincible_since.is_none() {
        if let Some(i) = first_collision(&player, &enemies) {
            hits += 1;
            player.actor.reduce_speed();
            enemies[i] = flash(&enemies[i], now);
            invincible_since = Some(now);
            log::info!("hit {}/{} by enemy {} at {:.2}s", hits, HIT_LIMIT, i, now.as_secs_f32());
            if hits >= HIT_LIMIT {
                status = GameStatus::GameOver;
                log::info!("hit limit reached, session over");
            }
        }
    }

    // ── 4. Close an expired window ──────────────────────────────────────────
    if let Some(since) = invincible_since {
        if elapsed_since(since, now) > INVINCIBILITY {
            invincible_since = None;
            player.actor.reset_speed();
            for e in enemies.iter_mut() {
                e.actor.reset_speed();
            }
            log::debug!("invincibility over at {:.2}s", now.as_secs_f32());
        }
    }

    // ── 5. Periodic enemy events ────────────────────────────────────────────
    let mut timers = state.timers;

    if elapsed_since(timers.last_reversal, now) >= DIRECTION_REVERSAL_INTERVAL {
        enemies = enemies.iter().map(reverse_direction).collect();
        timers.last_reversal = now;
        log::debug!("enemies reversed at {:.2}s", now.as_secs_f32());
    }

    if let Some(increment) = rules.speed_increment {
        if elapsed_since(timers.last_speed_increase, now) >= SPEED_INCREASE_INTERVAL {
            enemies = enemies
                .iter()
                .map(|e| increase_speed(e, increment, rules.max_enemy_speed))
                .collect();
            timers.last_speed_increase = now;
            log::debug!("enemy speed +{} at {:.2}s", increment, now.as_secs_f32());
        }
    }

    // ── 6. Slow motion while invincible ─────────────────────────────────────
    if invincible_since.is_some() {
        player.actor.set_speed(player.actor.base_speed * SLOW_FACTOR);
        for e in enemies.iter_mut() {
            e.actor.set_speed(e.actor.base_speed * SLOW_FACTOR);
        }
    }

    GameState {
        player,
        enemies,
        hits,
        invincible_since,
        timers,
        status,
        rules,
        frame: state.frame + 1,
    }
}
