use std::time::Duration;

use dodge_game::compute::*;
use dodge_game::config::{ClampPolicy, Rules};
use dodge_game::entities::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn rules() -> Rules {
    Rules {
        clamp: ClampPolicy::Shape,
        player_speed: 12.0,
        enemy_speed: 6.0,
        speed_increment: None,
        max_enemy_speed: None,
        pulse: false,
    }
}

fn make_state() -> GameState {
    GameState {
        player: Player {
            actor: Actor::new(Vec2::new(400.0, 300.0), Vec2::new(50.0, 50.0), 12.0),
        },
        enemies: Vec::new(),
        hits: 0,
        invincible_since: None,
        timers: Timers::default(),
        status: GameStatus::Playing,
        rules: rules(),
        frame: 0,
    }
}

/// An enemy sitting right on top of the player.
fn overlapping_enemy() -> Enemy {
    new_enemy(Vec2::new(400.0, 300.0), 6.0)
}

/// An enemy well clear of the player.
fn distant_enemy() -> Enemy {
    new_enemy(Vec2::new(0.0, 100.0), 6.0)
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn idle() -> Input {
    Input::default()
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_player_in_centre() {
    let s = init_state(rules(), 5, &mut seeded_rng());
    assert_eq!(s.player.actor.pos, Vec2::new(400.0, 300.0));
    assert_eq!(s.player.actor.speed, 12.0);
    assert_eq!(s.hits, 0);
    assert_eq!(s.status, GameStatus::Playing);
    assert!(!s.is_invincible());
}

#[test]
fn init_state_enemies_inside_world() {
    let s = init_state(rules(), 5, &mut seeded_rng());
    assert_eq!(s.enemies.len(), 5);
    for e in &s.enemies {
        assert!((0.0..800.0).contains(&e.actor.pos.x));
        assert!((0.0..600.0).contains(&e.actor.pos.y));
        assert_eq!(e.direction, Direction::Down);
        assert_eq!(e.actor.speed, 6.0);
        assert_eq!(e.flash, FlashState::Normal);
    }
}

// ── move_player ───────────────────────────────────────────────────────────────

#[test]
fn move_player_steps_by_speed() {
    let s = make_state();
    let p = move_player(&s.player, -1.0, 0.0, ClampPolicy::Shape);
    assert_eq!(p.actor.pos, Vec2::new(388.0, 300.0));
    let p = move_player(&p, 0.0, 1.0, ClampPolicy::Shape);
    assert_eq!(p.actor.pos, Vec2::new(388.0, 312.0));
}

#[test]
fn move_player_shape_clamp_keeps_square_on_screen() {
    let mut s = make_state();
    s.player.actor.pos = Vec2::new(745.0, 595.0);
    let p = move_player(&s.player, 1.0, 1.0, ClampPolicy::Shape);
    assert_eq!(p.actor.pos, Vec2::new(750.0, 550.0));
}

#[test]
fn move_player_point_clamp_lets_square_hang_off() {
    let mut s = make_state();
    s.player.actor.pos = Vec2::new(795.0, 595.0);
    let p = move_player(&s.player, 1.0, 1.0, ClampPolicy::Point);
    assert_eq!(p.actor.pos, Vec2::new(800.0, 600.0));
}

#[test]
fn move_player_clamps_at_origin() {
    let mut s = make_state();
    s.player.actor.pos = Vec2::new(5.0, 3.0);
    for clamp in [ClampPolicy::Shape, ClampPolicy::Point] {
        let p = move_player(&s.player, -1.0, -1.0, clamp);
        assert_eq!(p.actor.pos, Vec2::new(0.0, 0.0));
    }
}

#[test]
fn player_stays_in_world_for_every_input() {
    for clamp in [ClampPolicy::Shape, ClampPolicy::Point] {
        for mask in 0u8..16 {
            let input = Input {
                left: mask & 1 != 0,
                right: mask & 2 != 0,
                up: mask & 4 != 0,
                down: mask & 8 != 0,
            };
            let mut player = make_state().player;
            for _ in 0..100 {
                player = apply_input(&player, &input, clamp);
                let pos = player.actor.pos;
                assert!((0.0..=800.0).contains(&pos.x), "{:?} {:?}", clamp, input);
                assert!((0.0..=600.0).contains(&pos.y), "{:?} {:?}", clamp, input);
            }
        }
    }
}

#[test]
fn apply_input_combines_keys() {
    let s = make_state();
    let input = Input { right: true, up: true, ..Input::default() };
    let p = apply_input(&s.player, &input, ClampPolicy::Shape);
    assert_eq!(p.actor.pos, Vec2::new(412.0, 288.0));

    // Opposite keys cancel out.
    let input = Input { left: true, right: true, ..Input::default() };
    let p = apply_input(&s.player, &input, ClampPolicy::Shape);
    assert_eq!(p.actor.pos, Vec2::new(400.0, 300.0));
}

// ── Enemy motion ──────────────────────────────────────────────────────────────

#[test]
fn move_enemy_follows_direction() {
    let e = distant_enemy();
    assert_eq!(move_enemy(&e).actor.pos.y, 106.0);
    let up = reverse_direction(&e);
    assert_eq!(move_enemy(&up).actor.pos.y, 94.0);
    assert_eq!(move_enemy(&e).actor.pos.x, 0.0);
}

#[test]
fn enemy_leaving_bottom_reenters_at_top() {
    let mut s = make_state();
    s.enemies.push(new_enemy(Vec2::new(10.0, 598.0), 6.0));
    let s2 = tick(&s, &idle(), ms(16), &mut seeded_rng());
    let e = &s2.enemies[0];
    assert_eq!(e.actor.pos.y, 0.0);
    assert!((0.0..800.0).contains(&e.actor.pos.x));
    assert_eq!(e.direction, Direction::Down);
}

#[test]
fn enemy_leaving_top_reenters_at_bottom() {
    let mut s = make_state();
    s.enemies.push(reverse_direction(&new_enemy(Vec2::new(10.0, 2.0), 6.0)));
    let s2 = tick(&s, &idle(), ms(16), &mut seeded_rng());
    let e = &s2.enemies[0];
    assert_eq!(e.actor.pos.y, 600.0);
    assert!((0.0..800.0).contains(&e.actor.pos.x));
}

#[test]
fn enemy_exactly_on_edge_is_not_relocated() {
    let e = new_enemy(Vec2::new(10.0, 594.0), 6.0);
    let moved = move_enemy(&e);
    assert_eq!(moved.actor.pos.y, 600.0);
    assert!(!is_out_of_bounds(&moved));
}

#[test]
fn increase_speed_respects_cap() {
    let e = distant_enemy();
    assert_eq!(increase_speed(&e, 0.5, None).actor.speed, 6.5);
    assert_eq!(increase_speed(&e, 0.5, Some(6.2)).actor.speed, 6.2);
    // Base speed is never touched.
    assert_eq!(increase_speed(&e, 0.5, None).actor.base_speed, 6.0);
}

// ── Flash ─────────────────────────────────────────────────────────────────────

#[test]
fn flash_reverts_after_a_tenth_of_a_second() {
    let e = flash(&distant_enemy(), ms(1000));
    assert!(e.is_flashing());
    assert!(update_flash(&e, ms(1050)).is_flashing());
    assert!(update_flash(&e, ms(1100)).is_flashing());
    assert!(!update_flash(&e, ms(1101)).is_flashing());
}

#[test]
fn update_flash_leaves_normal_enemy_alone() {
    let e = distant_enemy();
    assert_eq!(update_flash(&e, ms(5000)), e);
}

// ── Collision ─────────────────────────────────────────────────────────────────

#[test]
fn first_collision_scans_in_order() {
    let s = make_state();
    let enemies = vec![distant_enemy(), overlapping_enemy(), overlapping_enemy()];
    assert_eq!(first_collision(&s.player, &enemies), Some(1));
    assert_eq!(first_collision(&s.player, &[distant_enemy()]), None);
}

#[test]
fn touching_edges_do_not_collide() {
    let s = make_state();
    let beside = new_enemy(Vec2::new(450.0, 300.0), 6.0);
    let above = new_enemy(Vec2::new(400.0, 250.0), 6.0);
    assert_eq!(first_collision(&s.player, &[beside, above]), None);
}

#[test]
fn hit_registers_once_and_flashes_first_enemy_only() {
    let mut s = make_state();
    s.enemies = vec![distant_enemy(), overlapping_enemy(), overlapping_enemy()];
    let s2 = tick(&s, &idle(), ms(100), &mut seeded_rng());

    assert_eq!(s2.hits, 1);
    assert_eq!(s2.invincible_since, Some(ms(100)));
    assert!(!s2.enemies[0].is_flashing());
    assert!(s2.enemies[1].is_flashing());
    assert!(!s2.enemies[2].is_flashing());
    assert_eq!(s2.status, GameStatus::Playing);
}

#[test]
fn hit_slows_every_actor_to_a_quarter() {
    let mut s = make_state();
    s.enemies = vec![overlapping_enemy(), distant_enemy()];
    let s2 = tick(&s, &idle(), ms(100), &mut seeded_rng());

    assert_eq!(s2.player.actor.speed, 3.0);
    assert_eq!(s2.player.actor.base_speed, 12.0);
    for e in &s2.enemies {
        assert_eq!(e.actor.speed, 1.5);
    }
}

#[test]
fn no_hit_while_invincible() {
    let mut s = make_state();
    s.enemies = vec![overlapping_enemy(), overlapping_enemy()];
    let mut rng = seeded_rng();
    let s = tick(&s, &idle(), ms(0), &mut rng);
    assert_eq!(s.hits, 1);

    let s = tick(&s, &idle(), ms(100), &mut rng);
    let s = tick(&s, &idle(), ms(500), &mut rng);
    assert_eq!(s.hits, 1);
    assert!(s.is_invincible());
}

#[test]
fn window_closes_after_half_second_and_restores_speed() {
    let mut s = make_state();
    s.enemies = vec![overlapping_enemy()];
    let mut rng = seeded_rng();
    let s = tick(&s, &idle(), ms(0), &mut rng);

    // The window is still open during this frame's collision check.
    let s = tick(&s, &idle(), ms(501), &mut rng);
    assert!(!s.is_invincible());
    assert_eq!(s.hits, 1);
    assert_eq!(s.player.actor.speed, 12.0);
    assert_eq!(s.enemies[0].actor.speed, 6.0);

    // Next frame the enemy is still on the player: a fresh window opens.
    let s = tick(&s, &idle(), ms(520), &mut rng);
    assert_eq!(s.hits, 2);
    assert_eq!(s.invincible_since, Some(ms(520)));
}

#[test]
fn hits_increase_at_most_once_per_window() {
    let mut s = make_state();
    s.enemies = vec![overlapping_enemy(), overlapping_enemy()];
    let mut rng = seeded_rng();
    let mut windows = 0;

    for step in 0..300u64 {
        let was_invincible = s.is_invincible();
        let before = s.hits;
        s = tick(&s, &idle(), ms(step * 10), &mut rng);
        assert!(s.hits >= before);
        assert!(s.hits - before <= 1);
        if was_invincible {
            assert_eq!(s.hits, before);
        }
        if s.hits > before {
            windows += 1;
            assert_eq!(s.invincible_since, Some(ms(step * 10)));
        }
        if s.status == GameStatus::GameOver {
            break;
        }
    }
    assert_eq!(windows, s.hits);
}

#[test]
fn third_hit_ends_session() {
    let mut s = make_state();
    s.hits = 2;
    s.enemies = vec![overlapping_enemy()];
    let s2 = tick(&s, &idle(), ms(100), &mut seeded_rng());
    assert_eq!(s2.hits, 3);
    assert_eq!(s2.status, GameStatus::GameOver);
}

#[test]
fn finished_session_is_frozen() {
    let mut s = make_state();
    s.hits = 2;
    s.enemies = vec![overlapping_enemy(), distant_enemy()];
    let over = tick(&s, &idle(), ms(100), &mut seeded_rng());

    let input = Input { left: true, ..Input::default() };
    let after = tick(&over, &input, ms(20_000), &mut seeded_rng());
    assert_eq!(after.frame, over.frame);
    assert_eq!(after.player, over.player);
    assert_eq!(after.enemies, over.enemies);
    assert_eq!(after.hits, 3);
}

#[test]
fn tick_increments_frame() {
    let mut s = make_state();
    s.frame = 5;
    let s2 = tick(&s, &idle(), ms(16), &mut seeded_rng());
    assert_eq!(s2.frame, 6);
}

// ── Overlay ───────────────────────────────────────────────────────────────────

#[test]
fn overlay_blinks_while_invincible() {
    let mut s = make_state();
    assert!(!overlay_tinted(&s, ms(10)));

    s.invincible_since = Some(ms(1000));
    assert!(overlay_tinted(&s, ms(1000)));
    assert!(overlay_tinted(&s, ms(1049)));
    assert!(!overlay_tinted(&s, ms(1050)));
    assert!(!overlay_tinted(&s, ms(1099)));
    assert!(overlay_tinted(&s, ms(1120)));
}

// ── Periodic events ───────────────────────────────────────────────────────────

#[test]
fn direction_reverses_at_ten_seconds() {
    let mut s = make_state();
    s.enemies = vec![distant_enemy(), new_enemy(Vec2::new(700.0, 100.0), 6.0)];
    let mut rng = seeded_rng();

    let s = tick(&s, &idle(), ms(9_999), &mut rng);
    assert!(s.enemies.iter().all(|e| e.direction == Direction::Down));

    let s = tick(&s, &idle(), ms(10_000), &mut rng);
    assert!(s.enemies.iter().all(|e| e.direction == Direction::Up));
    assert_eq!(s.timers.last_reversal, ms(10_000));

    // Exactly once: the timer restarted.
    let s = tick(&s, &idle(), ms(10_500), &mut rng);
    assert!(s.enemies.iter().all(|e| e.direction == Direction::Up));
}

#[test]
fn direction_reverses_while_invincible() {
    let mut s = make_state();
    s.enemies = vec![distant_enemy()];
    s.invincible_since = Some(ms(9_800));
    let s2 = tick(&s, &idle(), ms(10_000), &mut seeded_rng());
    assert!(s2.is_invincible());
    assert_eq!(s2.enemies[0].direction, Direction::Up);
}

#[test]
fn speed_escalates_every_second_in_advanced_rules() {
    let mut s = make_state();
    s.rules.speed_increment = Some(0.5);
    s.enemies = vec![distant_enemy()];
    let mut rng = seeded_rng();

    let s = tick(&s, &idle(), ms(999), &mut rng);
    assert_eq!(s.enemies[0].actor.speed, 6.0);
    let s = tick(&s, &idle(), ms(1_000), &mut rng);
    assert_eq!(s.enemies[0].actor.speed, 6.5);
    let s = tick(&s, &idle(), ms(2_000), &mut rng);
    assert_eq!(s.enemies[0].actor.speed, 7.0);
}

#[test]
fn speed_escalation_is_capped() {
    let mut s = make_state();
    s.rules.speed_increment = Some(0.5);
    s.rules.max_enemy_speed = Some(6.75);
    s.enemies = vec![distant_enemy()];
    let mut rng = seeded_rng();

    let s = tick(&s, &idle(), ms(1_000), &mut rng);
    let s = tick(&s, &idle(), ms(2_000), &mut rng);
    assert_eq!(s.enemies[0].actor.speed, 6.75);
}

#[test]
fn no_escalation_in_classic_rules() {
    let mut s = make_state();
    s.enemies = vec![distant_enemy()];
    let s2 = tick(&s, &idle(), ms(5_000), &mut seeded_rng());
    assert_eq!(s2.enemies[0].actor.speed, 6.0);
}

#[test]
fn window_close_drops_escalation() {
    let mut s = make_state();
    let mut fast = overlapping_enemy();
    fast.actor.speed = 9.0;
    s.enemies = vec![fast];
    s.invincible_since = Some(ms(0));
    let s2 = tick(&s, &idle(), ms(600), &mut seeded_rng());
    assert_eq!(s2.enemies[0].actor.speed, 6.0);
}

#[test]
fn pulse_scale_only_in_advanced_rules() {
    let mut r = rules();
    assert_eq!(enemy_pulse_scale(&r, ms(250)), 1.0);
    r.pulse = true;
    assert!((enemy_pulse_scale(&r, ms(250)) - 1.2).abs() < 1e-4);
    assert!((enemy_pulse_scale(&r, ms(0)) - 1.0).abs() < 1e-4);
}
