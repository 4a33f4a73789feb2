use dysheros::compute::*;
use dysheros::entities::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn make_state() -> GameState {
    GameState {
        player: Player { x: 360.0, y: 510.0, speed: 5.0 },
        obstacles: Vec::new(),
        powerups: Vec::new(),
        phase: GamePhase::Playing,
        score: 0,
        level: 1,
        spawn_interval: 60,
        spawn_timer: 0,
        invincible: false,
        slow_obstacles: false,
        effect_started_ms: 0,
        bonus_count: 0,
        bonus_flash_ms: None,
        last_score_tick_ms: 0,
        final_battle_announced: false,
        background: 0,
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn top_obstacle(x: f32, y: f32, size: SizeClass, speed: f32) -> Obstacle {
    Obstacle { x, y, size, edge: SpawnEdge::Top, speed }
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_player_centred_near_bottom() {
    let mut rng = seeded_rng();
    let s = init_state(0, &mut rng);
    assert_eq!(s.player.x, 360.0); // box centred at x = 400
    assert_eq!(s.player.y, 510.0); // box centred at y = 550
    assert_eq!(s.player.speed, 5.0);
}

#[test]
fn init_state_defaults() {
    let mut rng = seeded_rng();
    let s = init_state(1234, &mut rng);
    assert!(s.obstacles.is_empty());
    assert!(s.powerups.is_empty());
    assert_eq!(s.phase, GamePhase::Countdown);
    assert_eq!(s.score, 0);
    assert_eq!(s.level, 1);
    assert_eq!(s.spawn_interval, 60);
    assert_eq!(s.spawn_timer, 0);
    assert!(!s.invincible);
    assert!(!s.slow_obstacles);
    assert_eq!(s.bonus_count, 0);
    assert_eq!(s.bonus_flash_ms, None);
    assert_eq!(s.last_score_tick_ms, 1234);
    assert!(!s.final_battle_announced);
    assert!(s.background < BACKGROUND_COUNT);
}

// ── player movement ───────────────────────────────────────────────────────────

#[test]
fn move_left_normal() {
    let s = make_state(); // x = 360, speed = 5
    let s2 = move_player_left(&s);
    assert_eq!(s2.player.x, 355.0);
}

#[test]
fn move_left_clamps_at_wall() {
    let mut s = make_state();
    s.player.x = 3.0;
    let s2 = move_player_left(&s);
    assert_eq!(s2.player.x, 0.0); // clamped, no overshoot past the edge
}

#[test]
fn move_right_normal() {
    let s = make_state();
    let s2 = move_player_right(&s);
    assert_eq!(s2.player.x, 365.0);
}

#[test]
fn move_right_clamps_at_wall() {
    let mut s = make_state();
    s.player.x = 718.0;
    let s2 = move_player_right(&s);
    assert_eq!(s2.player.x, 720.0); // 800 - 80
}

#[test]
fn move_up_normal_and_clamped() {
    let mut s = make_state();
    let s2 = move_player_up(&s);
    assert_eq!(s2.player.y, 505.0);

    s.player.y = 2.0;
    let s3 = move_player_up(&s);
    assert_eq!(s3.player.y, 0.0);
}

#[test]
fn move_down_normal_and_clamped() {
    let mut s = make_state();
    let s2 = move_player_down(&s);
    assert_eq!(s2.player.y, 515.0);

    s.player.y = 518.0;
    let s3 = move_player_down(&s);
    assert_eq!(s3.player.y, 520.0); // 600 - 80
}

#[test]
fn movement_does_not_mutate_input() {
    let s = make_state();
    let _ = move_player_left(&s);
    assert_eq!(s.player.x, 360.0);
}

// ── tick: phase gating ────────────────────────────────────────────────────────

#[test]
fn tick_is_noop_outside_playing() {
    let mut rng = seeded_rng();
    for phase in [GamePhase::Countdown, GamePhase::GameOver, GamePhase::Victory] {
        let mut s = make_state();
        s.phase = phase;
        s.score = 7;
        let (next, events) = tick(&s, 99_000, &mut rng);
        assert_eq!(next.phase, phase);
        assert_eq!(next.score, 7);
        assert!(events.is_empty());
    }
}

// ── tick: spawning ────────────────────────────────────────────────────────────

#[test]
fn no_spawn_before_interval() {
    let mut rng = seeded_rng();
    let s = make_state();
    let (next, _) = tick(&s, 0, &mut rng);
    assert!(next.obstacles.is_empty());
    assert_eq!(next.spawn_timer, 1);
}

#[test]
fn spawn_on_interval_resets_timer() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.spawn_timer = s.spawn_interval - 1;
    let (next, _) = tick(&s, 0, &mut rng);
    assert_eq!(next.obstacles.len(), 1);
    assert_eq!(next.spawn_timer, 0);
}

#[test]
fn spawned_obstacle_speed_includes_level() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.level = 5;
    s.spawn_timer = s.spawn_interval - 1;
    let (next, _) = tick(&s, 0, &mut rng);
    let o = &next.obstacles[0];
    assert_eq!(o.speed, o.size.base_speed() + 5.0);
}

#[test]
fn powerup_rides_along_roughly_thirty_percent() {
    let mut rng = seeded_rng();
    let mut seen = 0;
    for _ in 0..200 {
        let mut s = make_state();
        s.spawn_timer = s.spawn_interval - 1;
        let (next, _) = tick(&s, 0, &mut rng);
        seen += next.powerups.len();
    }
    // Binomial(200, 0.3); anything far outside this band is a logic bug.
    assert!((30..=90).contains(&seen), "saw {} power-ups in 200 spawns", seen);
}

#[test]
fn all_spawns_enter_from_top_before_level_twelve() {
    let mut rng = seeded_rng();
    for _ in 0..50 {
        let mut s = make_state();
        s.level = 11;
        s.spawn_timer = s.spawn_interval - 1;
        let (next, _) = tick(&s, 0, &mut rng);
        assert_eq!(next.obstacles[0].edge, SpawnEdge::Top);
    }
}

#[test]
fn side_spawns_appear_from_level_twelve() {
    let mut rng = seeded_rng();
    let mut seen_left = false;
    let mut seen_right = false;
    let mut seen_top = false;
    for _ in 0..60 {
        let mut s = make_state();
        s.level = 12;
        s.final_battle_announced = true;
        s.spawn_timer = s.spawn_interval - 1;
        let (next, _) = tick(&s, 0, &mut rng);
        match next.obstacles[0].edge {
            SpawnEdge::Left => seen_left = true,
            SpawnEdge::Right => seen_right = true,
            SpawnEdge::Top => seen_top = true,
        }
    }
    assert!(seen_left && seen_right && seen_top);
}

// ── tick: motion & removal ────────────────────────────────────────────────────

#[test]
fn top_obstacle_falls_and_leaves_at_bottom() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.obstacles.push(top_obstacle(10.0, 100.0, SizeClass::Medium, 4.0));
    let (next, _) = tick(&s, 0, &mut rng);
    assert_eq!(next.obstacles[0].y, 104.0);

    let mut s = make_state();
    s.obstacles.push(top_obstacle(10.0, 598.0, SizeClass::Medium, 4.0));
    let (next, _) = tick(&s, 0, &mut rng);
    assert!(next.obstacles.is_empty()); // y passed 600
}

#[test]
fn side_obstacles_leave_past_their_far_edge() {
    let mut rng = seeded_rng();

    let mut s = make_state();
    s.obstacles.push(Obstacle {
        x: 798.0,
        y: 100.0,
        size: SizeClass::Small,
        edge: SpawnEdge::Left,
        speed: 6.0,
    });
    let (next, _) = tick(&s, 0, &mut rng);
    assert!(next.obstacles.is_empty()); // x passed 800

    let mut s = make_state();
    s.obstacles.push(Obstacle {
        x: -20.0,
        y: 100.0,
        size: SizeClass::Small,
        edge: SpawnEdge::Right,
        speed: 6.0,
    });
    let (next, _) = tick(&s, 0, &mut rng);
    assert!(next.obstacles.is_empty()); // right edge passed 0
}

#[test]
fn powerups_fall_and_leave_at_bottom() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.powerups.push(PowerUp { x: 10.0, y: 100.0, kind: PowerUpKind::Invincibility });
    s.powerups.push(PowerUp { x: 10.0, y: 599.0, kind: PowerUpKind::Invincibility });
    let (next, _) = tick(&s, 0, &mut rng);
    assert_eq!(next.powerups.len(), 1);
    assert_eq!(next.powerups[0].y, 103.0);
}

// ── tick: obstacle collisions ─────────────────────────────────────────────────

#[test]
fn obstacle_hit_ends_the_run() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 12;
    s.level = 2;
    s.bonus_count = 3;
    s.obstacles.push(top_obstacle(370.0, 520.0, SizeClass::Medium, 0.0));
    let (next, events) = tick(&s, 50_000, &mut rng);
    assert_eq!(next.phase, GamePhase::GameOver);
    assert_eq!(events, vec![GameEvent::GameOver]);
    // Stats freeze at the moment of impact; no score tick sneaks in.
    assert_eq!(next.score, 12);
    assert_eq!(next.level, 2);
    assert_eq!(next.bonus_count, 3);
}

#[test]
fn touching_edges_is_not_a_collision() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    // Player box is [360, 440); obstacle starts exactly at 440.
    s.obstacles.push(top_obstacle(440.0, 510.0, SizeClass::Medium, 0.0));
    let (next, events) = tick(&s, 0, &mut rng);
    assert_eq!(next.phase, GamePhase::Playing);
    assert!(events.is_empty());
}

#[test]
fn invincibility_ignores_obstacles() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.invincible = true;
    s.effect_started_ms = 0;
    s.obstacles.push(top_obstacle(370.0, 520.0, SizeClass::Large, 0.0));
    let (next, events) = tick(&s, 100, &mut rng);
    assert_eq!(next.phase, GamePhase::Playing);
    assert!(events.is_empty());
    assert_eq!(next.obstacles.len(), 1); // passes through, not consumed
}

// ── tick: power-up pickup & effects ───────────────────────────────────────────

#[test]
fn pickup_grants_effect_and_bonus() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.last_score_tick_ms = 500;
    s.powerups.push(PowerUp { x: 380.0, y: 520.0, kind: PowerUpKind::Invincibility });
    let (next, events) = tick(&s, 500, &mut rng);
    assert!(next.powerups.is_empty());
    assert!(next.invincible);
    assert!(!next.slow_obstacles);
    assert_eq!(next.effect_started_ms, 500);
    assert_eq!(next.bonus_count, 1);
    assert_eq!(next.bonus_flash_ms, Some(500));
    assert_eq!(events, vec![GameEvent::PowerUpCollected(PowerUpKind::Invincibility)]);
}

#[test]
fn new_pickup_replaces_the_active_effect() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.invincible = true;
    s.effect_started_ms = 1000;
    s.last_score_tick_ms = 3000;
    s.powerups.push(PowerUp { x: 380.0, y: 520.0, kind: PowerUpKind::SlowObstacles });
    let (next, _) = tick(&s, 3000, &mut rng);
    assert!(!next.invincible);
    assert!(next.slow_obstacles);
    assert_eq!(next.effect_started_ms, 3000); // window restarted
}

#[test]
fn effect_expires_strictly_after_six_seconds() {
    let mut rng = seeded_rng();

    let mut s = make_state();
    s.invincible = true;
    s.effect_started_ms = 0;
    s.last_score_tick_ms = 6000;
    let (next, _) = tick(&s, 6000, &mut rng);
    assert!(next.invincible); // exactly 6000 ms is still active

    s.last_score_tick_ms = 6001;
    let (next, _) = tick(&s, 6001, &mut rng);
    assert!(!next.invincible);
    assert!(!next.slow_obstacles);
}

#[test]
fn bonus_flash_clears_after_one_second() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.bonus_flash_ms = Some(0);
    s.last_score_tick_ms = 1001;
    let (next, _) = tick(&s, 1000, &mut rng);
    assert_eq!(next.bonus_flash_ms, Some(0)); // exactly 1000 ms still shows

    let (next, _) = tick(&s, 1001, &mut rng);
    assert_eq!(next.bonus_flash_ms, None);
}

/// Pick up invincibility at t=1000, survive an overlap at t=3000, and lose
/// the shield just past t=7000.
#[test]
fn invincibility_timeline() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.powerups.push(PowerUp { x: 380.0, y: 520.0, kind: PowerUpKind::Invincibility });

    let (mut s, _) = tick(&s, 1000, &mut rng);
    assert!(s.invincible);
    assert_eq!(s.effect_started_ms, 1000);

    s.obstacles.push(top_obstacle(370.0, 520.0, SizeClass::Medium, 0.0));
    let (s, events) = tick(&s, 3000, &mut rng);
    assert_eq!(s.phase, GamePhase::Playing);
    assert!(!events.contains(&GameEvent::GameOver));

    // Shield holds through the full six-second window …
    let (s, _) = tick(&s, 7000, &mut rng);
    assert!(s.invincible);

    // … and the next overlap after expiry is fatal.
    let (s, _) = tick(&s, 7001, &mut rng);
    assert!(!s.invincible);
    let (s, events) = tick(&s, 7002, &mut rng);
    assert_eq!(s.phase, GamePhase::GameOver);
    assert!(events.contains(&GameEvent::GameOver));
}

// ── tick: score & leveling ────────────────────────────────────────────────────

#[test]
fn no_score_before_a_full_second() {
    let mut rng = seeded_rng();
    let s = make_state();
    let (next, _) = tick(&s, 999, &mut rng);
    assert_eq!(next.score, 0);
    assert_eq!(next.last_score_tick_ms, 0);
}

#[test]
fn score_ticks_once_per_second() {
    let mut rng = seeded_rng();
    let s = make_state();
    let (next, _) = tick(&s, 1000, &mut rng);
    assert_eq!(next.score, 1);
    assert_eq!(next.last_score_tick_ms, 1000);
}

#[test]
fn level_up_at_score_multiple_of_ten() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 9;
    let (next, events) = tick(&s, 1000, &mut rng);
    assert_eq!(next.score, 10);
    assert_eq!(next.level, 2);
    assert_eq!(next.spawn_interval, 55);
    assert_eq!(next.player.speed, 5.5);
    assert!(events.contains(&GameEvent::LevelUp(2)));
}

#[test]
fn spawn_interval_never_drops_below_twenty() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 9;
    s.spawn_interval = 20;
    let (next, _) = tick(&s, 1000, &mut rng);
    assert_eq!(next.level, 2);
    assert_eq!(next.spawn_interval, 20);
}

#[test]
fn player_speed_caps_at_ten() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 9;
    s.player.speed = 10.0;
    let (next, _) = tick(&s, 1000, &mut rng);
    assert_eq!(next.player.speed, 10.0);
}

/// 95 seconds of play, one tick per second, with the field swept clean
/// between ticks so nothing ever hits the player.
#[test]
fn ninety_five_seconds_of_survival() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    for k in 1..=95u64 {
        let (next, _) = tick(&s, k * 1000, &mut rng);
        s = next;
        s.obstacles.clear();
        s.powerups.clear();
    }
    assert_eq!(s.score, 95);
    assert_eq!(s.level, 10); // level-ups at 10, 20, … 90
    assert_eq!(s.spawn_interval, 20); // floored
    assert_eq!(s.player.speed, 9.5);
    assert_eq!(s.phase, GamePhase::Playing);
}

// ── tick: milestones ──────────────────────────────────────────────────────────

#[test]
fn final_battle_announced_once_at_level_twelve() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 119;
    s.level = 11;
    s.spawn_interval = 20;
    let (next, events) = tick(&s, 1000, &mut rng);
    assert_eq!(next.level, 12);
    assert!(next.final_battle_announced);
    assert!(events.contains(&GameEvent::FinalBattle));

    // Later ticks never announce again.
    let mut later = next.clone();
    later.obstacles.clear();
    later.powerups.clear();
    let (_, events) = tick(&later, 1100, &mut rng);
    assert!(!events.contains(&GameEvent::FinalBattle));
}

#[test]
fn reaching_level_thirty_four_wins() {
    let mut rng = seeded_rng();
    let mut s = make_state();
    s.score = 339;
    s.level = 33;
    s.spawn_interval = 20;
    s.final_battle_announced = true;
    let (next, events) = tick(&s, 1000, &mut rng);
    assert_eq!(next.score, 340);
    assert_eq!(next.level, 34);
    assert_eq!(next.phase, GamePhase::Victory);
    assert!(events.contains(&GameEvent::Victory));

    // The won game no longer advances.
    let (after, events) = tick(&next, 5000, &mut rng);
    assert_eq!(after.score, 340);
    assert_eq!(after.phase, GamePhase::Victory);
    assert!(events.is_empty());
}
