/// Pure game-logic functions.
///
/// Every public function takes an immutable reference to the current
/// `GameState` (and, where needed, a clock sample and an RNG handle) and
/// returns a brand-new `GameState`.  Side effects are limited to the
/// injected RNG, so a seeded RNG and hand-picked timestamps make every
/// behavior reproducible in tests.

use rand::Rng;

use crate::entities::{
    GameEvent, GamePhase, GameState, Obstacle, Player, PowerUp, PowerUpKind, SizeClass,
    SpawnEdge,
};

// ── Field & difficulty constants ─────────────────────────────────────────────

/// Logical field size; the renderer scales this to terminal cells.
pub const FIELD_W: f32 = 800.0;
pub const FIELD_H: f32 = 600.0;

/// Player bounding box is square.
pub const PLAYER_SIZE: f32 = 80.0;
pub const PLAYER_SPEED_START: f32 = 5.0;
pub const PLAYER_SPEED_MAX: f32 = 10.0;
pub const PLAYER_SPEED_STEP: f32 = 0.5;

/// Frames between obstacle spawns at level 1, and the floor it shrinks to.
pub const SPAWN_INTERVAL_START: u32 = 60;
pub const SPAWN_INTERVAL_MIN: u32 = 20;
pub const SPAWN_INTERVAL_STEP: u32 = 5;

pub const POWERUP_SIZE: f32 = 35.0;
pub const POWERUP_FALL_SPEED: f32 = 3.0;
/// Chance that a power-up rides along with an obstacle spawn.
pub const POWERUP_CHANCE: f64 = 0.3;

/// Active power-up effects last this long from their latest (re)start.
pub const EFFECT_DURATION_MS: u64 = 6000;
/// The "Bonus collected!" flash stays up this long.
pub const BONUS_FLASH_MS: u64 = 1000;
/// One score point per elapsed second of play.
pub const SCORE_TICK_MS: u64 = 1000;

/// From this level on, obstacles may enter from the sides.
pub const SIDE_SPAWN_LEVEL: u32 = 12;
/// Reaching this level wins the game.
pub const FINAL_LEVEL: u32 = 34;

/// Number of background themes the renderer knows about.
pub const BACKGROUND_COUNT: usize = 6;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the initial game state, parked in the countdown phase.  `now_ms`
/// anchors the score tick; the caller re-anchors it when play actually
/// starts so the first point lands one second in.
pub fn init_state(now_ms: u64, rng: &mut impl Rng) -> GameState {
    GameState {
        player: Player {
            // Box centred at (400, 550), like the 80x80 hero sprite.
            x: FIELD_W / 2.0 - PLAYER_SIZE / 2.0,
            y: FIELD_H - 50.0 - PLAYER_SIZE / 2.0,
            speed: PLAYER_SPEED_START,
        },
        obstacles: Vec::new(),
        powerups: Vec::new(),
        phase: GamePhase::Countdown,
        score: 0,
        level: 1,
        spawn_interval: SPAWN_INTERVAL_START,
        spawn_timer: 0,
        invincible: false,
        slow_obstacles: false,
        effect_started_ms: 0,
        bonus_count: 0,
        bonus_flash_ms: None,
        last_score_tick_ms: now_ms,
        final_battle_announced: false,
        background: rng.gen_range(0..BACKGROUND_COUNT),
    }
}

// ── Input-driven state transitions (pure) ───────────────────────────────────

fn with_player_pos(state: &GameState, x: f32, y: f32) -> GameState {
    GameState {
        player: Player {
            x,
            y,
            ..state.player.clone()
        },
        ..state.clone()
    }
}

pub fn move_player_left(state: &GameState) -> GameState {
    let x = (state.player.x - state.player.speed).max(0.0);
    with_player_pos(state, x, state.player.y)
}

pub fn move_player_right(state: &GameState) -> GameState {
    let x = (state.player.x + state.player.speed).min(FIELD_W - PLAYER_SIZE);
    with_player_pos(state, x, state.player.y)
}

pub fn move_player_up(state: &GameState) -> GameState {
    let y = (state.player.y - state.player.speed).max(0.0);
    with_player_pos(state, state.player.x, y)
}

pub fn move_player_down(state: &GameState) -> GameState {
    let y = (state.player.y + state.player.speed).min(FIELD_H - PLAYER_SIZE);
    with_player_pos(state, state.player.x, y)
}

// ── Collision helper ─────────────────────────────────────────────────────────

/// Strict AABB overlap — boxes that merely touch do not collide.
fn boxes_overlap(ax: f32, ay: f32, aw: f32, ah: f32, bx: f32, by: f32, bw: f32, bh: f32) -> bool {
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

fn player_hits(state: &GameState, x: f32, y: f32, side: f32) -> bool {
    boxes_overlap(
        state.player.x,
        state.player.y,
        PLAYER_SIZE,
        PLAYER_SIZE,
        x,
        y,
        side,
        side,
    )
}

// ── Spawning ─────────────────────────────────────────────────────────────────

fn spawn_obstacle(level: u32, rng: &mut impl Rng) -> Obstacle {
    let size = match rng.gen_range(0..3) {
        0 => SizeClass::Small,
        1 => SizeClass::Medium,
        _ => SizeClass::Large,
    };
    let side = size.side();
    let speed = size.base_speed() + level as f32;

    let edge = if level >= SIDE_SPAWN_LEVEL {
        match rng.gen_range(0..3) {
            0 => SpawnEdge::Left,
            1 => SpawnEdge::Right,
            _ => SpawnEdge::Top,
        }
    } else {
        SpawnEdge::Top
    };

    let (x, y) = match edge {
        // Just outside the field, random offset along the entry edge.
        SpawnEdge::Left => (-side, rng.gen_range(0..(FIELD_H - side) as i32) as f32),
        SpawnEdge::Right => (FIELD_W, rng.gen_range(0..(FIELD_H - side) as i32) as f32),
        SpawnEdge::Top => (rng.gen_range(0..(FIELD_W - side) as i32) as f32, -side),
    };

    Obstacle {
        x,
        y,
        size,
        edge,
        speed,
    }
}

fn spawn_powerup(rng: &mut impl Rng) -> PowerUp {
    let kind = if rng.gen_bool(0.5) {
        PowerUpKind::Invincibility
    } else {
        PowerUpKind::SlowObstacles
    };
    PowerUp {
        x: rng.gen_range(0..(FIELD_W - POWERUP_SIZE) as i32) as f32,
        y: -POWERUP_SIZE,
        kind,
    }
}

// ── Per-frame tick (nearly pure — RNG is injected) ──────────────────────────

/// Advance the simulation by one frame.  `now_ms` is the monotonic clock in
/// milliseconds; score ticking and effect expiry are wall-time driven, so a
/// dropped frame costs one render, never game pacing.
///
/// Only meaningful while `Playing`; in any other phase the state is
/// returned unchanged and no events fire.
pub fn tick(state: &GameState, now_ms: u64, rng: &mut impl Rng) -> (GameState, Vec<GameEvent>) {
    if state.phase != GamePhase::Playing {
        return (state.clone(), Vec::new());
    }

    let mut next = state.clone();
    let mut events = Vec::new();

    // ── 1. Spawn tick ────────────────────────────────────────────────────────
    next.spawn_timer += 1;
    if next.spawn_timer >= next.spawn_interval {
        next.spawn_timer = 0;
        next.obstacles.push(spawn_obstacle(next.level, rng));

        // Independent 30% roll for a companion power-up.  No cap on how
        // many are airborne at once.
        if rng.gen_bool(POWERUP_CHANCE) {
            next.powerups.push(spawn_powerup(rng));
        }
    }

    // ── 2. Motion & off-screen removal ───────────────────────────────────────
    for o in &mut next.obstacles {
        match o.edge {
            SpawnEdge::Left => o.x += o.speed,
            SpawnEdge::Right => o.x -= o.speed,
            SpawnEdge::Top => o.y += o.speed,
        }
    }
    next.obstacles
        .retain(|o| !(o.y > FIELD_H || o.x > FIELD_W || o.x + o.size.side() < 0.0));

    for p in &mut next.powerups {
        p.y += POWERUP_FALL_SPEED;
    }
    next.powerups.retain(|p| p.y <= FIELD_H);

    // ── 3. Player <-> obstacle collisions ────────────────────────────────────
    if !next.invincible {
        let hit = next
            .obstacles
            .iter()
            .any(|o| player_hits(&next, o.x, o.y, o.size.side()));
        if hit {
            next.phase = GamePhase::GameOver;
            events.push(GameEvent::GameOver);
            // Final score/level/bonus stay exactly as they were at impact.
            return (next, events);
        }
    }

    // ── 4. Player <-> power-up collisions ────────────────────────────────────
    let (px, py) = (next.player.x, next.player.y);
    let mut collected: Vec<PowerUpKind> = Vec::new();
    next.powerups.retain(|p| {
        let hit = boxes_overlap(
            px,
            py,
            PLAYER_SIZE,
            PLAYER_SIZE,
            p.x,
            p.y,
            POWERUP_SIZE,
            POWERUP_SIZE,
        );
        if hit {
            collected.push(p.kind);
        }
        !hit
    });
    for kind in collected {
        // At most one effect active: the new pickup replaces the other
        // flag and restarts the shared 6-second window.
        next.invincible = kind == PowerUpKind::Invincibility;
        next.slow_obstacles = kind == PowerUpKind::SlowObstacles;
        next.effect_started_ms = now_ms;
        next.bonus_count += 1;
        next.bonus_flash_ms = Some(now_ms);
        events.push(GameEvent::PowerUpCollected(kind));
    }

    // ── 5. Effect & flash expiry ─────────────────────────────────────────────
    if (next.invincible || next.slow_obstacles)
        && now_ms.saturating_sub(next.effect_started_ms) > EFFECT_DURATION_MS
    {
        next.invincible = false;
        next.slow_obstacles = false;
    }
    if let Some(t) = next.bonus_flash_ms {
        if now_ms.saturating_sub(t) > BONUS_FLASH_MS {
            next.bonus_flash_ms = None;
        }
    }

    // ── 6. Score tick & leveling ─────────────────────────────────────────────
    if now_ms.saturating_sub(next.last_score_tick_ms) >= SCORE_TICK_MS {
        next.score += 1;
        // Anchor to "now" rather than += 1000: after a scripted pause the
        // score gains at most one point, exactly like the original game.
        next.last_score_tick_ms = now_ms;

        if next.score % 10 == 0 {
            next.level += 1;
            next.spawn_interval =
                next.spawn_interval.saturating_sub(SPAWN_INTERVAL_STEP).max(SPAWN_INTERVAL_MIN);
            next.player.speed = (next.player.speed + PLAYER_SPEED_STEP).min(PLAYER_SPEED_MAX);
            next.background = rng.gen_range(0..BACKGROUND_COUNT);
            events.push(GameEvent::LevelUp(next.level));
        }
    }

    // ── 7. Milestones ────────────────────────────────────────────────────────
    if next.level >= SIDE_SPAWN_LEVEL && !next.final_battle_announced {
        next.final_battle_announced = true;
        events.push(GameEvent::FinalBattle);
    }
    if next.level >= FINAL_LEVEL {
        next.phase = GamePhase::Victory;
        events.push(GameEvent::Victory);
    }

    (next, events)
}
