/// All game entity types — pure data, no logic.
///
/// The simulation runs in a logical 800x600 field (see `compute::FIELD_W` /
/// `FIELD_H`); the renderer scales positions to terminal cells.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    /// 25x25 box, fastest.
    Small,
    /// 45x45 box.
    Medium,
    /// 65x65 box, slowest.
    Large,
}

impl SizeClass {
    /// Side length of the bounding box in logical pixels.
    pub fn side(self) -> f32 {
        match self {
            SizeClass::Small => 25.0,
            SizeClass::Medium => 45.0,
            SizeClass::Large => 65.0,
        }
    }

    /// Per-frame speed before the level bonus is added.
    pub fn base_speed(self) -> f32 {
        match self {
            SizeClass::Small => 7.0,
            SizeClass::Medium => 5.0,
            SizeClass::Large => 3.0,
        }
    }
}

/// Which edge an obstacle enters from. Below level 12 everything enters
/// from the top; from level 12 on, side entries appear as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnEdge {
    /// Enters above the field, travels down.
    Top,
    /// Enters left of the field, travels right.
    Left,
    /// Enters right of the field, travels left.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Obstacle collisions are ignored while active.
    Invincibility,
    /// "Obstacles slowed" banner while active.
    SlowObstacles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Countdown,
    Playing,
    GameOver,
    Victory,
}

// ── Sprites ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Player {
    /// Top-left corner of the 80x80 bounding box.
    pub x: f32,
    pub y: f32,
    /// Pixels moved per frame per held directional key.
    pub speed: f32,
}

#[derive(Clone, Debug)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub size: SizeClass,
    pub edge: SpawnEdge,
    /// Pixels per frame along the edge's inward axis.
    pub speed: f32,
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire game state. Cloneable so pure update functions can return a
/// new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub powerups: Vec<PowerUp>,
    pub phase: GamePhase,
    pub score: u32,
    pub level: u32,
    /// Frames between obstacle spawns; shrinks on level-up, floor 20.
    pub spawn_interval: u32,
    /// Frames since the last spawn.
    pub spawn_timer: u32,
    pub invincible: bool,
    pub slow_obstacles: bool,
    /// When the active effect's 6-second window was last (re)started.
    pub effect_started_ms: u64,
    /// Cumulative power-ups collected, shown on the end screens.
    pub bonus_count: u32,
    /// Set on pickup; drives the transient "Bonus collected!" flash.
    pub bonus_flash_ms: Option<u64>,
    /// Anchor for the once-per-second score tick.
    pub last_score_tick_ms: u64,
    /// The level-12 alert fires only once per run.
    pub final_battle_announced: bool,
    /// Index into the renderer's theme table; re-rolled on level-up.
    pub background: usize,
}

/// One-shot happenings the frame loop reacts to (audio cues, screen
/// transitions). The state itself stays pure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PowerUpCollected(PowerUpKind),
    LevelUp(u32),
    FinalBattle,
    GameOver,
    Victory,
}
