//! Game state and core simulation types
//!
//! Every entity is a plain record; behavior is selected by tagged enums
//! (`MotionPattern`, `ItemKind`, `TileKind`), never by trait objects.
//! Timed effects are absolute timestamps on `clock_ms`.

use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::scroll::{MapLibrary, ScrollBuffer};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first input gesture
    Paused,
    /// Active gameplay
    Running,
    /// Player was hit; frozen until the pause elapses and a gesture arrives
    RespawnPause,
    /// Run ended, waiting for restart
    GameOver,
}

/// The player's ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Collision half-extents
    pub half: Vec2,
}

impl Player {
    pub fn spawn_point() -> Vec2 {
        Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y)
    }

    /// Move back to the spawn point
    pub fn respawn(&mut self) {
        self.pos = Self::spawn_point();
    }
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Self::spawn_point(),
            half: Vec2::new(PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT),
        }
    }
}

/// A player bullet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub radius: f32,
    /// Horizontal drift direction (-1, 0 or 1)
    pub drift: f32,
}

impl Bullet {
    pub fn new(pos: Vec2, drift: f32) -> Self {
        Self {
            pos,
            radius: BULLET_RADIUS,
            drift,
        }
    }
}

/// A bullet fired by an enemy or the boss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Render color (0-2 enemy ship variants, 3 boss)
    pub variant: u8,
}

/// Stages of the stop-and-drop pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DropStage {
    /// Creep down slowly until the timestamp
    Descend { until_ms: f64 },
    /// Hover in place until the timestamp
    Hold { until_ms: f64 },
    /// Fall fast until off screen
    Drop,
}

/// Enemy trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionPattern {
    Straight,
    /// Horizontal sine weave around `origin_x` keyed to y
    SineWeave {
        origin_x: f32,
        phase: f32,
        frequency: f32,
        amplitude: f32,
    },
    /// Horizontal bounce between field edges
    Bounce { dir: f32 },
    /// Inward spiral around a slowly descending center
    Spiral {
        center: Vec2,
        angle: f32,
        radius: f32,
        spin: f32,
    },
    StopAndDrop {
        stage: DropStage,
        slow_speed: f32,
        drop_speed: f32,
    },
}

/// An enemy ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub half: Vec2,
    pub speed: f32,
    pub pattern: MotionPattern,
    /// Ship shape (0-2), render only
    pub variant: u8,
}

/// The boss (at most one at a time)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub half: Vec2,
    pub hp: u32,
    pub hp_max: u32,
    /// Still descending to its hold line
    pub entering: bool,
    pub vel_x: f32,
    /// Earliest time of the next volley (`None` = ready)
    pub next_fire_at: Option<f64>,
}

impl Boss {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, BOSS_SPAWN_Y),
            half: Vec2::new(BOSS_HALF_WIDTH, BOSS_HALF_HEIGHT),
            hp: BOSS_HP,
            hp_max: BOSS_HP,
            entering: true,
            vel_x: BOSS_SPEED_X,
            next_fire_at: None,
        }
    }

    /// Remaining health in [0, 1]
    pub fn hp_fraction(&self) -> f32 {
        if self.hp_max == 0 {
            return 0.0;
        }
        self.hp as f32 / self.hp_max as f32
    }
}

impl Default for Boss {
    fn default() -> Self {
        Self::new()
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    TripleFire,
    Shield,
    BombRefill,
    LifeUp,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::TripleFire,
        ItemKind::Shield,
        ItemKind::BombRefill,
        ItemKind::LifeUp,
    ];

    /// Pickup radius when dropped by an enemy
    pub fn radius(self) -> f32 {
        match self {
            ItemKind::TripleFire | ItemKind::BombRefill => 11.0,
            ItemKind::Shield => 12.0,
            ItemKind::LifeUp => 13.0,
        }
    }

    /// Fall speed (px/tick) when dropped by an enemy
    pub fn fall_speed(self) -> f32 {
        match self {
            ItemKind::TripleFire => 2.1,
            ItemKind::Shield | ItemKind::LifeUp => 2.0,
            ItemKind::BombRefill => 2.2,
        }
    }
}

/// A falling power-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub pos: Vec2,
    pub radius: f32,
    pub vy: f32,
    pub kind: ItemKind,
}

impl Item {
    /// Item with its kind's standard radius and fall speed
    pub fn dropped(kind: ItemKind, pos: Vec2) -> Self {
        Self {
            pos,
            radius: kind.radius(),
            vy: kind.fall_speed(),
            kind,
        }
    }
}

/// An expanding bomb blast, detonates once fully grown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BombBlast {
    pub pos: Vec2,
    pub radius: f32,
    pub started_ms: f64,
}

/// Screen shake effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub intensity: f32,
    pub started_ms: f64,
    pub until_ms: f64,
}

/// Background star, decorative only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
}

impl Star {
    pub fn random(rng: &mut Pcg32, y: f32) -> Self {
        Self {
            pos: Vec2::new(rng.random::<f32>() * FIELD_WIDTH, y),
            radius: 0.7 + rng.random::<f32>() * 1.2,
            speed: 0.4 + rng.random::<f32>() * 0.7,
        }
    }
}

/// Active shield buff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub until_ms: f64,
    /// Remaining hits it can absorb
    pub hits: u32,
}

/// Things the host should react to (sound, UI notices)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    BossSpawned,
    BossDefeated { score: u64 },
    PlayerHit { lives: u32 },
    GameOver { score: u64 },
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation clock (ms since reset)
    pub clock_ms: f64,
    pub phase: GamePhase,
    pub score: u64,
    /// Score at the moment the run ended
    pub final_score: Option<u64>,
    pub lives: u32,
    pub bomb_count: u32,
    pub enemies_killed: u32,
    pub next_boss_at: u32,
    pub player: Player,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub boss: Option<Boss>,
    pub bomb: Option<BombBlast>,
    pub screen_shake: Option<ScreenShake>,
    pub stars: Vec<Star>,
    pub scroll: ScrollBuffer,
    pub shield: Option<Shield>,
    /// Ticks left on the shield-break flash
    pub shield_flash: u32,
    pub triple_fire_until: Option<f64>,
    pub invincible_until: Option<f64>,
    /// Grant invincibility when play resumes after a respawn pause
    pub pending_invincibility: bool,
    pub respawn_until: Option<f64>,
    pub last_shot_at: Option<f64>,
    pub last_bomb_at: Option<f64>,
    pub last_enemy_at: f64,
    /// Last bomb refill or extra life pickup (HUD flash)
    pub bomb_refill_at: Option<f64>,
    pub boss_warning_at: Option<f64>,
    /// Player speed in px/tick; a preference kept across resets
    pub player_speed: f32,
    /// Pending notifications, drained by the driver
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, library: Rc<MapLibrary>) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock_ms: 0.0,
            phase: GamePhase::Paused,
            score: 0,
            final_score: None,
            lives: STARTING_LIVES,
            bomb_count: BOMB_MAX,
            enemies_killed: 0,
            next_boss_at: FIRST_BOSS_AT,
            player: Player::default(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            enemies: Vec::new(),
            items: Vec::new(),
            boss: None,
            bomb: None,
            screen_shake: None,
            stars: Vec::with_capacity(STAR_COUNT),
            scroll: ScrollBuffer::new(library),
            shield: None,
            shield_flash: 0,
            triple_fire_until: None,
            invincible_until: None,
            pending_invincibility: false,
            respawn_until: None,
            last_shot_at: None,
            last_bomb_at: None,
            last_enemy_at: 0.0,
            bomb_refill_at: None,
            boss_warning_at: None,
            player_speed: PLAYER_SPEED,
            events: Vec::new(),
        };
        state.seed_stars();
        state
    }

    /// Reinitialize the run. Keeps the RNG stream and `player_speed`.
    pub fn reset(&mut self) {
        self.clock_ms = 0.0;
        self.phase = GamePhase::Paused;
        self.score = 0;
        self.final_score = None;
        self.lives = STARTING_LIVES;
        self.bomb_count = BOMB_MAX;
        self.enemies_killed = 0;
        self.next_boss_at = FIRST_BOSS_AT;
        self.player = Player::default();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.enemies.clear();
        self.items.clear();
        self.boss = None;
        self.bomb = None;
        self.screen_shake = None;
        self.scroll.reset();
        self.shield = None;
        self.shield_flash = 0;
        self.triple_fire_until = None;
        self.invincible_until = None;
        self.pending_invincibility = false;
        self.respawn_until = None;
        self.last_shot_at = None;
        self.last_bomb_at = None;
        self.last_enemy_at = 0.0;
        self.bomb_refill_at = None;
        self.boss_warning_at = None;
        self.events.clear();
        self.seed_stars();
    }

    /// Reset and start playing immediately
    pub fn restart(&mut self) {
        self.reset();
        self.phase = GamePhase::Running;
        log::info!("Run restarted (map: {})", self.scroll.current_map_name());
    }

    fn seed_stars(&mut self) {
        self.stars.clear();
        for _ in 0..STAR_COUNT {
            let y = self.rng.random::<f32>() * FIELD_HEIGHT;
            self.stars.push(Star::random(&mut self.rng, y));
        }
    }

    pub fn now(&self) -> f64 {
        self.clock_ms
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_until.is_some_and(|t| self.clock_ms <= t)
    }

    pub fn is_shielded(&self) -> bool {
        self.shield
            .is_some_and(|s| s.hits > 0 && self.clock_ms <= s.until_ms)
    }

    pub fn triple_fire_active(&self) -> bool {
        self.triple_fire_until.is_some_and(|t| self.clock_ms <= t)
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn play(&mut self, effect: SoundEffect) {
        self.events.push(GameEvent::Sound(effect));
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
