//! Skyraid - A vertical-scrolling arcade shooter over tile maps
//!
//! Core modules:
//! - `sim`: Simulation (entities, scroll buffer, update systems, collisions, state machine)
//! - `game`: Fixed-timestep driver that feeds input to `sim` and dispatches audio
//! - `render`: Abstract draw list and HUD snapshot for whatever draws the frame
//! - `audio`: Sound/music collaborator interface (Web Audio on wasm32)
//! - `settings`: User preferences that survive a restart

pub mod audio;
pub mod error;
pub mod game;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::MapError;
pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal simulation step (60 Hz, one tick per display refresh)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame gap fed to the accumulator
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Player ship (half-extents of the 32x24 hull)
    pub const PLAYER_HALF_WIDTH: f32 = 16.0;
    pub const PLAYER_HALF_HEIGHT: f32 = 12.0;
    /// Pixels per tick
    pub const PLAYER_SPEED: f32 = 4.0;
    /// Speed multiplier when playing with touch controls
    pub const TOUCH_SPEED_BOOST: f32 = 1.4;
    pub const PLAYER_SPAWN_X: f32 = 200.0;
    pub const PLAYER_SPAWN_Y: f32 = 540.0;

    /// Player bullets
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const BULLET_SPEED: f32 = 7.0;
    pub const BULLET_DRIFT_SPEED: f32 = 2.4;
    pub const TRIPLE_FIRE_OFFSET: f32 = 10.0;
    pub const SHOOT_DELAY_MS: f64 = 200.0;

    /// Bomb
    pub const BOMB_RADIUS: f32 = 240.0;
    pub const BOMB_START_RADIUS: f32 = 8.0;
    pub const BOMB_COOLDOWN_MS: f64 = 2500.0;
    pub const BOMB_EXPAND_MS: f64 = 500.0;
    pub const BOMB_MAX: u32 = 2;
    pub const BOMB_KILL_SCORE: u64 = 100;

    /// Enemies
    pub const ENEMY_WIDTH: f32 = 32.0;
    pub const ENEMY_HEIGHT: f32 = 20.0;
    pub const ENEMY_SPEED_MIN: f32 = 1.2;
    pub const ENEMY_SPEED_MAX: f32 = 2.6;
    pub const ENEMY_SPAWN_DELAY_MS: f64 = 2000.0;
    pub const ENEMY_SPAWN_DELAY_MIN_MS: f64 = 250.0;
    pub const ENEMY_KILL_SCORE: u64 = 100;

    /// Boss
    pub const BOSS_HALF_WIDTH: f32 = 37.5;
    pub const BOSS_HALF_HEIGHT: f32 = 24.0;
    pub const BOSS_HP: u32 = 110;
    pub const BOSS_SPAWN_Y: f32 = -60.0;
    pub const BOSS_ENTER_SPEED: f32 = 2.4;
    pub const BOSS_HOLD_Y: f32 = 96.0;
    pub const BOSS_SPEED_X: f32 = 2.0;
    pub const BOSS_EDGE_MARGIN: f32 = 10.0;
    pub const BOSS_SPREAD_ANGLE: f32 = 0.36;
    pub const BOSS_BULLET_RADIUS: f32 = 8.0;
    pub const BOSS_BULLET_SPEED: f32 = 4.1;
    pub const BOSS_FIRE_BASE_MS: f64 = 1050.0;
    pub const BOSS_FIRE_JITTER_MS: f64 = 180.0;
    /// Cooldown shortening per point of missing hp
    pub const BOSS_RAGE_MS_PER_HP: f64 = 2.0;
    pub const BOSS_SCORE: u64 = 1500;
    pub const BOSS_DROP_COUNT: usize = 5;
    pub const FIRST_BOSS_AT: u32 = 10_000;
    pub const BOSS_STEP: u32 = 10_000;

    /// Buffs
    pub const TRIPLE_FIRE_MS: f64 = 12_000.0;
    pub const SHIELD_MS: f64 = 10_000.0;
    pub const SHIELD_HITS: u32 = 3;
    pub const SHIELD_FLASH_TICKS: u32 = 12;

    /// Respawn
    pub const STARTING_LIVES: u32 = 3;
    pub const RESPAWN_PAUSE_MS: f64 = 1000.0;
    pub const RESPAWN_SHIELD_MS: f64 = 1400.0;
    pub const RESPAWN_SHIELD_HITS: u32 = 1;
    pub const RESPAWN_INVINCIBLE_MS: f64 = 2500.0;
    /// Enemy bullets within this vertical band of the respawned player are purged
    pub const RESPAWN_CLEAR_BAND: f32 = 60.0;

    /// Tile map scrolling
    pub const TILE_SIZE: f32 = 24.0;
    pub const BUFFER_ROWS: usize = 32;
    pub const MAP_SCROLL_SPEED: f32 = 0.51;
    pub const MAP_LOOKAHEAD_ROWS: isize = 10;
    pub const FALLBACK_MAP_WIDTH: usize = 16;
    pub const FALLBACK_MAP_HEIGHT: usize = 32;

    /// Decorative starfield
    pub const STAR_COUNT: usize = 48;
}

/// Clamp that tolerates an inverted range by preferring `min`
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    }
}
