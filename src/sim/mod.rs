//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes only from `tick`'s `dt_ms`
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies (sound is emitted as events)

pub mod collision;
pub mod combat;
pub mod scroll;
pub mod state;
pub mod systems;
pub mod tick;

pub use combat::{HitOutcome, apply_player_hit, resolve_collisions};
pub use scroll::{MapDocument, MapLibrary, ScrollBuffer, TileKind, TileRow};
pub use state::{
    BombBlast, Boss, Bullet, DropStage, Enemy, EnemyBullet, GameEvent, GamePhase, GameState,
    Item, ItemKind, MotionPattern, Player, ScreenShake, Shield, Star,
};
pub use tick::{Action, Actions, TickInput, awaiting_gesture, tick};
