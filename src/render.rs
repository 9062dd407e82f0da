//! Abstract frame description for whatever draws the game
//!
//! `draw_list` flattens the state into back-to-front draw commands in field
//! coordinates; `HudSnapshot` is the read-only UI surface (the page formats
//! the text). Neither carries colors or fonts.

use glam::Vec2;
use serde::Serialize;

use crate::consts::*;
use crate::sim::{GamePhase, GameState, ItemKind, TileKind, awaiting_gesture};

/// Blink rate of the invincible ship (blinks per second)
const INVINCIBLE_BLINKS_PER_SEC: f64 = 8.0;

/// One thing to draw
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Star {
        pos: Vec2,
        radius: f32,
    },
    /// Terrain cell; `pos` is the top-left corner, `size` the edge length
    Tile {
        pos: Vec2,
        size: f32,
        kind: TileKind,
    },
    Item {
        pos: Vec2,
        radius: f32,
        kind: ItemKind,
    },
    Enemy {
        pos: Vec2,
        half: Vec2,
        variant: u8,
    },
    Boss {
        pos: Vec2,
        half: Vec2,
        hp_fraction: f32,
    },
    EnemyBullet {
        pos: Vec2,
        radius: f32,
        variant: u8,
    },
    Bullet {
        pos: Vec2,
        radius: f32,
    },
    Player {
        pos: Vec2,
        half: Vec2,
        shielded: bool,
        /// Ticks left on the shield-break flash
        shield_flash: u32,
    },
    Bomb {
        pos: Vec2,
        radius: f32,
    },
}

/// Whether the ship is in the visible half of its invincibility blink
fn player_visible(state: &GameState) -> bool {
    let Some(until) = state.invincible_until.filter(|_| state.is_invincible()) else {
        return true;
    };
    let elapsed = state.now() - (until - RESPAWN_INVINCIBLE_MS);
    (elapsed * INVINCIBLE_BLINKS_PER_SEC * std::f64::consts::PI / 1000.0).sin() >= 0.0
}

/// Back-to-front draw commands for the current frame
pub fn draw_list(state: &GameState) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(
        state.stars.len()
            + state.bullets.len()
            + state.enemy_bullets.len()
            + state.enemies.len()
            + state.items.len()
            + 64,
    );

    for star in &state.stars {
        out.push(DrawCommand::Star {
            pos: star.pos,
            radius: star.radius,
        });
    }

    for (row_index, row) in state.scroll.rows().enumerate() {
        let Some(row) = row else { continue };
        let top = state.scroll.row_top(row_index);
        if top >= FIELD_HEIGHT || top + TILE_SIZE <= 0.0 {
            continue;
        }
        for (col, cell) in row.iter().enumerate() {
            if let Some(kind) = cell {
                out.push(DrawCommand::Tile {
                    pos: Vec2::new(col as f32 * TILE_SIZE, top),
                    size: TILE_SIZE,
                    kind: kind.clone(),
                });
            }
        }
    }

    for item in &state.items {
        out.push(DrawCommand::Item {
            pos: item.pos,
            radius: item.radius,
            kind: item.kind,
        });
    }
    for enemy in &state.enemies {
        out.push(DrawCommand::Enemy {
            pos: enemy.pos,
            half: enemy.half,
            variant: enemy.variant,
        });
    }
    if let Some(boss) = &state.boss {
        out.push(DrawCommand::Boss {
            pos: boss.pos,
            half: boss.half,
            hp_fraction: boss.hp_fraction(),
        });
    }
    for bullet in &state.enemy_bullets {
        out.push(DrawCommand::EnemyBullet {
            pos: bullet.pos,
            radius: bullet.radius,
            variant: bullet.variant,
        });
    }
    for bullet in &state.bullets {
        out.push(DrawCommand::Bullet {
            pos: bullet.pos,
            radius: bullet.radius,
        });
    }
    if !state.is_game_over() && player_visible(state) {
        out.push(DrawCommand::Player {
            pos: state.player.pos,
            half: state.player.half,
            shielded: state.is_shielded(),
            shield_flash: state.shield_flash,
        });
    }
    if let Some(bomb) = &state.bomb {
        out.push(DrawCommand::Bomb {
            pos: bomb.pos,
            radius: bomb.radius,
        });
    }
    out
}

/// Current shake amplitude in pixels (fades out over the effect)
pub fn shake_intensity(state: &GameState) -> f32 {
    let Some(shake) = state.screen_shake else {
        return 0.0;
    };
    let span = shake.until_ms - shake.started_ms;
    if span <= 0.0 {
        return 0.0;
    }
    let remaining = ((shake.until_ms - state.now()) / span).clamp(0.0, 1.0) as f32;
    shake.intensity * remaining
}

/// Boss health for the HUD bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BossHud {
    pub hp: u32,
    pub hp_max: u32,
}

/// Read-only UI values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub lives: u32,
    pub bomb_count: u32,
    pub bomb_max: u32,
    pub boss: Option<BossHud>,
    /// Milliseconds left on each buff (absent when inactive)
    pub shield_ms: Option<f64>,
    pub shield_hits: u32,
    pub triple_fire_ms: Option<f64>,
    pub invincible_ms: Option<f64>,
    pub phase: GamePhase,
    pub game_over: bool,
    pub final_score: Option<u64>,
    pub waiting_for_gesture: bool,
    pub map_name: String,
    /// Milliseconds since the boss warning started (absent when none)
    pub boss_warning_ms: Option<f64>,
    pub bomb_refill_flash_ms: Option<f64>,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        let now = state.now();
        let remaining = |until: f64| (until - now).max(0.0);
        let shield = state.shield.filter(|_| state.is_shielded());

        Self {
            score: state.score,
            lives: state.lives,
            bomb_count: state.bomb_count,
            bomb_max: BOMB_MAX,
            boss: state.boss.map(|b| BossHud {
                hp: b.hp,
                hp_max: b.hp_max,
            }),
            shield_ms: shield.map(|s| remaining(s.until_ms)),
            shield_hits: shield.map_or(0, |s| s.hits),
            triple_fire_ms: state
                .triple_fire_until
                .filter(|_| state.triple_fire_active())
                .map(remaining),
            invincible_ms: state
                .invincible_until
                .filter(|_| state.is_invincible())
                .map(remaining),
            phase: state.phase,
            game_over: state.is_game_over(),
            final_score: state.final_score,
            waiting_for_gesture: awaiting_gesture(state),
            map_name: state.scroll.current_map_name().to_string(),
            boss_warning_ms: state.boss_warning_at.map(|t| now - t),
            bomb_refill_flash_ms: state.bomb_refill_at.map(|t| now - t),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::sim::{Boss, Bullet, MapDocument, MapLibrary, ScreenShake, Shield};

    fn state() -> GameState {
        GameState::new(11, Rc::new(MapLibrary::fallback()))
    }

    #[test]
    fn test_draw_list_order() {
        let mut state = state();
        state.phase = GamePhase::Running;
        state.bullets.push(Bullet::new(Vec2::new(10.0, 10.0), 0.0));
        state.boss = Some(Boss::new());
        let list = draw_list(&state);

        assert!(matches!(list.first(), Some(DrawCommand::Star { .. })));
        let boss = list
            .iter()
            .position(|c| matches!(c, DrawCommand::Boss { .. }))
            .expect("boss drawn");
        let player = list
            .iter()
            .position(|c| matches!(c, DrawCommand::Player { .. }))
            .expect("player drawn");
        assert!(boss < player);
        assert_eq!(
            list.iter()
                .filter(|c| matches!(c, DrawCommand::Star { .. }))
                .count(),
            STAR_COUNT
        );
    }

    #[test]
    fn test_tiles_emitted_in_view() {
        let mut doc = MapDocument::empty(16, 32);
        doc.tiles[10][0] = Some(TileKind::Hub);
        doc.tiles[0][5] = Some(TileKind::Cargo);
        doc.tiles[31][5] = Some(TileKind::Fuel);
        let maps = HashMap::from([("m".to_string(), doc)]);
        let library = MapLibrary::new(vec!["m".to_string()], maps).expect("valid library");
        let state = GameState::new(1, Rc::new(library));

        let tiles: Vec<_> = draw_list(&state)
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Tile { pos, kind, .. } => Some((pos, kind)),
                _ => None,
            })
            .collect();
        // Row 0 sits above the field and row 31 below it
        assert_eq!(tiles, vec![(Vec2::new(0.0, 9.0 * TILE_SIZE), TileKind::Hub)]);
    }

    #[test]
    fn test_player_hidden_after_game_over() {
        let mut state = state();
        state.phase = GamePhase::GameOver;
        assert!(!draw_list(&state)
            .iter()
            .any(|c| matches!(c, DrawCommand::Player { .. })));
    }

    #[test]
    fn test_invincible_player_blinks() {
        let mut state = state();
        state.phase = GamePhase::Running;
        state.invincible_until = Some(RESPAWN_INVINCIBLE_MS);
        state.clock_ms = 10.0;
        assert!(player_visible(&state));
        // Second half of the first blink period
        state.clock_ms = 100.0;
        assert!(!player_visible(&state));
    }

    #[test]
    fn test_shake_fades() {
        let mut state = state();
        assert_eq!(shake_intensity(&state), 0.0);
        state.screen_shake = Some(ScreenShake {
            intensity: 10.0,
            started_ms: 0.0,
            until_ms: 200.0,
        });
        assert_eq!(shake_intensity(&state), 10.0);
        state.clock_ms = 100.0;
        assert!((shake_intensity(&state) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_hud_snapshot() {
        let mut state = state();
        state.phase = GamePhase::Running;
        state.clock_ms = 1000.0;
        state.score = 1234;
        state.shield = Some(Shield {
            until_ms: 4000.0,
            hits: 2,
        });
        state.boss = Some(Boss { hp: 50, ..Boss::new() });
        let hud = HudSnapshot::from_state(&state);

        assert_eq!(hud.score, 1234);
        assert_eq!(hud.lives, 3);
        assert_eq!(hud.bomb_count, BOMB_MAX);
        assert_eq!(hud.shield_ms, Some(3000.0));
        assert_eq!(hud.shield_hits, 2);
        assert_eq!(hud.triple_fire_ms, None);
        assert_eq!(hud.boss, Some(BossHud { hp: 50, hp_max: BOSS_HP }));
        assert!(!hud.game_over);
        assert!(!hud.waiting_for_gesture);
        assert_eq!(hud.map_name, MapLibrary::FALLBACK_NAME);
        assert!(hud.to_json().contains("\"score\":1234"));
    }

    #[test]
    fn test_hud_game_over() {
        let mut state = state();
        state.phase = GamePhase::GameOver;
        state.final_score = Some(800);
        let hud = HudSnapshot::from_state(&state);
        assert!(hud.game_over);
        assert_eq!(hud.final_score, Some(800));
    }
}
