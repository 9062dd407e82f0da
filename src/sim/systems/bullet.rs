//! Bullet movement and off-screen pruning

use crate::consts::*;
use crate::sim::state::GameState;

/// Distance past the field edge before an enemy bullet is dropped
const ENEMY_BULLET_MARGIN: f32 = 20.0;
/// Player bullets are dropped once above this y
const PLAYER_BULLET_TOP: f32 = -10.0;

pub fn update_bullets(state: &mut GameState) {
    for bullet in &mut state.bullets {
        bullet.pos.y -= BULLET_SPEED;
        bullet.pos.x += bullet.drift * BULLET_DRIFT_SPEED;
    }
    state.bullets.retain(|b| b.pos.y > PLAYER_BULLET_TOP);

    for bullet in &mut state.enemy_bullets {
        bullet.pos += bullet.vel;
    }
    state.enemy_bullets.retain(|b| {
        b.pos.x > -ENEMY_BULLET_MARGIN
            && b.pos.x < FIELD_WIDTH + ENEMY_BULLET_MARGIN
            && b.pos.y > -ENEMY_BULLET_MARGIN
            && b.pos.y < FIELD_HEIGHT + ENEMY_BULLET_MARGIN
    });
}
