//! Player movement, firing and bomb launch

use glam::Vec2;

use super::cooldown_elapsed;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::sim::state::{BombBlast, Bullet, GameState};
use crate::sim::tick::Actions;

/// Apply one tick of player input
pub fn update_player(state: &mut GameState, actions: &Actions) {
    let speed = state.player_speed;
    let player = &mut state.player;

    // Diagonals are intentionally not normalized
    if actions.move_left {
        player.pos.x -= speed;
    }
    if actions.move_right {
        player.pos.x += speed;
    }
    if actions.move_up {
        player.pos.y -= speed;
    }
    if actions.move_down {
        player.pos.y += speed;
    }
    player.pos.x = crate::clamp(player.pos.x, player.half.x, FIELD_WIDTH - player.half.x);
    player.pos.y = crate::clamp(player.pos.y, FIELD_HEIGHT / 2.0, FIELD_HEIGHT - player.half.y);

    if actions.fire {
        try_fire(state);
    }
    if actions.bomb {
        try_bomb(state);
    }
}

/// Fire one bullet (three with triple fire) if the shot cooldown allows
pub fn try_fire(state: &mut GameState) -> bool {
    let now = state.now();
    if !cooldown_elapsed(state.last_shot_at, now, SHOOT_DELAY_MS) {
        return false;
    }

    let muzzle = state.player.pos - Vec2::new(0.0, state.player.half.y);
    state.bullets.push(Bullet::new(muzzle, 0.0));
    if state.triple_fire_active() {
        let offset = Vec2::new(TRIPLE_FIRE_OFFSET, 0.0);
        state.bullets.push(Bullet::new(muzzle - offset, -1.0));
        state.bullets.push(Bullet::new(muzzle + offset, 1.0));
    }
    state.last_shot_at = Some(now);
    state.play(SoundEffect::Fire);
    true
}

/// Launch a bomb if a charge is available and the bomb cooldown allows
pub fn try_bomb(state: &mut GameState) -> bool {
    let now = state.now();
    if state.bomb_count == 0 || !cooldown_elapsed(state.last_bomb_at, now, BOMB_COOLDOWN_MS) {
        return false;
    }

    let player = state.player;
    state.bomb = Some(BombBlast {
        pos: Vec2::new(player.pos.x, player.pos.y - player.half.y * 2.0 / 3.0),
        radius: BOMB_START_RADIUS,
        started_ms: now,
    });
    state.bomb_count -= 1;
    state.last_bomb_at = Some(now);
    state.play(SoundEffect::BombDetonate);
    log::debug!("Bomb launched ({} left)", state.bomb_count);
    true
}
