//! Boss spawning, entry, patrol and spread fire

use glam::Vec2;
use rand::Rng;

use crate::audio::SoundEffect;
use crate::consts::*;
use crate::rotate;
use crate::sim::state::{Boss, EnemyBullet, GameEvent, GameState};

/// Muzzle offset along the aim direction (x, y scaled separately)
const MUZZLE: Vec2 = Vec2::new(34.0, 18.0);
const BOSS_BULLET_VARIANT: u8 = 3;

/// Spawn on the kill threshold, then enter, patrol and fire
pub fn update_boss(state: &mut GameState) {
    if state.boss.is_none() && state.enemies_killed >= state.next_boss_at {
        spawn_boss(state);
    }

    let now = state.now();
    let target = state.player.pos;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };

    if boss.entering {
        boss.pos.y += BOSS_ENTER_SPEED;
        if boss.pos.y > BOSS_HOLD_Y {
            boss.entering = false;
        }
        return;
    }

    boss.pos.x += boss.vel_x;
    let margin = boss.half.x + BOSS_EDGE_MARGIN;
    if boss.pos.x < margin || boss.pos.x > FIELD_WIDTH - margin {
        boss.vel_x = -boss.vel_x;
    }

    if boss.next_fire_at.is_some_and(|t| now < t) {
        return;
    }

    let aim = (target - boss.pos).normalize_or_zero();
    let aim = if aim == Vec2::ZERO { Vec2::Y } else { aim };
    for angle in [-BOSS_SPREAD_ANGLE, 0.0, BOSS_SPREAD_ANGLE] {
        let dir = rotate(aim, angle);
        let lift = state.rng.random::<f32>() * 1.5;
        state.enemy_bullets.push(EnemyBullet {
            pos: boss.pos + dir * MUZZLE,
            vel: Vec2::new(dir.x * BOSS_BULLET_SPEED, dir.y * BOSS_BULLET_SPEED + lift),
            radius: BOSS_BULLET_RADIUS,
            variant: BOSS_BULLET_VARIANT,
        });
    }
    boss.next_fire_at = Some(now + fire_cooldown_ms(boss, state.rng.random::<f64>()));
    state.play(SoundEffect::EnemyFire);
}

/// Cooldown between volleys; a wounded boss fires faster
pub fn fire_cooldown_ms(boss: &Boss, roll: f64) -> f64 {
    let missing = boss.hp_max.saturating_sub(boss.hp) as f64;
    BOSS_FIRE_BASE_MS + roll * BOSS_FIRE_JITTER_MS - missing * BOSS_RAGE_MS_PER_HP
}

fn spawn_boss(state: &mut GameState) {
    state.boss = Some(Boss::new());
    state.boss_warning_at = Some(state.now());
    state.next_boss_at += BOSS_STEP;
    state.play(SoundEffect::BombDetonate);
    state.emit(GameEvent::BossSpawned);
    log::info!(
        "Boss incoming after {} kills (next at {})",
        state.enemies_killed,
        state.next_boss_at
    );
}
