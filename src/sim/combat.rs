//! Collision resolution
//!
//! One pass per running tick, in a fixed order:
//! bomb detonation, enemy contact, bullets vs terrain, bullets vs enemies,
//! bullets vs boss, enemy bullets vs player, boss contact, then buff expiry.
//! Every source of player damage goes through [`apply_player_hit`].

use glam::Vec2;
use rand::Rng;

use crate::audio::SoundEffect;
use crate::consts::*;
use crate::sim::collision::{circle_near_rect, point_in_rect, rects_overlap, rects_overlap_inset, within_radius};
use crate::sim::state::{GameEvent, GamePhase, GameState, Item, ItemKind, ScreenShake, Shield};

/// Player hitbox scale against enemy bullets (forgiving)
const BULLET_HITBOX_SCALE: Vec2 = Vec2::new(0.72, 0.68);
/// Boss contact hitbox inset
const BOSS_CONTACT_INSET: Vec2 = Vec2::new(4.0, 8.0);
const SHAKE_MS: f64 = 200.0;
const SHAKE_MAX: f32 = 15.0;
/// Boss drops scatter within this fraction of its full size
const BOSS_DROP_SPREAD: f32 = 0.7;
const BOSS_DROP_RADIUS: f32 = 11.0;

/// What a hit on the player did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Not running, or invincible
    Ignored,
    /// Shield took it and still has hits left
    Absorbed,
    /// Shield took it and broke
    ShieldBroken,
    /// Life lost, respawning
    LifeLost,
    /// Last life lost
    GameOver,
}

impl HitOutcome {
    pub fn shield_absorbed(self) -> bool {
        matches!(self, HitOutcome::Absorbed | HitOutcome::ShieldBroken)
    }
}

/// Cumulative drop ladder for a destroyed enemy
pub fn drop_for_roll(roll: f32) -> Option<ItemKind> {
    if roll < 0.020 {
        Some(ItemKind::TripleFire)
    } else if roll < 0.036 {
        Some(ItemKind::Shield)
    } else if roll < 0.046 {
        Some(ItemKind::BombRefill)
    } else if roll < 0.050 {
        Some(ItemKind::LifeUp)
    } else {
        None
    }
}

/// Run every collision step for this tick
pub fn resolve_collisions(state: &mut GameState) {
    resolve_bomb(state);
    resolve_enemy_contact(state);
    bullets_vs_tiles(state);
    bullets_vs_enemies(state);
    bullets_vs_boss(state);
    enemy_bullets_vs_player(state);
    resolve_boss_contact(state);
    expire_timers(state);
}

fn player_vulnerable(state: &GameState) -> bool {
    state.phase == GamePhase::Running && !state.is_invincible()
}

/// The single damage path for the player
///
/// A live shield spends one hit. Otherwise a life is lost: the last one ends
/// the run in place, any other respawns the player and enters the respawn
/// pause.
pub fn apply_player_hit(state: &mut GameState) -> HitOutcome {
    if !player_vulnerable(state) {
        return HitOutcome::Ignored;
    }

    if state.is_shielded() {
        let hits = state.shield.map_or(0, |s| s.hits.saturating_sub(1));
        if hits == 0 {
            state.shield = None;
            state.shield_flash = SHIELD_FLASH_TICKS;
            state.play(SoundEffect::ShieldBreak);
            return HitOutcome::ShieldBroken;
        }
        if let Some(shield) = state.shield.as_mut() {
            shield.hits = hits;
        }
        state.play(SoundEffect::ShieldUp);
        return HitOutcome::Absorbed;
    }

    state.lives = state.lives.saturating_sub(1);
    state.play(SoundEffect::Explosion);

    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        state.final_score = Some(state.score);
        state.play(SoundEffect::GameOver);
        state.emit(GameEvent::GameOver { score: state.score });
        log::info!("Game over with score {}", state.score);
        return HitOutcome::GameOver;
    }

    let now = state.now();
    state.player.respawn();
    state.shield = Some(Shield {
        until_ms: now + RESPAWN_SHIELD_MS,
        hits: RESPAWN_SHIELD_HITS,
    });
    state.invincible_until = None;
    state.pending_invincibility = true;
    state.respawn_until = Some(now + RESPAWN_PAUSE_MS);
    state.phase = GamePhase::RespawnPause;
    state.play(SoundEffect::ShieldUp);

    let spawn_y = state.player.pos.y;
    state
        .enemy_bullets
        .retain(|b| (b.pos.y - spawn_y).abs() > RESPAWN_CLEAR_BAND);

    state.emit(GameEvent::PlayerHit { lives: state.lives });
    log::info!("Player hit, {} lives left", state.lives);
    HitOutcome::LifeLost
}

/// Grow the bomb blast, then detonate it once fully expanded
fn resolve_bomb(state: &mut GameState) {
    let Some(mut bomb) = state.bomb else {
        return;
    };
    let elapsed = state.now() - bomb.started_ms;
    if elapsed < BOMB_EXPAND_MS {
        let progress = (elapsed / BOMB_EXPAND_MS).max(0.0) as f32;
        bomb.radius = BOMB_START_RADIUS + (BOMB_RADIUS - BOMB_START_RADIUS) * progress;
        state.bomb = Some(bomb);
        return;
    }

    let before = state.enemies.len();
    state
        .enemies
        .retain(|e| !within_radius(e.pos, bomb.pos, BOMB_RADIUS));
    let kills = before - state.enemies.len();
    state.bomb = None;

    if kills > 0 {
        state.score += BOMB_KILL_SCORE * kills as u64;
        state.enemies_killed += kills as u32;
        state.play(SoundEffect::Hit);
        let now = state.now();
        state.screen_shake = Some(ScreenShake {
            intensity: (2.0 * kills as f32).min(SHAKE_MAX),
            started_ms: now,
            until_ms: now + SHAKE_MS,
        });
    }
    log::debug!("Bomb detonated, {} enemies destroyed", kills);
}

/// Ramming: a shield destroys the enemy, otherwise the player takes the hit
fn resolve_enemy_contact(state: &mut GameState) {
    if !player_vulnerable(state) {
        return;
    }
    let player = state.player;
    let Some(index) = state
        .enemies
        .iter()
        .position(|e| rects_overlap(player.pos, player.half, e.pos, e.half))
    else {
        return;
    };

    if apply_player_hit(state).shield_absorbed() {
        state.enemies.remove(index);
        state.enemies_killed += 1;
    }
}

/// Player bullets destroy non-decorative terrain
fn bullets_vs_tiles(state: &mut GameState) {
    for i in (0..state.bullets.len()).rev() {
        let pos = state.bullets[i].pos;
        let Some(points) = state
            .scroll
            .tile_at(pos.x, pos.y)
            .filter(|kind| kind.is_destructible())
            .map(|kind| kind.points())
        else {
            continue;
        };
        state.scroll.clear_tile_at(pos.x, pos.y);
        state.bullets.remove(i);
        state.score += points;
        state.play(SoundEffect::Hit);
    }
}

fn bullets_vs_enemies(state: &mut GameState) {
    for ei in (0..state.enemies.len()).rev() {
        let enemy = state.enemies[ei];
        let Some(bi) = state
            .bullets
            .iter()
            .rposition(|b| point_in_rect(b.pos, enemy.pos, enemy.half))
        else {
            continue;
        };
        state.bullets.remove(bi);
        state.enemies.remove(ei);
        state.score += ENEMY_KILL_SCORE;
        state.enemies_killed += 1;
        state.play(SoundEffect::Hit);

        let roll = state.rng.random::<f32>();
        if let Some(kind) = drop_for_roll(roll) {
            state.items.push(Item::dropped(kind, enemy.pos));
        }
    }
}

/// At most one bullet lands on the boss per tick
fn bullets_vs_boss(state: &mut GameState) {
    let Some(mut boss) = state.boss else {
        return;
    };
    let Some(bi) = state
        .bullets
        .iter()
        .rposition(|b| point_in_rect(b.pos, boss.pos, boss.half))
    else {
        return;
    };
    state.bullets.remove(bi);
    boss.hp = boss.hp.saturating_sub(1);
    state.play(SoundEffect::Hit);

    if boss.hp > 0 {
        state.boss = Some(boss);
        return;
    }

    state.score += BOSS_SCORE;
    state.play(SoundEffect::BombDetonate);
    let spread = boss.half * 2.0 * BOSS_DROP_SPREAD;
    for _ in 0..BOSS_DROP_COUNT {
        let offset = Vec2::new(
            state.rng.random::<f32>() - 0.5,
            state.rng.random::<f32>() - 0.5,
        ) * spread;
        let kind = ItemKind::ALL[state.rng.random_range(0..ItemKind::ALL.len())];
        state.items.push(Item {
            pos: boss.pos + offset,
            radius: BOSS_DROP_RADIUS,
            vy: 2.1 + state.rng.random::<f32>(),
            kind,
        });
    }
    state.boss = None;
    state.emit(GameEvent::BossDefeated { score: state.score });
    log::info!("Boss defeated, score {}", state.score);
}

/// At most one enemy bullet lands per tick; the bullet is always consumed
fn enemy_bullets_vs_player(state: &mut GameState) {
    if !player_vulnerable(state) {
        return;
    }
    let player = state.player;
    let hitbox = player.half * BULLET_HITBOX_SCALE;
    let Some(index) = state
        .enemy_bullets
        .iter()
        .rposition(|b| circle_near_rect(b.pos, b.radius, player.pos, hitbox))
    else {
        return;
    };
    state.enemy_bullets.remove(index);
    apply_player_hit(state);
}

fn resolve_boss_contact(state: &mut GameState) {
    if !player_vulnerable(state) {
        return;
    }
    let player = state.player;
    let touching = state.boss.is_some_and(|boss| {
        rects_overlap_inset(player.pos, player.half, boss.pos, boss.half, BOSS_CONTACT_INSET)
    });
    if touching {
        apply_player_hit(state);
    }
}

/// Clear buffs and effects whose timestamps have passed
fn expire_timers(state: &mut GameState) {
    let now = state.now();
    if state.shield.is_some_and(|s| now > s.until_ms || s.hits == 0) {
        state.shield = None;
    }
    if state.triple_fire_until.is_some_and(|t| now > t) {
        state.triple_fire_until = None;
    }
    if state.invincible_until.is_some_and(|t| now > t) {
        state.invincible_until = None;
    }
    if state.screen_shake.is_some_and(|s| now > s.until_ms) {
        state.screen_shake = None;
    }
    state.shield_flash = state.shield_flash.saturating_sub(1);
}
