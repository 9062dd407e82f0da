//! Enemy spawning, motion patterns and firing
//!
//! Difficulty is keyed to the current score: spawns come faster, enemies move
//! faster and fire more often as it rises.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::audio::SoundEffect;
use crate::consts::*;
use crate::sim::state::{DropStage, Enemy, EnemyBullet, GameState, MotionPattern};

/// Hover time between the slow creep and the drop
const DROP_HOLD_MS: f64 = 450.0;
/// Per-tick shrink of the spiral radius
const SPIRAL_SHRINK: f32 = 0.2;

/// Ship shapes (full width, height) before scaling
const SHIP_SIZES: [(f32, f32); 3] = [(36.0, 28.0), (48.0, 32.0), (38.0, 38.0)];

/// Milliseconds between spawns at a given score
pub fn spawn_delay_ms(score: u64) -> f64 {
    let reduction = (score / 500) as f64 * 25.0;
    (ENEMY_SPAWN_DELAY_MS - reduction).max(ENEMY_SPAWN_DELAY_MIN_MS)
}

/// Speed range (min, max) at a given score
pub fn speed_range(score: u64) -> (f32, f32) {
    let bonus = (score / 1500) as f32 * 0.2;
    (
        (ENEMY_SPEED_MIN + bonus).min(4.0),
        (ENEMY_SPEED_MAX + bonus).min(5.0),
    )
}

/// Per-tick probability that `enemy` fires
pub fn firing_chance(enemy: &Enemy, score: u64) -> f32 {
    let size_bonus = 0.008 * (enemy.half.x * 2.0 / ENEMY_WIDTH);
    let score_bonus = (score / 1000) as f32 * 0.002;
    (0.013 + size_bonus + score_bonus).min(0.04)
}

/// Spawn, move, prune and fire
pub fn update_enemies(state: &mut GameState) {
    let now = state.now();
    if state.boss.is_none() && now - state.last_enemy_at > spawn_delay_ms(state.score) {
        let enemy = spawn_enemy(state);
        state.enemies.push(enemy);
        state.last_enemy_at = now;
    }

    for enemy in &mut state.enemies {
        move_enemy(enemy, now);
    }
    state
        .enemies
        .retain(|e| e.pos.y < FIELD_HEIGHT + ENEMY_HEIGHT);

    let score = state.score;
    let mut volleys = 0;
    for enemy in &state.enemies {
        if enemy.pos.y > 0.0 && state.rng.random::<f32>() < firing_chance(enemy, score) {
            let scale = enemy.half.x * 2.0 / ENEMY_WIDTH;
            state.enemy_bullets.push(EnemyBullet {
                pos: Vec2::new(enemy.pos.x, enemy.pos.y + enemy.half.y * 0.8),
                vel: Vec2::new(0.0, 4.2 + state.rng.random::<f32>() * 2.0),
                radius: 5.0 + 0.4 * scale,
                variant: enemy.variant,
            });
            volleys += 1;
        }
    }
    for _ in 0..volleys {
        state.play(SoundEffect::EnemyFire);
    }
}

/// Roll a new enemy just above the top edge
fn spawn_enemy(state: &mut GameState) -> Enemy {
    let now = state.now();
    let (min_speed, max_speed) = speed_range(state.score);
    let rng = &mut state.rng;

    let x = rng.random::<f32>() * (FIELD_WIDTH - ENEMY_WIDTH) + ENEMY_WIDTH / 2.0;
    let speed = min_speed + rng.random::<f32>() * (max_speed - min_speed);
    let pattern = match rng.random_range(0..5u8) {
        0 => MotionPattern::Straight,
        1 => MotionPattern::SineWeave {
            origin_x: x,
            phase: rng.random::<f32>() * TAU,
            frequency: 1.0 + rng.random::<f32>() * 1.5,
            amplitude: 36.0 + rng.random::<f32>() * 22.0,
        },
        2 => MotionPattern::Bounce {
            dir: if rng.random_bool(0.5) { -1.0 } else { 1.0 },
        },
        3 => MotionPattern::Spiral {
            center: Vec2::new(x, -ENEMY_HEIGHT - 40.0),
            angle: rng.random::<f32>() * TAU,
            radius: 80.0 + rng.random::<f32>() * 40.0,
            spin: (if rng.random_bool(0.5) { -1.0 } else { 1.0 })
                * (0.04 + rng.random::<f32>() * 0.02),
        },
        _ => MotionPattern::StopAndDrop {
            stage: DropStage::Descend {
                until_ms: now + 500.0 + rng.random::<f64>() * 400.0,
            },
            slow_speed: 1.3 + rng.random::<f32>() * 0.6,
            drop_speed: 3.0 + rng.random::<f32>() * 1.2,
        },
    };
    let variant = rng.random_range(0..SHIP_SIZES.len());
    let (w, h) = SHIP_SIZES[variant];
    let scale = 1.1 + rng.random::<f32>() * 0.18;
    let half = Vec2::new(w, h) * scale / 2.0;

    let mut enemy = Enemy {
        pos: Vec2::new(x, -half.y * 2.0),
        half,
        speed,
        pattern,
        variant: variant as u8,
    };
    if let MotionPattern::Spiral { .. } = enemy.pattern {
        place_on_spiral(&mut enemy);
    }
    enemy
}

fn pattern_is_finite(pattern: &MotionPattern) -> bool {
    match *pattern {
        MotionPattern::Straight => true,
        MotionPattern::SineWeave {
            origin_x,
            phase,
            frequency,
            amplitude,
        } => [origin_x, phase, frequency, amplitude].iter().all(|v| v.is_finite()),
        MotionPattern::Bounce { dir } => dir.is_finite(),
        MotionPattern::Spiral {
            center,
            angle,
            radius,
            spin,
        } => center.is_finite() && angle.is_finite() && radius.is_finite() && spin.is_finite(),
        MotionPattern::StopAndDrop {
            slow_speed,
            drop_speed,
            ..
        } => slow_speed.is_finite() && drop_speed.is_finite(),
    }
}

fn place_on_spiral(enemy: &mut Enemy) {
    if let MotionPattern::Spiral {
        center,
        angle,
        radius,
        ..
    } = enemy.pattern
    {
        enemy.pos = center + Vec2::new(angle.cos(), angle.sin()) * radius;
    }
}

/// Advance one enemy along its pattern. Malformed pattern data skips the tick.
pub fn move_enemy(enemy: &mut Enemy, now: f64) {
    if !enemy.speed.is_finite() || !enemy.pos.is_finite() || !pattern_is_finite(&enemy.pattern) {
        return;
    }
    let speed = enemy.speed;

    match &mut enemy.pattern {
        MotionPattern::Straight => {
            enemy.pos.y += speed;
        }
        MotionPattern::SineWeave {
            origin_x,
            phase,
            frequency,
            amplitude,
        } => {
            enemy.pos.y += speed;
            enemy.pos.x = *origin_x + ((enemy.pos.y / 36.0) * *frequency + *phase).sin() * *amplitude;
        }
        MotionPattern::Bounce { dir } => {
            enemy.pos.y += speed;
            enemy.pos.x += *dir * speed * 0.8;
            if enemy.pos.x < enemy.half.x {
                enemy.pos.x = enemy.half.x;
                *dir = 1.0;
            } else if enemy.pos.x > FIELD_WIDTH - enemy.half.x {
                enemy.pos.x = FIELD_WIDTH - enemy.half.x;
                *dir = -1.0;
            }
        }
        MotionPattern::Spiral {
            center,
            angle,
            radius,
            spin,
        } => {
            *angle += *spin;
            *radius = (*radius - SPIRAL_SHRINK).max(0.0);
            center.y += speed;
            enemy.pos = *center + Vec2::new(angle.cos(), angle.sin()) * *radius;
        }
        MotionPattern::StopAndDrop {
            stage,
            slow_speed,
            drop_speed,
        } => match *stage {
            DropStage::Descend { until_ms } => {
                enemy.pos.y += *slow_speed;
                if now > until_ms {
                    *stage = DropStage::Hold {
                        until_ms: now + DROP_HOLD_MS,
                    };
                }
            }
            DropStage::Hold { until_ms } => {
                if now > until_ms {
                    *stage = DropStage::Drop;
                }
            }
            DropStage::Drop => {
                enemy.pos.y += *drop_speed;
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Boss, GameEvent};
    use crate::sim::systems::test_support::{enemy_at, running_state};

    #[test]
    fn test_spawn_delay_curve() {
        assert_eq!(spawn_delay_ms(0), 2000.0);
        assert_eq!(spawn_delay_ms(499), 2000.0);
        assert_eq!(spawn_delay_ms(500), 1975.0);
        assert_eq!(spawn_delay_ms(10_000), 1500.0);
        assert_eq!(spawn_delay_ms(1_000_000), ENEMY_SPAWN_DELAY_MIN_MS);
    }

    #[test]
    fn test_speed_range_caps() {
        assert_eq!(speed_range(0), (1.2, 2.6));
        let (min, max) = speed_range(1_000_000);
        assert_eq!(min, 4.0);
        assert_eq!(max, 5.0);
    }

    #[test]
    fn test_firing_chance_capped() {
        let enemy = enemy_at(Vec2::new(100.0, 100.0));
        assert!((firing_chance(&enemy, 0) - 0.021).abs() < 1e-6);
        assert_eq!(firing_chance(&enemy, 1_000_000), 0.04);
    }

    #[test]
    fn test_spawns_after_delay() {
        let mut state = running_state();
        state.clock_ms = 2000.0;
        update_enemies(&mut state);
        assert!(state.enemies.is_empty());

        state.clock_ms = 2001.0;
        update_enemies(&mut state);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.last_enemy_at, 2001.0);
        assert!(state.enemies[0].variant < 3);
    }

    #[test]
    fn test_no_spawn_during_boss() {
        let mut state = running_state();
        state.boss = Some(Boss::new());
        state.clock_ms = 10_000.0;
        update_enemies(&mut state);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_straight_descends() {
        let mut enemy = enemy_at(Vec2::new(100.0, 50.0));
        move_enemy(&mut enemy, 0.0);
        assert_eq!(enemy.pos, Vec2::new(100.0, 52.0));
    }

    #[test]
    fn test_bounce_reflects_at_edge() {
        let mut enemy = enemy_at(Vec2::new(17.0, 50.0));
        enemy.pattern = MotionPattern::Bounce { dir: -1.0 };
        move_enemy(&mut enemy, 0.0);
        assert_eq!(enemy.pos.x, enemy.half.x);
        assert_eq!(enemy.pattern, MotionPattern::Bounce { dir: 1.0 });
    }

    #[test]
    fn test_sine_weave_stays_near_origin() {
        let mut enemy = enemy_at(Vec2::new(200.0, -20.0));
        enemy.pattern = MotionPattern::SineWeave {
            origin_x: 200.0,
            phase: 0.3,
            frequency: 2.0,
            amplitude: 40.0,
        };
        for _ in 0..300 {
            move_enemy(&mut enemy, 0.0);
            assert!((enemy.pos.x - 200.0).abs() <= 40.0 + 1e-3);
        }
        assert!(enemy.pos.y > 500.0);
    }

    #[test]
    fn test_spiral_descends_and_tightens() {
        let mut enemy = enemy_at(Vec2::ZERO);
        enemy.pattern = MotionPattern::Spiral {
            center: Vec2::new(200.0, -60.0),
            angle: 0.0,
            radius: 100.0,
            spin: 0.05,
        };
        for _ in 0..1000 {
            move_enemy(&mut enemy, 0.0);
        }
        match enemy.pattern {
            MotionPattern::Spiral { radius, center, .. } => {
                assert_eq!(radius, 0.0);
                assert!(center.y > FIELD_HEIGHT);
            }
            other => panic!("pattern changed: {other:?}"),
        }
        assert!(enemy.pos.y > FIELD_HEIGHT + ENEMY_HEIGHT);
    }

    #[test]
    fn test_stop_and_drop_stages() {
        let mut enemy = enemy_at(Vec2::new(100.0, 0.0));
        enemy.pattern = MotionPattern::StopAndDrop {
            stage: DropStage::Descend { until_ms: 100.0 },
            slow_speed: 1.5,
            drop_speed: 4.0,
        };
        move_enemy(&mut enemy, 50.0);
        assert_eq!(enemy.pos.y, 1.5);

        move_enemy(&mut enemy, 101.0);
        assert!(matches!(
            enemy.pattern,
            MotionPattern::StopAndDrop {
                stage: DropStage::Hold { .. },
                ..
            }
        ));
        let held = enemy.pos.y;
        move_enemy(&mut enemy, 300.0);
        assert_eq!(enemy.pos.y, held);

        move_enemy(&mut enemy, 552.0);
        move_enemy(&mut enemy, 560.0);
        assert_eq!(enemy.pos.y, held + 4.0);
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let mut enemy = enemy_at(Vec2::new(100.0, 50.0));
        enemy.pattern = MotionPattern::SineWeave {
            origin_x: f32::NAN,
            phase: 0.0,
            frequency: 1.0,
            amplitude: 10.0,
        };
        move_enemy(&mut enemy, 0.0);
        assert_eq!(enemy.pos, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_prunes_below_field() {
        let mut state = running_state();
        state.enemies.push(enemy_at(Vec2::new(100.0, FIELD_HEIGHT + ENEMY_HEIGHT - 1.0)));
        state.enemies.push(enemy_at(Vec2::new(100.0, 300.0)));
        update_enemies(&mut state);
        assert_eq!(state.enemies.len(), 1);
        assert!(state.enemies[0].pos.y < 310.0);
    }

    #[test]
    fn test_enemies_above_field_do_not_fire() {
        let mut state = running_state();
        for _ in 0..50 {
            state.enemies.push(enemy_at(Vec2::new(100.0, -500.0)));
        }
        for _ in 0..100 {
            update_enemies(&mut state);
        }
        assert!(state.enemy_bullets.is_empty());
        assert!(!state
            .events
            .contains(&GameEvent::Sound(SoundEffect::EnemyFire)));
    }

    #[test]
    fn test_enemies_eventually_fire_straight_down() {
        let mut state = running_state();
        for i in 0..50 {
            state.enemies.push(enemy_at(Vec2::new(8.0 * i as f32 + 4.0, 100.0)));
        }
        for _ in 0..20 {
            update_enemies(&mut state);
        }
        assert!(!state.enemy_bullets.is_empty());
        for bullet in &state.enemy_bullets {
            assert_eq!(bullet.vel.x, 0.0);
            assert!((4.2..=6.2).contains(&bullet.vel.y));
        }
    }
}
