//! Falling power-ups and pickup effects

use crate::audio::SoundEffect;
use crate::consts::*;
use crate::sim::collision::circle_near_rect;
use crate::sim::state::{GameState, ItemKind, Shield};

/// Items below this y are gone
const ITEM_FLOOR: f32 = FIELD_HEIGHT + 20.0;

/// Move items, prune them, and apply any the player touches
pub fn update_items(state: &mut GameState) {
    for item in &mut state.items {
        item.pos.y += item.vy;
    }
    state.items.retain(|item| item.pos.y < ITEM_FLOOR);

    let player = state.player;
    for i in (0..state.items.len()).rev() {
        let item = state.items[i];
        if circle_near_rect(item.pos, item.radius, player.pos, player.half) {
            state.items.remove(i);
            apply_pickup(state, item.kind);
        }
    }
}

/// Apply one pickup's effect
pub fn apply_pickup(state: &mut GameState, kind: ItemKind) {
    let now = state.now();
    match kind {
        ItemKind::TripleFire => {
            state.triple_fire_until = Some(now + TRIPLE_FIRE_MS);
            state.play(SoundEffect::TripleFirePickup);
        }
        ItemKind::Shield => {
            state.shield = Some(Shield {
                until_ms: now + SHIELD_MS,
                hits: SHIELD_HITS,
            });
            state.play(SoundEffect::ShieldUp);
        }
        ItemKind::BombRefill => {
            // Wasted when already full
            if state.bomb_count < BOMB_MAX {
                state.bomb_count += 1;
                state.bomb_refill_at = Some(now);
                state.play(SoundEffect::BombRefillPickup);
            }
        }
        ItemKind::LifeUp => {
            state.lives += 1;
            state.bomb_refill_at = Some(now);
            state.play(SoundEffect::LifeUpPickup);
        }
    }
}
