//! Decorative starfield drift

use rand::Rng;

use crate::consts::*;
use crate::sim::state::{GameState, Star};

/// Move stars down; stars leaving the bottom re-enter at the top with new looks
pub fn update_stars(state: &mut GameState) {
    for star in &mut state.stars {
        star.pos.y += star.speed;
        if star.pos.y > FIELD_HEIGHT {
            let y = -state.rng.random::<f32>() * 4.0;
            *star = Star::random(&mut state.rng, y);
        }
    }
}
