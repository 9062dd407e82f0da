//! Per-tick entity update systems
//!
//! Each system owns one entity collection. Damage to the player is never
//! applied here; contact and hit resolution live in `combat`.

pub mod boss;
pub mod bullet;
pub mod enemy;
pub mod item;
pub mod player;
pub mod stars;

pub use boss::update_boss;
pub use bullet::update_bullets;
pub use enemy::update_enemies;
pub use item::update_items;
pub use player::update_player;
pub use stars::update_stars;

/// True when no timestamp is recorded or more than `cooldown_ms` has passed
#[inline]
pub(crate) fn cooldown_elapsed(last: Option<f64>, now: f64, cooldown_ms: f64) -> bool {
    last.is_none_or(|t| now - t > cooldown_ms)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_elapsed() {
        assert!(cooldown_elapsed(None, 0.0, 200.0));
        assert!(!cooldown_elapsed(Some(100.0), 300.0, 200.0));
        assert!(cooldown_elapsed(Some(100.0), 300.5, 200.0));
    }
}
