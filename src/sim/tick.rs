//! Fixed timestep simulation tick
//!
//! Drives the phase state machine and runs the per-tick pipeline while
//! running: stars, map scroll, entity systems, then collision resolution.

use super::combat::resolve_collisions;
use super::state::{GamePhase, GameState};
use super::systems::{
    update_boss, update_bullets, update_enemies, update_items, update_player, update_stars,
};
use crate::consts::*;

/// Logical input actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Fire,
    Bomb,
}

/// Which actions are currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actions {
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub fire: bool,
    pub bomb: bool,
}

impl Actions {
    pub fn set(&mut self, action: Action, pressed: bool) {
        *self.slot(action) = pressed;
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        match action {
            Action::MoveLeft => self.move_left,
            Action::MoveRight => self.move_right,
            Action::MoveUp => self.move_up,
            Action::MoveDown => self.move_down,
            Action::Fire => self.fire,
            Action::Bomb => self.bomb,
        }
    }

    fn slot(&mut self, action: Action) -> &mut bool {
        match action {
            Action::MoveLeft => &mut self.move_left,
            Action::MoveRight => &mut self.move_right,
            Action::MoveUp => &mut self.move_up,
            Action::MoveDown => &mut self.move_down,
            Action::Fire => &mut self.fire,
            Action::Bomb => &mut self.bomb,
        }
    }
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub actions: Actions,
    /// A key press, click or touch arrived since the last tick
    pub gesture: bool,
    /// Explicit restart command (honored on the game-over screen)
    pub restart: bool,
}

/// Advance the game state by `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    if dt_ms.is_finite() && dt_ms > 0.0 {
        state.clock_ms += dt_ms;
    }
    let now = state.now();

    match state.phase {
        GamePhase::Paused => {
            if input.gesture {
                state.phase = GamePhase::Running;
                log::info!("Game started");
            }
            return;
        }
        GamePhase::RespawnPause => {
            if state.respawn_until.is_some_and(|t| now < t) {
                return;
            }
            if input.gesture {
                resume_after_respawn(state);
            }
            return;
        }
        GamePhase::GameOver => {
            if input.restart {
                state.restart();
            }
            return;
        }
        GamePhase::Running => {}
    }

    update_stars(state);
    state.scroll.advance(MAP_SCROLL_SPEED);
    update_player(state, &input.actions);
    update_enemies(state);
    update_boss(state);
    update_bullets(state);
    update_items(state);
    resolve_collisions(state);
}

/// Leave the respawn pause; invincibility starts now, not when the pause ended
fn resume_after_respawn(state: &mut GameState) {
    state.phase = GamePhase::Running;
    state.respawn_until = None;
    if state.pending_invincibility {
        state.invincible_until = Some(state.now() + RESPAWN_INVINCIBLE_MS);
        state.pending_invincibility = false;
    }
    log::info!("Resumed after respawn");
}

/// Whether the loop is waiting on a gesture to continue
pub fn awaiting_gesture(state: &GameState) -> bool {
    match state.phase {
        GamePhase::Paused => true,
        GamePhase::RespawnPause => state.respawn_until.is_none_or(|t| state.now() >= t),
        GamePhase::Running | GamePhase::GameOver => false,
    }
}
