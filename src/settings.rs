//! Game settings and preferences
//!
//! Preferences survive `restart()`. They are read from a JSON string supplied
//! by the host (page config or a file); nothing is written back.

use serde::{Deserialize, Serialize};

use crate::consts::{PLAYER_SPEED, TOUCH_SPEED_BOOST};

/// Map cycle the scroll buffer loops through
pub const DEFAULT_MAP_CYCLE: [&str; 7] = [
    "deepspace",
    "test",
    "asteroids",
    "deepspace",
    "nebula",
    "deepspace",
    "bigbase",
];

/// Step used by the music volume keys
pub const MUSIC_VOLUME_STEP: f32 = 0.1;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub music_enabled: bool,

    // === Controls ===
    /// Touch play; moves the ship faster to make up for thumb travel
    pub touch_controls: bool,

    // === Visual Effects ===
    /// Screen shake on bomb detonation
    pub screen_shake: bool,
    /// Reduced motion (no shake)
    pub reduced_motion: bool,

    // === World ===
    /// Map names, looped in order
    pub map_cycle: Vec<String>,
    /// Fixed RNG seed (random when absent)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            music_enabled: true,

            touch_controls: false,

            screen_shake: true,
            reduced_motion: false,

            map_cycle: DEFAULT_MAP_CYCLE.iter().map(|s| s.to_string()).collect(),
            seed: None,
        }
    }
}

impl Settings {
    /// Parse settings, falling back to defaults when the JSON is unusable
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Invalid settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Clamp volumes and restore an empty map cycle
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        if self.map_cycle.is_empty() {
            log::warn!("Empty map cycle in settings, using the default cycle");
            self.map_cycle = Self::default().map_cycle;
        }
        self
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Player speed in px/tick for the current control scheme
    pub fn player_speed(&self) -> f32 {
        if self.touch_controls {
            PLAYER_SPEED * TOUCH_SPEED_BOOST
        } else {
            PLAYER_SPEED
        }
    }

    pub fn toggle_music(&mut self) -> bool {
        self.music_enabled = !self.music_enabled;
        self.music_enabled
    }

    /// Step music volume by whole increments, staying in [0, 1]
    pub fn step_music_volume(&mut self, steps: i32) -> f32 {
        let volume = self.music_volume + steps as f32 * MUSIC_VOLUME_STEP;
        // Round to the step grid so repeated presses do not drift
        self.music_volume = ((volume / MUSIC_VOLUME_STEP).round() * MUSIC_VOLUME_STEP).clamp(0.0, 1.0);
        self.music_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.map_cycle.len(), 7);
        assert_eq!(settings.map_cycle[0], "deepspace");
        assert_eq!(settings.map_cycle[6], "bigbase");
        assert!(settings.music_enabled);
        assert_eq!(settings.player_speed(), PLAYER_SPEED);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"touch_controls": true, "seed": 5}"#);
        assert!(settings.touch_controls);
        assert_eq!(settings.seed, Some(5));
        assert_eq!(settings.map_cycle, Settings::default().map_cycle);
        assert!((settings.player_speed() - 5.6).abs() < 1e-6);
    }

    #[test]
    fn test_bad_json_falls_back() {
        assert_eq!(Settings::from_json("{nope"), Settings::default());
    }

    #[test]
    fn test_sanitize() {
        let settings = Settings::from_json(r#"{"music_volume": 3.0, "map_cycle": []}"#);
        assert_eq!(settings.music_volume, 1.0);
        assert_eq!(settings.map_cycle.len(), 7);
    }

    #[test]
    fn test_music_volume_steps() {
        let mut settings = Settings::default();
        assert!((settings.step_music_volume(1) - 0.6).abs() < 1e-6);
        for _ in 0..10 {
            settings.step_music_volume(1);
        }
        assert_eq!(settings.music_volume, 1.0);
        for _ in 0..15 {
            settings.step_music_volume(-1);
        }
        assert_eq!(settings.music_volume, 0.0);
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_screen_shake());
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            music_enabled: false,
            seed: Some(77),
            ..Settings::default()
        };
        assert_eq!(Settings::from_json(&settings.to_json()), settings);
    }
}
