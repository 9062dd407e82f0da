//! Frame driver
//!
//! Turns wall-clock frames into fixed simulation ticks, latches one-shot
//! input between ticks and forwards sound and music changes to the audio
//! sink. The platform layer owns one `Game` and calls `frame` once per
//! animation frame.

use std::rc::Rc;

use crate::audio::{AudioSink, MusicTrack, desired_track, music_intensity};
use crate::consts::*;
use crate::render::HudSnapshot;
use crate::settings::Settings;
use crate::sim::{Action, Actions, GameEvent, GameState, MapLibrary, TickInput, tick};

/// Intensity changes smaller than this are not forwarded
const INTENSITY_EPSILON: f32 = 0.01;

pub struct Game {
    state: GameState,
    settings: Settings,
    audio: Box<dyn AudioSink>,
    /// Unsimulated time carried between frames (ms)
    accumulator: f64,
    last_time: Option<f64>,
    input: TickInput,
    current_track: Option<MusicTrack>,
    last_intensity: Option<f32>,
}

impl Game {
    pub fn new(
        seed: u64,
        library: Rc<MapLibrary>,
        settings: Settings,
        mut audio: Box<dyn AudioSink>,
    ) -> Self {
        let mut state = GameState::new(seed, library);
        state.player_speed = settings.player_speed();
        audio.apply_settings(&settings);
        log::info!(
            "Game created (seed: {}, maps: {})",
            seed,
            state.scroll.library().len()
        );

        let mut game = Self {
            state,
            settings,
            audio,
            accumulator: 0.0,
            last_time: None,
            input: TickInput::default(),
            current_track: None,
            last_intensity: None,
        };
        game.sync_music();
        game
    }

    /// Advance to `timestamp_ms` (monotonic, e.g. the animation frame time).
    /// Returns the number of ticks run.
    pub fn frame(&mut self, timestamp_ms: f64) -> u32 {
        let elapsed = match self.last_time {
            Some(last) if timestamp_ms.is_finite() => (timestamp_ms - last).clamp(0.0, MAX_FRAME_MS),
            // First frame runs one tick so the loop starts immediately
            None => SIM_DT_MS,
            Some(_) => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_time = Some(timestamp_ms);
        }
        self.accumulator += elapsed;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT_MS;
            substeps += 1;
        }
        // Drop backlog we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT_MS);
        }
        substeps
    }

    /// Run exactly one simulation tick
    pub fn step(&mut self) {
        let input = self.input;
        tick(&mut self.state, &input, SIM_DT_MS);

        // Clear one-shot inputs after processing
        self.input.gesture = false;
        self.input.restart = false;

        for event in self.state.drain_events() {
            self.dispatch(event);
        }
        self.sync_music();
    }

    fn dispatch(&mut self, event: GameEvent) {
        match event {
            GameEvent::Sound(effect) => self.audio.play_effect(effect),
            GameEvent::BossSpawned => log::debug!("Boss warning shown"),
            GameEvent::BossDefeated { score } => log::info!("Boss down, score {}", score),
            GameEvent::PlayerHit { lives } => log::debug!("Player hit, {} lives left", lives),
            GameEvent::GameOver { score } => log::info!("Final score: {}", score),
        }
    }

    fn sync_music(&mut self) {
        let track = desired_track(&self.state);
        if self.current_track != Some(track) {
            log::debug!("Music track: {:?}", track);
            self.audio.set_music_track(track);
            self.current_track = Some(track);
        }

        let intensity = if self.settings.music_enabled {
            music_intensity(&self.state)
        } else {
            0.0
        };
        let changed = self
            .last_intensity
            .is_none_or(|last| (last - intensity).abs() >= INTENSITY_EPSILON);
        if changed {
            self.audio.set_music_intensity(intensity);
            self.last_intensity = Some(intensity);
        }
    }

    /// Key press, click or touch. Starts or resumes play at the next tick.
    pub fn on_gesture(&mut self) {
        self.input.gesture = true;
        self.audio.resume();
    }

    pub fn set_action(&mut self, action: Action, pressed: bool) {
        self.input.actions.set(action, pressed);
    }

    /// Let go of every held action (focus loss)
    pub fn release_actions(&mut self) {
        self.input.actions = Actions::default();
    }

    /// Restart from the game-over screen at the next tick
    pub fn request_restart(&mut self) {
        self.input.restart = true;
    }

    /// Immediate restart (keeps settings and the RNG stream)
    pub fn restart(&mut self) {
        self.state.restart();
        self.accumulator = 0.0;
        self.input = TickInput::default();
        self.sync_music();
    }

    pub fn toggle_music(&mut self) -> bool {
        let enabled = self.settings.toggle_music();
        self.audio.apply_settings(&self.settings);
        // Force the intensity through on the next sync
        self.last_intensity = None;
        self.sync_music();
        log::info!("Music {}", if enabled { "on" } else { "off" });
        enabled
    }

    pub fn adjust_music_volume(&mut self, steps: i32) -> f32 {
        let volume = self.settings.step_music_volume(steps);
        self.audio.apply_settings(&self.settings);
        log::debug!("Music volume: {:.1}", volume);
        volume
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::from_state(&self.state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
