//! Sound and music
//!
//! The simulation only emits [`SoundEffect`]s as events; a host-side
//! [`AudioSink`] turns them into noise. On wasm32 that is [`AudioManager`],
//! which synthesizes every effect with Web Audio oscillators (no sample files).

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{GamePhase, GameState};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player shot
    Fire,
    /// Enemy or boss shot
    EnemyFire,
    /// Bullet struck an enemy, boss or tile
    Hit,
    /// Player lost a life
    Explosion,
    /// Shield raised or absorbed a hit
    ShieldUp,
    ShieldBreak,
    /// Bomb launch, boss arrival and boss death
    BombDetonate,
    BombRefillPickup,
    LifeUpPickup,
    TripleFirePickup,
    GameOver,
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Menu,
    Gameplay,
    Boss,
}

/// Music intensity on the menu / game-over screen
pub const MENU_INTENSITY: f32 = 0.3;

/// Receiver for sound and music requests (fire and forget)
pub trait AudioSink {
    fn play_effect(&mut self, effect: SoundEffect);
    fn set_music_track(&mut self, track: MusicTrack);
    /// Intensity in [0, 1]
    fn set_music_intensity(&mut self, intensity: f32);
    /// Pick up volume and music preferences
    fn apply_settings(&mut self, _settings: &Settings) {}
    /// Unlock audio output after a user gesture
    fn resume(&mut self) {}
}

/// Silent sink for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_effect(&mut self, _effect: SoundEffect) {}
    fn set_music_track(&mut self, _track: MusicTrack) {}
    fn set_music_intensity(&mut self, _intensity: f32) {}
}

/// Track that should be playing for the current state
pub fn desired_track(state: &GameState) -> MusicTrack {
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => MusicTrack::Menu,
        GamePhase::Running | GamePhase::RespawnPause if state.boss.is_some() => MusicTrack::Boss,
        GamePhase::Running | GamePhase::RespawnPause => MusicTrack::Gameplay,
    }
}

/// Music intensity for the current state, in [0, 1]
///
/// Rises with enemies and bullets on screen and when down to the last life,
/// drops while shielded. Boss fights ramp from 0.8 up to 1.0 as the boss
/// loses health.
pub fn music_intensity(state: &GameState) -> f32 {
    if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) {
        return MENU_INTENSITY;
    }
    if let Some(boss) = state.boss {
        return 0.8 + 0.2 * (1.0 - boss.hp_fraction());
    }

    let mut intensity = (state.enemies.len() as f32 / 10.0).min(0.3)
        + (state.enemy_bullets.len() as f32 / 15.0).min(0.2);
    if state.lives < 2 {
        intensity += 0.3;
    }
    if state.is_shielded() {
        intensity -= 0.2;
    }
    intensity.clamp(0.0, 1.0)
}

/// Oscillator shapes used by the synth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One synthesized blip: a start pitch, linear pitch ramps, and a gain that
/// fades linearly to silence over `duration`
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f32,
    /// (seconds after start, target frequency)
    pub ramps: Vec<(f64, f32)>,
    pub duration: f64,
    pub gain: f32,
}

impl Tone {
    fn flat(waveform: Waveform, hz: f32, duration: f64, gain: f32) -> Self {
        Self {
            waveform,
            start_hz: hz,
            ramps: Vec::new(),
            duration,
            gain,
        }
    }

    fn sweep(waveform: Waveform, hz: f32, ramps: &[(f64, f32)], duration: f64, gain: f32) -> Self {
        Self {
            waveform,
            start_hz: hz,
            ramps: ramps.to_vec(),
            duration,
            gain,
        }
    }
}

/// Synth recipe for an effect. `jitter` in [0, 1) varies the enemy shot.
pub fn tone_for(effect: SoundEffect, jitter: f32) -> Tone {
    use Waveform::*;
    match effect {
        SoundEffect::Fire => Tone::flat(Square, 480.0, 0.07, 0.18),
        SoundEffect::Hit => Tone::flat(Square, 140.0, 0.17, 0.27),
        SoundEffect::GameOver => Tone::flat(Triangle, 52.0, 0.7, 0.33),
        SoundEffect::BombDetonate => Tone::sweep(Sawtooth, 200.0, &[(0.595, 820.0)], 0.7, 0.32),
        SoundEffect::TripleFirePickup => {
            Tone::sweep(Triangle, 330.0, &[(0.08, 660.0), (0.2, 220.0)], 0.23, 0.31)
        }
        SoundEffect::ShieldUp => Tone::sweep(Sine, 220.0, &[(0.23, 520.0)], 0.26, 0.22),
        SoundEffect::ShieldBreak => Tone::sweep(Square, 340.0, &[(0.14, 90.0)], 0.18, 0.36),
        SoundEffect::BombRefillPickup => Tone::sweep(Triangle, 200.0, &[(0.21, 740.0)], 0.21, 0.33),
        SoundEffect::EnemyFire => Tone::sweep(
            Square,
            190.0,
            &[(0.13, 280.0 + jitter * 60.0)],
            0.15,
            0.13 + jitter * 0.05,
        ),
        SoundEffect::LifeUpPickup => Tone::sweep(Triangle, 400.0, &[(0.11, 840.0)], 0.25, 0.25),
        SoundEffect::Explosion => Tone::sweep(Triangle, 180.0, &[(0.22, 60.0)], 0.25, 0.38),
    }
}

/// Drone pitch and shape for a music track
pub fn drone_for(track: MusicTrack) -> (Waveform, f32) {
    match track {
        MusicTrack::Menu => (Waveform::Sine, 110.0),
        MusicTrack::Gameplay => (Waveform::Triangle, 146.83),
        MusicTrack::Boss => (Waveform::Sawtooth, 98.0),
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::*;

    /// Peak drone gain before volume scaling
    const DRONE_GAIN: f32 = 0.08;

    fn oscillator_type(waveform: Waveform) -> OscillatorType {
        match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Triangle => OscillatorType::Triangle,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        }
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        music_volume: f32,
        music_enabled: bool,
        drone: Option<(OscillatorNode, GainNode)>,
        track: Option<MusicTrack>,
        intensity: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                music_volume: 0.5,
                music_enabled: true,
                drone: None,
                track: None,
                intensity: 0.0,
            }
        }

        fn sfx_gain(&self) -> f32 {
            self.master_volume * self.sfx_volume
        }

        fn music_gain(&self) -> f32 {
            if !self.music_enabled {
                return 0.0;
            }
            // Keep a floor so calm stretches are not silent
            self.master_volume * self.music_volume * DRONE_GAIN * (0.35 + 0.65 * self.intensity)
        }

        /// Create an oscillator wired through a gain node to the output
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            waveform: Waveform,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(oscillator_type(waveform));
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(ctx: &AudioContext, tone: &Tone, vol: f32) {
            let Some((osc, gain)) = Self::create_osc(ctx, tone.start_hz, tone.waveform) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(tone.start_hz, t).ok();
            for &(at, hz) in &tone.ramps {
                osc.frequency().linear_ramp_to_value_at_time(hz, t + at).ok();
            }
            gain.gain().set_value_at_time(vol * tone.gain, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.0, t + tone.duration)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + tone.duration).ok();
        }

        fn stop_drone(&mut self) {
            if let (Some((osc, gain)), Some(ctx)) = (self.drone.take(), &self.ctx) {
                let t = ctx.current_time();
                gain.gain().set_target_at_time(0.0, t, 0.15).ok();
                osc.stop_with_when(t + 0.6).ok();
            }
        }

        fn start_drone(&mut self, track: MusicTrack) {
            let Some(ctx) = &self.ctx else { return };
            let (waveform, hz) = drone_for(track);
            let Some((osc, gain)) = Self::create_osc(ctx, hz, waveform) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().set_target_at_time(self.music_gain(), t, 0.3).ok();
            osc.start().ok();
            self.drone = Some((osc, gain));
        }

        fn refresh_drone_gain(&self) {
            if let (Some((_, gain)), Some(ctx)) = (&self.drone, &self.ctx) {
                gain.gain()
                    .set_target_at_time(self.music_gain(), ctx.current_time(), 0.2)
                    .ok();
            }
        }
    }

    impl AudioSink for AudioManager {
        fn play_effect(&mut self, effect: SoundEffect) {
            let vol = self.sfx_gain();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend the context until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            let tone = tone_for(effect, js_sys::Math::random() as f32);
            Self::play_tone(ctx, &tone, vol);
        }

        fn set_music_track(&mut self, track: MusicTrack) {
            if self.track == Some(track) {
                return;
            }
            self.stop_drone();
            self.track = Some(track);
            self.start_drone(track);
        }

        fn set_music_intensity(&mut self, intensity: f32) {
            self.intensity = intensity.clamp(0.0, 1.0);
            self.refresh_drone_gain();
        }

        fn apply_settings(&mut self, settings: &Settings) {
            self.master_volume = settings.master_volume.clamp(0.0, 1.0);
            self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
            self.music_volume = settings.music_volume.clamp(0.0, 1.0);
            self.music_enabled = settings.music_enabled;
            self.refresh_drone_gain();
        }

        fn resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::sim::{Boss, EnemyBullet, MapLibrary, Shield};

    fn state() -> GameState {
        GameState::new(1, Rc::new(MapLibrary::fallback()))
    }

    #[test]
    fn test_track_follows_phase_and_boss() {
        let mut state = state();
        assert_eq!(desired_track(&state), MusicTrack::Menu);
        state.phase = GamePhase::Running;
        assert_eq!(desired_track(&state), MusicTrack::Gameplay);
        state.boss = Some(Boss::new());
        assert_eq!(desired_track(&state), MusicTrack::Boss);
        state.phase = GamePhase::GameOver;
        assert_eq!(desired_track(&state), MusicTrack::Menu);
    }

    #[test]
    fn test_intensity_rises_with_danger() {
        let mut state = state();
        state.phase = GamePhase::Running;
        assert_eq!(music_intensity(&state), 0.0);

        for _ in 0..20 {
            state.enemy_bullets.push(EnemyBullet {
                pos: Vec2::ZERO,
                vel: Vec2::Y,
                radius: 5.0,
                variant: 0,
            });
        }
        assert!((music_intensity(&state) - 0.2).abs() < 1e-6);

        state.lives = 1;
        assert!((music_intensity(&state) - 0.5).abs() < 1e-6);

        state.shield = Some(Shield {
            until_ms: 1000.0,
            hits: 1,
        });
        assert!((music_intensity(&state) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_intensity_never_negative() {
        let mut state = state();
        state.phase = GamePhase::Running;
        state.shield = Some(Shield {
            until_ms: 1000.0,
            hits: 3,
        });
        assert_eq!(music_intensity(&state), 0.0);
    }

    #[test]
    fn test_boss_intensity_ramps() {
        let mut state = state();
        state.phase = GamePhase::Running;
        state.boss = Some(Boss::new());
        assert!((music_intensity(&state) - 0.8).abs() < 1e-6);
        state.boss = Some(Boss { hp: 0, ..Boss::new() });
        assert!((music_intensity(&state) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tone_table() {
        let fire = tone_for(SoundEffect::Fire, 0.0);
        assert_eq!(fire.waveform, Waveform::Square);
        assert_eq!(fire.start_hz, 480.0);
        assert!(fire.ramps.is_empty());

        let bomb = tone_for(SoundEffect::BombDetonate, 0.0);
        assert_eq!(bomb.waveform, Waveform::Sawtooth);
        assert_eq!(bomb.ramps.last().map(|r| r.1), Some(820.0));

        let low = tone_for(SoundEffect::EnemyFire, 0.0);
        let high = tone_for(SoundEffect::EnemyFire, 0.99);
        assert!(high.gain > low.gain);
        assert!(high.ramps[0].1 > low.ramps[0].1);
    }

    #[test]
    fn test_ramps_end_within_duration() {
        let effects = [
            SoundEffect::Fire,
            SoundEffect::EnemyFire,
            SoundEffect::Hit,
            SoundEffect::Explosion,
            SoundEffect::ShieldUp,
            SoundEffect::ShieldBreak,
            SoundEffect::BombDetonate,
            SoundEffect::BombRefillPickup,
            SoundEffect::LifeUpPickup,
            SoundEffect::TripleFirePickup,
            SoundEffect::GameOver,
        ];
        for effect in effects {
            let tone = tone_for(effect, 0.5);
            assert!(tone.gain > 0.0 && tone.gain < 0.5, "{effect:?}");
            for (at, _) in &tone.ramps {
                assert!(*at <= tone.duration, "{effect:?}");
            }
        }
    }
}
