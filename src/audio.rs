//! Sound cues
//!
//! The simulation only names the moment a sound should play. Synthesis happens
//! in a host-provided backend behind [`AudioManager`], which owns volume and
//! mute handling. Playback is fire-and-forget and can never fail the game.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Player auto-fire
    Shoot,
    /// Player took damage
    PlayerDamage,
    /// Regular enemy destroyed
    Explosion,
    /// Boss destroyed
    BossExplosion,
    /// Boss attack started
    BossShoot,
    /// Power-up collected
    PowerUp,
    /// Level advanced
    LevelUp,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Shoot => "shoot",
            Cue::PlayerDamage => "player-damage",
            Cue::Explosion => "explosion",
            Cue::BossExplosion => "boss-explosion",
            Cue::BossShoot => "boss-shoot",
            Cue::PowerUp => "power-up",
            Cue::LevelUp => "level-up",
        }
    }
}

/// Anything that accepts cues from the session
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// Drops every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl CueSink for Silence {
    fn play(&mut self, _cue: Cue) {}
}

/// Host synthesizer; receives the already mixed volume
pub trait CueBackend {
    fn trigger(&mut self, cue: Cue, volume: f32);
}

/// Backend that only logs, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBackend;

impl CueBackend for LogBackend {
    fn trigger(&mut self, cue: Cue, volume: f32) {
        log::debug!("cue {} @ {:.2}", cue.as_str(), volume);
    }
}

/// Shared list of every cue played, for inspection
#[derive(Debug, Default, Clone)]
pub struct CueLog(Rc<RefCell<Vec<Cue>>>);

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.0.borrow().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.0.borrow().iter().filter(|c| **c == cue).count()
    }
}

impl CueSink for CueLog {
    fn play(&mut self, cue: Cue) {
        self.0.borrow_mut().push(cue);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn CueBackend>>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    /// A manager without a backend stays silent
    pub fn new(backend: Option<Box<dyn CueBackend>>) -> Self {
        if backend.is_none() {
            log::warn!("No audio backend - audio disabled");
        }
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Take volume and mute from settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

impl CueSink for AudioManager {
    fn play(&mut self, cue: Cue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.trigger(cue, vol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(Cue, f32)>>>);

    impl CueBackend for Recorder {
        fn trigger(&mut self, cue: Cue, volume: f32) {
            self.0.borrow_mut().push((cue, volume));
        }
    }

    #[test]
    fn test_muted_manager_skips_backend() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Some(Box::new(recorder.clone())));
        audio.play(Cue::Shoot);
        audio.set_muted(true);
        audio.play(Cue::Shoot);
        assert_eq!(recorder.0.borrow().len(), 1);
    }

    #[test]
    fn test_volume_is_mixed() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::new(Some(Box::new(recorder.clone())));
        audio.set_master_volume(0.5);
        audio.set_sfx_volume(2.0);
        audio.play(Cue::LevelUp);
        assert_eq!(recorder.0.borrow()[0], (Cue::LevelUp, 0.5));
    }

    #[test]
    fn test_cue_log_counts() {
        let log = CueLog::new();
        let mut sink = log.clone();
        sink.play(Cue::Explosion);
        sink.play(Cue::Explosion);
        sink.play(Cue::PowerUp);
        assert_eq!(log.count(Cue::Explosion), 2);
        assert_eq!(log.cues().len(), 3);
    }
}
