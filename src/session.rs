//! Simulation driver
//!
//! A [`Session`] owns the world, gates ticking on the host's phase, and fans
//! the world's per-frame events out to observer hooks and the audio sink.
//! Presentation reads the world only through [`Session::snapshot`].

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::audio::{CueSink, Silence};
use crate::settings::Settings;
use crate::sim::{
    ActivePowerUp, Body, Boss, Bullet, Enemy, FrameInput, GameEvent, Particle, PowerUp, World,
    tick,
};

/// Host lifecycle state; only `Playing` advances the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostPhase {
    #[default]
    Menu,
    Playing,
    GameOver,
}

/// Latest pointer sample, shared between an input listener and the session
#[derive(Debug, Clone, Default)]
pub struct PointerCell(Rc<Cell<Option<Vec2>>>);

impl PointerCell {
    pub fn set(&self, pos: Vec2) {
        self.0.set(Some(pos));
    }

    pub fn get(&self) -> Option<Vec2> {
        self.0.get()
    }
}

/// Outward notifications. All methods default to no-ops.
pub trait SessionHooks {
    fn on_score(&mut self, _score: u64) {}
    /// The host typically refreshes lore from here
    fn on_level_up(&mut self, _level: u32) {}
    fn on_game_over(&mut self, _final_score: u64) {}
}

struct NoHooks;

impl SessionHooks for NoHooks {}

/// Read-only view of one frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: HostPhase,
    pub level: u32,
    pub score: u64,
    pub health: f32,
    pub power_up: Option<ActivePowerUp>,
    pub player: &'a Body,
    pub enemies: &'a [Enemy],
    pub boss: Option<&'a Boss>,
    pub player_bullets: &'a [Bullet],
    pub enemy_bullets: &'a [Bullet],
    pub power_ups: &'a [PowerUp],
    pub particles: &'a [Particle],
    /// Zero when shake is disabled in settings
    pub shake: f32,
}

pub struct Session {
    world: World,
    phase: HostPhase,
    settings: Settings,
    hooks: Box<dyn SessionHooks>,
    audio: Box<dyn CueSink>,
    pointer: PointerCell,
    autopilot: bool,
}

impl Session {
    pub fn new(seed: u64, settings: Settings) -> Self {
        let mut world = World::new(seed, Vec2::ZERO);
        world.max_particles = settings.max_particles();
        Self {
            world,
            phase: HostPhase::Menu,
            settings,
            hooks: Box::new(NoHooks),
            audio: Box::new(Silence),
            pointer: PointerCell::default(),
            autopilot: false,
        }
    }

    /// Drive the session from a different dice source (replays, tests)
    pub fn with_world(mut self, mut world: World) -> Self {
        world.max_particles = self.settings.max_particles();
        self.world = world;
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn CueSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Handle for the input listener
    pub fn pointer(&self) -> PointerCell {
        self.pointer.clone()
    }

    /// Let the ship steer itself instead of following the pointer
    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Exclusive access for scripted setups and replay tooling
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.world.max_particles = settings.max_particles();
        self.settings = settings;
    }

    /// Enter `Playing` with a fully reset world
    pub fn start(&mut self, arena: Vec2) {
        self.world.reset(arena);
        self.world.max_particles = self.settings.max_particles();
        self.phase = HostPhase::Playing;
        log::info!(
            "Session started (seed {}, arena {}x{})",
            self.world.seed,
            arena.x,
            arena.y
        );
        self.hooks.on_score(0);
        self.hooks.on_level_up(self.world.level);
    }

    /// Drop back to the menu without touching the world
    pub fn return_to_menu(&mut self) {
        self.phase = HostPhase::Menu;
    }

    /// Run one frame. Does nothing outside `Playing`.
    pub fn advance(&mut self, elapsed_ms: f32, arena: Vec2) {
        if self.phase != HostPhase::Playing {
            return;
        }

        let input = FrameInput {
            pointer: self.pointer.get(),
            elapsed_ms,
            arena: (arena != self.world.arena).then_some(arena),
            autopilot: self.autopilot,
        };
        tick(&mut self.world, &input);
        self.dispatch_events();
    }

    fn dispatch_events(&mut self) {
        for event in std::mem::take(&mut self.world.events) {
            match event {
                GameEvent::ScoreChanged(score) => self.hooks.on_score(score),
                GameEvent::LevelUp(level) => self.hooks.on_level_up(level),
                GameEvent::GameOver { final_score } => {
                    self.phase = HostPhase::GameOver;
                    self.hooks.on_game_over(final_score);
                }
                GameEvent::Sound(cue) => self.audio.play(cue),
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let world = &self.world;
        Snapshot {
            phase: self.phase,
            level: world.level,
            score: world.player.score,
            health: world.player.health,
            power_up: world.player.power_up,
            player: &world.player.body,
            enemies: &world.enemies,
            boss: world.boss.as_ref(),
            player_bullets: &world.player_bullets,
            enemy_bullets: &world.enemy_bullets,
            power_ups: &world.power_ups,
            particles: &world.particles,
            shake: if self.settings.effective_screen_shake() {
                world.shake
            } else {
                0.0
            },
        }
    }
}
