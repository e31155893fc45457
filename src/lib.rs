//! Nebula Strike - a vertical arcade shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, combat, bosses)
//! - `session`: Frame driver, host lifecycle and outward notifications
//! - `audio`: Named sound cues and the volume gate in front of a backend
//! - `lore`: Per-level flavor text with a deterministic fallback
//! - `settings`: Player preferences persisted as JSON

pub mod audio;
pub mod lore;
pub mod session;
pub mod settings;
pub mod sim;

pub use audio::{AudioManager, Cue, CueSink};
pub use lore::{Lore, LoreBoard, LoreError, LoreSource};
pub use session::{HostPhase, PointerCell, Session, SessionHooks, Snapshot};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game balance constants
pub mod consts {
    /// Nominal frame duration used when a host cannot report elapsed time
    pub const FRAME_MS: f32 = 16.0;
    /// Elapsed time is clamped to this per frame (tab switches, debugger stops)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Player ship
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    /// Spawn height above the bottom edge
    pub const PLAYER_SPAWN_OFFSET: f32 = 80.0;
    /// Fraction of the pointer delta covered each tick
    pub const PLAYER_FOLLOW_DAMPING: f32 = 0.18;

    /// Auto-fire cooldowns (ms)
    pub const FIRE_COOLDOWN_MS: f64 = 170.0;
    pub const TRIPLE_FIRE_COOLDOWN_MS: f64 = 110.0;
    /// Triple shot fan (radians off vertical)
    pub const TRIPLE_FAN: [f32; 3] = [-0.2, 0.0, 0.2];

    /// Player bullets
    pub const PLAYER_BULLET_SPEED: f32 = 14.0;
    pub const PLAYER_BULLET_DAMAGE: f32 = 1.0;
    pub const PLAYER_BULLET_WIDTH: f32 = 5.0;
    pub const PLAYER_BULLET_HEIGHT: f32 = 18.0;

    /// Damage taken by the player
    pub const CONTACT_DAMAGE: f32 = 25.0;
    /// Enemy bullets carry their own damage. Only the boss fires, so there is
    /// no separate value for regular-enemy shots.
    pub const SPREAD_BULLET_DAMAGE: f32 = 10.0;
    pub const AIMED_BULLET_DAMAGE: f32 = 15.0;
    /// Shield timer lost when a shielded player rams an enemy (ms)
    pub const SHIELD_CONTACT_PENALTY_MS: f32 = 1500.0;

    /// Power-ups
    pub const POWERUP_DURATION_MS: f32 = 10_000.0;
    pub const POWERUP_SIZE: f32 = 30.0;
    pub const POWERUP_FALL_SPEED: f32 = 2.5;
    pub const POWERUP_DROP_CHANCE: f32 = 0.12;

    /// Regular enemy spawning
    pub const SPAWN_CHANCE_BASE: f32 = 0.022;
    pub const SPAWN_CHANCE_PER_LEVEL: f32 = 0.006;
    pub const HEAVY_ROLL: f32 = 0.88;
    pub const FAST_ROLL: f32 = 0.75;
    pub const ENEMY_MIN_SPEED: f32 = 2.5;
    pub const ENEMY_MAX_SPEED: f32 = 4.5;
    pub const BASIC_SIZE: f32 = 35.0;
    pub const FAST_SIZE: f32 = 28.0;
    pub const HEAVY_SIZE: f32 = 55.0;

    /// Scoring and progression
    pub const KILL_SCORE_PER_LEVEL: u64 = 35;
    pub const BOSS_BONUS: u64 = 7500;
    pub const LEVEL_SCORE_STEP: u64 = 2500;
    pub const BOSS_LEVEL_INTERVAL: u32 = 5;

    /// Boss
    pub const BOSS_SIZE: f32 = 140.0;
    pub const BOSS_HEALTH_PER_LEVEL: f32 = 200.0;
    pub const BOSS_ENTRY_SPEED: f32 = 1.2;
    pub const BOSS_CRUISE_DEPTH: f32 = 120.0;
    pub const BOSS_PHASE_STEP: f32 = 0.012;
    /// Weave amplitude is arena width divided by this
    pub const BOSS_WEAVE_DIVISOR: f32 = 2.5;
    pub const BOSS_ATTACK_BASE_MS: f64 = 1600.0;
    pub const BOSS_ATTACK_PER_LEVEL_MS: f64 = 120.0;
    pub const BOSS_ATTACK_MIN_MS: f64 = 400.0;
    pub const BOSS_SPREAD_CHANCE: f32 = 0.55;
    pub const SPREAD_HALF_COUNT: i32 = 4;
    pub const SPREAD_STEP: f32 = 0.22;
    pub const SPREAD_SPEED: f32 = 4.5;
    pub const SPREAD_BULLET_SIZE: f32 = 12.0;
    pub const AIMED_ROUNDS: u32 = 5;
    pub const AIMED_ROUND_GAP_MS: f64 = 110.0;
    pub const AIMED_SPEED: f32 = 9.0;
    pub const AIMED_BULLET_SIZE: f32 = 14.0;

    /// Camera shake impulses and decay
    pub const SHAKE_DECAY: f32 = 0.85;
    pub const SHAKE_FLOOR: f32 = 0.1;
    pub const SHAKE_BOSS_SPAWN: f32 = 25.0;
    pub const SHAKE_BOSS_DEATH: f32 = 50.0;
    pub const SHAKE_BULLET_HIT: f32 = 10.0;
    pub const SHAKE_CONTACT_HIT: f32 = 18.0;

    /// Off-arena margins before removal
    pub const PLAYER_BULLET_MARGIN: f32 = 30.0;
    pub const ENEMY_BULLET_MARGIN: f32 = 100.0;
    pub const ENEMY_BULLET_BOTTOM_MARGIN: f32 = 50.0;

    /// Hard particle cap when settings do not provide one
    pub const MAX_PARTICLES: usize = 2000;
}

/// Unit vector for an angle measured from +x toward +y (screen space, y down)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Move `current` a fixed fraction of the way toward `target`
#[inline]
pub fn ease_toward(current: Vec2, target: Vec2, damping: f32) -> Vec2 {
    current + (target - current) * damping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_points_down_at_half_pi() {
        let h = heading(std::f32::consts::FRAC_PI_2);
        assert!(h.x.abs() < 1e-6);
        assert!((h.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ease_toward_covers_fraction() {
        let p = ease_toward(Vec2::ZERO, Vec2::new(100.0, -50.0), 0.18);
        assert!((p.x - 18.0).abs() < 1e-4);
        assert!((p.y + 9.0).abs() < 1e-4);
    }
}
