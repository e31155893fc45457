//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One update per frame, timers on the simulated clock
//! - Injected dice only
//! - No rendering or platform dependencies; sounds are only named, never played

pub mod boss;
pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{BossAttack, ScheduledVolley, attack_delay_ms};
pub use collision::Aabb;
pub use state::{
    ActivePowerUp, Body, Boss, BossStage, Bullet, Dice, Enemy, EnemyKind, GameEvent, Particle,
    Player, PowerUp, PowerUpKind, ScriptedDice, SeededDice, World,
};
pub use tick::{FrameInput, tick};
