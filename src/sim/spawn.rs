//! Spawning policy: when and what enters the arena

use glam::Vec2;

use super::state::{Body, Boss, BossStage, Enemy, EnemyKind, PowerUp, PowerUpKind, World, palette};
use crate::consts::*;

/// Per-tick chance of a regular enemy appearing
pub fn spawn_chance(level: u32) -> f32 {
    SPAWN_CHANCE_BASE + level as f32 * SPAWN_CHANCE_PER_LEVEL
}

/// Health of a basic enemy at `level`; other kinds scale from this
pub fn base_health(level: u32) -> f32 {
    1.0 + (level / 2) as f32
}

/// Roll for a regular enemy. Never spawns while a boss is alive.
pub fn maybe_spawn_enemy(world: &mut World) -> bool {
    if world.boss.is_some() {
        return false;
    }
    if world.roll() < spawn_chance(world.level) {
        spawn_enemy(world);
        return true;
    }
    false
}

/// Place one regular enemy just above the top edge
pub fn spawn_enemy(world: &mut World) {
    if world.boss.is_some() {
        return;
    }
    let kind = EnemyKind::from_roll(world.roll());
    let size = kind.size();
    let speed = world.fx_range(ENEMY_MIN_SPEED, ENEMY_MAX_SPEED) * kind.speed_factor();
    let health = base_health(world.level) * kind.health_factor();
    let x = world.fx_range(0.0, world.arena.x - size);

    log::debug!("Spawned {:?} enemy (hp {}, speed {:.2})", kind, health, speed);
    world
        .enemies
        .push(Enemy::new(kind, Vec2::new(x, -size), health, speed));
}

/// Summon the boss on boss levels when none is present
pub fn maybe_spawn_boss(world: &mut World) -> bool {
    if world.is_boss_level() && world.boss.is_none() {
        spawn_boss(world);
        return true;
    }
    false
}

/// Create the boss above the arena and shake the camera
pub fn spawn_boss(world: &mut World) {
    let id = world.allocate_boss_id();
    let health = world.level as f32 * BOSS_HEALTH_PER_LEVEL;
    let pos = Vec2::new(world.arena.x / 2.0 - BOSS_SIZE / 2.0, -BOSS_SIZE);

    log::info!("Boss {} incoming at level {} (hp {})", id, world.level, health);
    world.boss = Some(Boss {
        id,
        body: Body::square(pos, BOSS_SIZE, palette::BOSS),
        health,
        max_health: health,
        speed: BOSS_ENTRY_SPEED,
        last_shot_ms: 0.0,
        phase: 0.0,
        stage: BossStage::Entering,
    });
    world.kick_shake(SHAKE_BOSS_SPAWN);
}

/// Chance for a destroyed enemy to leave a pickup behind
pub fn roll_power_up_drop(world: &mut World, pos: Vec2) {
    if world.roll() >= POWERUP_DROP_CHANCE {
        return;
    }
    let kind = if world.roll() > 0.5 {
        PowerUpKind::Triple
    } else {
        PowerUpKind::Shield
    };
    world.power_ups.push(PowerUp::new(kind, pos));
}
