//! Collision detection and combat resolution
//!
//! Everything is an axis-aligned box. The resolver passes run in a fixed order
//! each tick (see [`super::tick::tick`]) because that order decides who wins
//! when several events want the same entity:
//!
//! 1. enemy bullets vs player
//! 2. power-ups vs player
//! 3. player bullets vs boss
//! 4. regular enemies: body contact first, then player bullets
//! 5. expiry sweep for anything that left the arena
//!
//! Each pass takes the collection it consumes out of the world, filters it and
//! puts the survivors back, so an entity is dropped by exactly one pass.

use glam::Vec2;

use super::spawn::roll_power_up_drop;
use super::state::{ActivePowerUp, Body, Enemy, PowerUpKind, World, palette};
use crate::audio::Cue;
use crate::consts::*;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_body(body: &Body) -> Self {
        Self::new(body.pos, body.pos + body.size)
    }

    /// Strict overlap on both axes; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Enemy projectiles striking the ship
pub fn resolve_enemy_fire(world: &mut World) {
    let ship = world.player.body.aabb();
    let mut bullets = std::mem::take(&mut world.enemy_bullets);
    bullets.retain(|bullet| {
        if !bullet.body.aabb().overlaps(&ship) {
            return true;
        }
        if world.player.has(PowerUpKind::Shield) {
            world.burst(bullet.body.pos, palette::SHIELD_PICKUP, 4);
        } else {
            world.hurt_player(bullet.damage, SHAKE_BULLET_HIT);
        }
        world.burst(bullet.body.pos, bullet.body.color, 6);
        false
    });
    world.enemy_bullets = bullets;
}

/// Ship flying through falling pickups
pub fn resolve_pickups(world: &mut World) {
    let ship = world.player.body.aabb();
    let mut pickups = std::mem::take(&mut world.power_ups);
    pickups.retain(|pickup| {
        if !pickup.body.aabb().overlaps(&ship) {
            return true;
        }
        world.player.power_up = Some(ActivePowerUp::new(pickup.kind));
        log::debug!("Picked up {:?}", pickup.kind);
        world.cue(Cue::PowerUp);
        world.burst(pickup.body.center(), pickup.body.color, 25);
        false
    });
    world.power_ups = pickups;
}

/// Player bullets chipping at the boss; the only place a boss dies
pub fn resolve_boss_hits(world: &mut World) {
    let Some(mut boss) = world.boss.take() else {
        return;
    };
    let hull = boss.body.aabb();
    let mut defeated = false;
    let mut bullets = std::mem::take(&mut world.player_bullets);
    bullets.retain(|bullet| {
        if defeated || !bullet.body.aabb().overlaps(&hull) {
            return true;
        }
        boss.health -= bullet.damage;
        world.burst(bullet.body.pos, palette::BOSS, 4);
        if boss.health <= 0.0 {
            defeated = true;
        }
        false
    });
    world.player_bullets = bullets;

    if !defeated {
        world.boss = Some(boss);
        return;
    }

    log::info!("Boss {} destroyed at level {}", boss.id, world.level);
    world.award(BOSS_BONUS);
    world.burst(boss.body.center(), boss.body.color, 150);
    world.cue(Cue::BossExplosion);
    world.kick_shake(SHAKE_BOSS_DEATH);
    world.advance_level();
}

/// Regular enemies: ramming the ship, then being shot
pub fn resolve_enemies(world: &mut World) {
    let mut enemies = std::mem::take(&mut world.enemies);
    let mut bullets = std::mem::take(&mut world.player_bullets);

    enemies.retain_mut(|enemy| {
        // A ram earlier in this pass may have ended the run
        if world.game_over {
            return true;
        }
        let hull = enemy.body.aabb();

        if hull.overlaps(&world.player.body.aabb()) {
            ram_player(world, enemy);
            return false;
        }

        let mut killed = false;
        bullets.retain(|bullet| {
            if killed || !bullet.body.aabb().overlaps(&hull) {
                return true;
            }
            enemy.health -= bullet.damage;
            if enemy.health <= 0.0 {
                killed = true;
            }
            false
        });

        if killed {
            enemy_killed(world, enemy);
        }
        !killed
    });

    world.enemies = enemies;
    world.player_bullets = bullets;
}

/// Kamikaze contact. The enemy is always consumed.
pub fn ram_player(world: &mut World, enemy: &Enemy) {
    if world.player.has(PowerUpKind::Shield) {
        if let Some(shield) = world.player.power_up.as_mut() {
            shield.remaining_ms -= SHIELD_CONTACT_PENALTY_MS;
        }
    } else {
        world.hurt_player(CONTACT_DAMAGE, SHAKE_CONTACT_HIT);
    }
    world.burst(enemy.body.center(), enemy.body.color, 20);
}

fn enemy_killed(world: &mut World, enemy: &Enemy) {
    world.award(KILL_SCORE_PER_LEVEL * u64::from(world.level));
    world.burst(enemy.body.center(), enemy.body.color, 30);
    world.cue(Cue::Explosion);
    roll_power_up_drop(world, enemy.body.pos);

    if world.player.score >= u64::from(world.level) * LEVEL_SCORE_STEP {
        world.advance_level();
    }
}

/// Remove everything that has left the arena or burned out
pub fn sweep_expired(world: &mut World) {
    let arena = world.arena;

    world.player_bullets.retain(|b| {
        let p = b.body.pos;
        !(p.y < -PLAYER_BULLET_MARGIN
            || p.x < -PLAYER_BULLET_MARGIN
            || p.x > arena.x + PLAYER_BULLET_MARGIN)
    });
    world.enemy_bullets.retain(|b| {
        let p = b.body.pos;
        !(p.y > arena.y + ENEMY_BULLET_BOTTOM_MARGIN
            || p.y < -ENEMY_BULLET_MARGIN
            || p.x < -ENEMY_BULLET_MARGIN
            || p.x > arena.x + ENEMY_BULLET_MARGIN)
    });
    world.enemies.retain(|e| e.body.pos.y <= arena.y);
    world.power_ups.retain(|p| p.body.pos.y <= arena.y);
    world.particles.retain(|p| p.life <= p.max_life);
}
