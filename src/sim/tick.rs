//! Per-frame simulation tick
//!
//! One call advances the world by exactly one logical step. Durations that the
//! game expresses in milliseconds (fire cooldowns, power-up timers, boss attack
//! timers, burst spacing) run on the simulated clock, which advances by the
//! frame's elapsed time. Motion is per tick.

use glam::Vec2;

use super::boss::{boss_attack, release_due_volleys, step_boss};
use super::collision::{
    resolve_boss_hits, resolve_enemies, resolve_enemy_fire, resolve_pickups, sweep_expired,
};
use super::spawn::{maybe_spawn_boss, maybe_spawn_enemy};
use super::state::{Body, Bullet, PowerUpKind, World, palette};
use crate::audio::Cue;
use crate::consts::*;
use crate::ease_toward;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Latest pointer/touch position in arena space
    pub pointer: Option<Vec2>,
    /// Wall time since the previous frame (ms)
    pub elapsed_ms: f32,
    /// Arena size this frame, if it changed
    pub arena: Option<Vec2>,
    /// Attract mode - the ship steers itself
    pub autopilot: bool,
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &FrameInput) {
    if world.game_over {
        return;
    }

    let elapsed = if input.elapsed_ms.is_finite() {
        input.elapsed_ms.clamp(0.0, MAX_FRAME_MS)
    } else {
        FRAME_MS
    };
    if let Some(arena) = input.arena {
        world.arena = arena;
    }
    world.time_ticks += 1;
    world.clock_ms += f64::from(elapsed);

    decay_shake(world);

    let target = if input.autopilot {
        Some(autopilot_target(world))
    } else {
        input.pointer
    };
    if let Some(target) = target {
        world.pointer_target = target;
    }

    // Movement
    step_player(world);
    step_projectiles(world);
    step_falling(world);
    step_particles(world);
    step_boss(world);

    // Timers and firing
    tick_power_up(world, elapsed);
    auto_fire(world);

    // Spawning and boss attacks
    maybe_spawn_boss(world);
    boss_attack(world);
    release_due_volleys(world);
    maybe_spawn_enemy(world);

    // Combat, in tie-breaking order. Nothing scores once the ship is lost.
    let passes: [fn(&mut World); 4] = [
        resolve_enemy_fire,
        resolve_pickups,
        resolve_boss_hits,
        resolve_enemies,
    ];
    for pass in passes {
        pass(world);
        if world.game_over {
            return;
        }
    }

    sweep_expired(world);
}

fn decay_shake(world: &mut World) {
    if world.shake > SHAKE_FLOOR {
        world.shake *= SHAKE_DECAY;
    } else {
        world.shake = 0.0;
    }
}

/// Ease the ship's center toward the pointer
fn step_player(world: &mut World) {
    let body = &mut world.player.body;
    let center = body.center();
    let next = ease_toward(center, world.pointer_target, PLAYER_FOLLOW_DAMPING);
    body.pos += next - center;
}

fn step_projectiles(world: &mut World) {
    for bullet in &mut world.player_bullets {
        match bullet.vel {
            Some(vel) => bullet.body.pos += vel,
            None => bullet.body.pos.y -= bullet.speed,
        }
    }
    for bullet in &mut world.enemy_bullets {
        match bullet.vel {
            Some(vel) => bullet.body.pos += vel,
            None => bullet.body.pos.y += bullet.speed,
        }
    }
}

fn step_falling(world: &mut World) {
    for enemy in &mut world.enemies {
        enemy.body.pos.y += enemy.speed;
    }
    for pickup in &mut world.power_ups {
        pickup.body.pos.y += pickup.speed;
    }
}

fn step_particles(world: &mut World) {
    for particle in &mut world.particles {
        particle.body.pos += particle.vel;
        particle.life += 1.0;
    }
}

/// Count the active power-up down and drop it once spent
fn tick_power_up(world: &mut World, elapsed: f32) {
    let expired = match world.player.power_up.as_mut() {
        Some(active) => {
            active.tick(elapsed);
            active.is_expired()
        }
        None => false,
    };
    if expired {
        log::debug!("Power-up expired");
        world.player.power_up = None;
    }
}

/// Fire automatically once the cooldown has passed
fn auto_fire(world: &mut World) {
    let triple = world.player.has(PowerUpKind::Triple);
    let cooldown = if triple {
        TRIPLE_FIRE_COOLDOWN_MS
    } else {
        FIRE_COOLDOWN_MS
    };
    if world.clock_ms - world.player.last_shot_ms <= cooldown {
        return;
    }

    let ship = world.player.body;
    let muzzle = Vec2::new(ship.pos.x + ship.size.x / 2.0 - 2.0, ship.pos.y);
    if triple {
        for angle in TRIPLE_FAN {
            let vel = Vec2::new(angle.sin(), -angle.cos()) * PLAYER_BULLET_SPEED;
            world.player_bullets.push(Bullet::angled(
                Body::new(
                    muzzle,
                    Vec2::new(PLAYER_BULLET_WIDTH, PLAYER_BULLET_HEIGHT),
                    palette::TRIPLE_BULLET,
                ),
                PLAYER_BULLET_SPEED,
                PLAYER_BULLET_DAMAGE,
                vel,
            ));
        }
    } else {
        world
            .player_bullets
            .push(Bullet::straight(muzzle, palette::BULLET));
    }
    world.player.last_shot_ms = world.clock_ms;
    world.cue(Cue::Shoot);
}

/// Pick a pointer target for attract mode.
///
/// Sidestep anything about to land on the ship, otherwise grab a pickup in the
/// lower half, otherwise line up under the lowest enemy (or the boss).
fn autopilot_target(world: &World) -> Vec2 {
    let arena = world.arena;
    let ship = world.player.body.center();
    let home_y = arena.y - PLAYER_SPAWN_OFFSET;
    let lane = |x: f32| x.clamp(PLAYER_SIZE, (arena.x - PLAYER_SIZE).max(PLAYER_SIZE));

    let incoming = world
        .enemy_bullets
        .iter()
        .map(|b| (b.body.center(), b.body.size.x))
        .chain(world.enemies.iter().map(|e| (e.body.center(), e.body.size.x)))
        .filter(|(c, w)| {
            let above = ship.y - c.y;
            above > -20.0 && above < 200.0 && (c.x - ship.x).abs() < PLAYER_SIZE + w / 2.0
        })
        .min_by(|(a, _), (b, _)| {
            (ship.y - a.y)
                .partial_cmp(&(ship.y - b.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some((threat, _)) = incoming {
        let side = if threat.x > ship.x { -1.0 } else { 1.0 };
        return Vec2::new(lane(ship.x + side * 120.0), home_y);
    }

    let pickup = world
        .power_ups
        .iter()
        .map(|p| p.body.center())
        .filter(|c| c.y > arena.y * 0.5)
        .min_by(|a, b| {
            a.distance_squared(ship)
                .partial_cmp(&b.distance_squared(ship))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(pickup) = pickup {
        return Vec2::new(lane(pickup.x), pickup.y.max(arena.y * 0.5));
    }

    // Sway a little so the run is not a perfect loop
    let sway = (world.time_ticks as f32 * 0.02).sin() * 30.0;
    let aim_x = world
        .boss
        .as_ref()
        .map(|b| b.body.center().x)
        .or_else(|| {
            world
                .enemies
                .iter()
                .max_by(|a, b| {
                    a.body
                        .pos
                        .y
                        .partial_cmp(&b.body.pos.y)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|e| e.body.center().x)
        })
        .unwrap_or(arena.x / 2.0);
    Vec2::new(lane(aim_x + sway), home_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ActivePowerUp, Enemy, EnemyKind, GameEvent, ScriptedDice};
    use crate::sim::testing::world_with;

    fn frame(ms: f32) -> FrameInput {
        FrameInput {
            elapsed_ms: ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_shot_after_cooldown() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        for _ in 0..10 {
            tick(&mut world, &frame(16.0));
        }
        // 160 ms elapsed, cooldown is 170
        assert!(world.player_bullets.is_empty());
        tick(&mut world, &frame(16.0));
        assert_eq!(world.player_bullets.len(), 1);
        assert!(world.events.contains(&GameEvent::Sound(Cue::Shoot)));
    }

    #[test]
    fn test_triple_fan_velocities() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.player.power_up = Some(ActivePowerUp::new(PowerUpKind::Triple));
        world.clock_ms = 1000.0;
        auto_fire(&mut world);
        assert_eq!(world.player_bullets.len(), 3);
        for (bullet, angle) in world.player_bullets.iter().zip(TRIPLE_FAN) {
            let vel = bullet.vel.unwrap();
            assert!((vel.x - angle.sin() * 14.0).abs() < 1e-5);
            assert!((vel.y + angle.cos() * 14.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_triple_fires_faster() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.player.power_up = Some(ActivePowerUp::new(PowerUpKind::Triple));
        world.clock_ms = 1000.0;
        auto_fire(&mut world);
        world.clock_ms += 120.0;
        auto_fire(&mut world);
        assert_eq!(world.player_bullets.len(), 6);
    }

    #[test]
    fn test_power_up_counts_down_by_elapsed_time() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.player.power_up = Some(ActivePowerUp::new(PowerUpKind::Shield));
        tick(&mut world, &frame(40.0));
        assert_eq!(world.player.power_up_remaining_ms(), POWERUP_DURATION_MS - 40.0);
        for _ in 0..100 {
            tick(&mut world, &frame(100.0));
        }
        assert!(world.player.power_up.is_none());
    }

    #[test]
    fn test_penalty_below_zero_expires_next_tick() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.player.power_up = Some(ActivePowerUp {
            kind: PowerUpKind::Shield,
            remaining_ms: -200.0,
        });
        tick(&mut world, &frame(16.0));
        assert!(world.player.power_up.is_none());
    }

    #[test]
    fn test_player_eases_toward_pointer() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        let start = world.player.body.center();
        let target = start + Vec2::new(100.0, 0.0);
        let input = FrameInput {
            pointer: Some(target),
            elapsed_ms: 16.0,
            ..Default::default()
        };
        tick(&mut world, &input);
        let moved = world.player.body.center() - start;
        assert!((moved.x - 18.0).abs() < 1e-3);
        assert!(moved.y.abs() < 1e-3);
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.shake = 50.0;
        tick(&mut world, &frame(16.0));
        assert!((world.shake - 42.5).abs() < 1e-4);
        for _ in 0..200 {
            tick(&mut world, &frame(16.0));
        }
        assert_eq!(world.shake, 0.0);
    }

    #[test]
    fn test_resize_mid_session() {
        let mut world = world_with(ScriptedDice::repeating(0.0));
        for _ in 0..30 {
            tick(&mut world, &frame(16.0));
        }
        let input = FrameInput {
            elapsed_ms: 16.0,
            arena: Some(Vec2::new(320.0, 480.0)),
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut world, &input);
        }
        assert_eq!(world.arena, Vec2::new(320.0, 480.0));
        assert!(world.enemies.iter().all(|e| e.body.pos.y <= 480.0));
    }

    #[test]
    fn test_dead_world_does_not_tick() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.hurt_player(200.0, 0.0);
        let ticks = world.time_ticks;
        tick(&mut world, &frame(16.0));
        assert_eq!(world.time_ticks, ticks);
    }

    #[test]
    fn test_score_is_frozen_by_a_fatal_hit() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        world.player.health = 5.0;
        let ship = world.player.body.center();
        world.enemy_bullets.push(Bullet::angled(
            Body::square(ship, AIMED_BULLET_SIZE, palette::AIMED_BULLET),
            AIMED_SPEED,
            AIMED_BULLET_DAMAGE,
            Vec2::ZERO,
        ));
        // An enemy that would die to a bullet in the same frame
        let enemy_pos = Vec2::new(100.0, 100.0);
        world
            .enemies
            .push(Enemy::new(EnemyKind::Basic, enemy_pos, 1.0, 0.0));
        world
            .player_bullets
            .push(Bullet::straight(enemy_pos + Vec2::splat(10.0), palette::BULLET));

        tick(&mut world, &frame(16.0));

        assert!(world.game_over);
        let final_score = world.events.iter().find_map(|e| match e {
            GameEvent::GameOver { final_score } => Some(*final_score),
            _ => None,
        });
        assert_eq!(final_score, Some(world.player.score));
        assert_eq!(world.player.score, 0);
        assert_eq!(world.enemies.len(), 1);
        assert!(
            !world
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ScoreChanged(_) | GameEvent::LevelUp(_)))
        );
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs stay identical
        let arena = Vec2::new(800.0, 600.0);
        let mut a = World::new(99999, arena);
        let mut b = World::new(99999, arena);
        let input = FrameInput {
            elapsed_ms: 16.0,
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..2000 {
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.player.score, b.player.score);
        assert_eq!(a.player.health, b.player.health);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.player.body.pos, b.player.body.pos);
    }

    #[test]
    fn test_autopilot_sidesteps_incoming_fire() {
        let mut world = world_with(ScriptedDice::repeating(0.99));
        let ship = world.player.body.center();
        world.enemy_bullets.push(Bullet::angled(
            Body::square(ship - Vec2::new(0.0, 100.0), 12.0, 0),
            4.5,
            10.0,
            Vec2::Y * 4.5,
        ));
        let target = autopilot_target(&world);
        assert!((target.x - ship.x).abs() > 100.0);
    }
}
