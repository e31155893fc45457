//! End-to-end combat scenarios driven through the public API

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use nebula_strike::sim::boss::{boss_attack, release_due_volleys};
use nebula_strike::sim::collision::{
    resolve_boss_hits, resolve_enemies, resolve_enemy_fire, resolve_pickups,
};
use nebula_strike::sim::spawn::maybe_spawn_boss;
use nebula_strike::sim::{
    ActivePowerUp, Body, BossAttack, Bullet, Enemy, EnemyKind, FrameInput, GameEvent, PowerUp,
    PowerUpKind, ScriptedDice, World, tick,
};
use nebula_strike::{Cue, HostPhase, Session, SessionHooks, Settings};

const ARENA: Vec2 = Vec2::new(800.0, 600.0);

/// World whose gameplay rolls never spawn, never drop and always pick the
/// aimed burst
fn quiet_world() -> World {
    World::with_dice(42, ARENA, Box::new(ScriptedDice::repeating(0.99)))
}

fn frame(ms: f32) -> FrameInput {
    FrameInput {
        elapsed_ms: ms,
        ..Default::default()
    }
}

#[test]
fn one_bullet_kills_a_level_one_basic_enemy() {
    let mut world = quiet_world();
    let lane_x = world.player.body.pos.x;
    world
        .enemies
        .push(Enemy::new(EnemyKind::Basic, Vec2::new(lane_x, 100.0), 1.0, 3.0));
    world
        .player_bullets
        .push(Bullet::straight(Vec2::new(lane_x + 10.0, 110.0), 0));

    resolve_enemies(&mut world);

    assert!(world.enemies.is_empty());
    assert!(world.player_bullets.is_empty());
    assert_eq!(world.player.score, 35);
    assert!(world.power_ups.is_empty());
    assert!(world.events.contains(&GameEvent::Sound(Cue::Explosion)));
}

#[test]
fn level_five_boss_falls_to_a_thousand_bullets() {
    let mut world = quiet_world();
    world.level = 5;
    assert!(maybe_spawn_boss(&mut world));
    let boss = world.boss.as_ref().map(|b| (b.health, b.body.center()));
    let (health, center) = boss.unwrap();
    assert_eq!(health, 1000.0);

    for _ in 0..1005 {
        world.player_bullets.push(Bullet::straight(center, 0));
    }
    resolve_boss_hits(&mut world);

    assert!(world.boss.is_none());
    assert_eq!(world.player.score, 7500);
    assert_eq!(world.level, 6);
    // Bullets past the killing blow are left alone
    assert_eq!(world.player_bullets.len(), 5);
    assert!(world.events.contains(&GameEvent::LevelUp(6)));
}

#[test]
fn shield_turns_a_ram_into_timer_loss() {
    let mut world = quiet_world();
    let ship = world.player.body.pos;

    world.power_ups.push(PowerUp::new(PowerUpKind::Shield, ship));
    resolve_pickups(&mut world);
    assert!(world.player.has(PowerUpKind::Shield));
    assert!(world.power_ups.is_empty());

    world
        .enemies
        .push(Enemy::new(EnemyKind::Basic, ship, 1.0, 3.0));
    resolve_enemies(&mut world);

    assert_eq!(world.player.health, 100.0);
    assert_eq!(world.player.power_up_remaining_ms(), 8500.0);
    assert!(world.enemies.is_empty());
    assert!(!world.events.contains(&GameEvent::Sound(Cue::PlayerDamage)));
}

#[test]
fn shield_absorbs_enemy_fire() {
    let mut world = quiet_world();
    world.player.power_up = Some(ActivePowerUp::new(PowerUpKind::Shield));
    let ship = world.player.body.center();
    for _ in 0..3 {
        world.enemy_bullets.push(Bullet::angled(
            Body::square(ship, 14.0, 0),
            9.0,
            15.0,
            Vec2::Y * 9.0,
        ));
    }

    resolve_enemy_fire(&mut world);

    assert_eq!(world.player.health, 100.0);
    assert!(world.enemy_bullets.is_empty());
}

#[test]
fn triple_shot_fans_three_bullets() {
    let mut world = quiet_world();
    world.player.power_up = Some(ActivePowerUp::new(PowerUpKind::Triple));

    tick(&mut world, &frame(100.0));
    assert!(world.player_bullets.is_empty());
    tick(&mut world, &frame(100.0));

    assert_eq!(world.player_bullets.len(), 3);
    for (bullet, angle) in world.player_bullets.iter().zip([-0.2f32, 0.0, 0.2]) {
        let vel = bullet.vel.unwrap();
        assert!((vel.length() - 14.0).abs() < 1e-4);
        assert!((vel.x - angle.sin() * 14.0).abs() < 1e-4);
        assert!((vel.y + angle.cos() * 14.0).abs() < 1e-4);
    }
}

#[test]
fn aimed_burst_stops_when_the_boss_dies() {
    let mut world = quiet_world();
    world.level = 5;
    maybe_spawn_boss(&mut world);
    world.clock_ms = 5_000.0;

    assert_eq!(boss_attack(&mut world), Some(BossAttack::AimedBurst));
    assert_eq!(world.volleys.len(), 5);

    release_due_volleys(&mut world);
    assert_eq!(world.enemy_bullets.len(), 1);

    world.clock_ms += 110.0;
    release_due_volleys(&mut world);
    assert_eq!(world.enemy_bullets.len(), 2);

    world.boss = None;
    world.clock_ms += 1_000.0;
    release_due_volleys(&mut world);
    assert_eq!(world.enemy_bullets.len(), 2);
    assert!(world.volleys.is_empty());
}

#[derive(Clone, Default)]
struct Totals(Rc<RefCell<(Vec<u64>, Vec<u64>)>>);

impl SessionHooks for Totals {
    fn on_score(&mut self, score: u64) {
        self.0.borrow_mut().0.push(score);
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.0.borrow_mut().1.push(final_score);
    }
}

#[test]
fn game_over_fires_once_and_start_resets_score() {
    let totals = Totals::default();
    let mut session = Session::new(42, Settings::default())
        .with_world(quiet_world())
        .with_hooks(Box::new(totals.clone()));
    session.start(ARENA);

    // Park enemies on the ship until it dies
    for _ in 0..10 {
        let ship = session.world().player.body.pos;
        session
            .world_mut()
            .enemies
            .push(Enemy::new(EnemyKind::Basic, ship, 1.0, 0.0));
        session.advance(16.0, ARENA);
    }

    assert_eq!(session.phase(), HostPhase::GameOver);
    assert_eq!(session.world().player.health, 0.0);
    assert_eq!(totals.0.borrow().1.len(), 1);

    session.start(ARENA);
    assert_eq!(session.world().player.score, 0);
    assert_eq!(totals.0.borrow().0.last(), Some(&0));
}
