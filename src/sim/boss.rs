//! Boss behavior: entry, weave patrol and the two attack patterns
//!
//! The aimed burst releases its rounds over several frames. Pending rounds are
//! kept in [`World::volleys`] and drained by the tick itself; a round whose boss
//! is gone (or was replaced) is discarded instead of fired.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{BossStage, Body, Bullet, World, palette};
use crate::audio::Cue;
use crate::consts::*;
use crate::heading;

/// One aimed round waiting for its release time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledVolley {
    pub fire_at_ms: f64,
    /// Boss that ordered the round
    pub boss_id: u32,
    /// Boss center when the burst was ordered
    pub origin: Vec2,
    pub angle: f32,
}

/// Which pattern an attack used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossAttack {
    /// Nine-way fan centred on straight down
    Spread,
    /// Five fast rounds at the ship's position
    AimedBurst,
}

/// Time between attacks at `level`
pub fn attack_delay_ms(level: u32) -> f64 {
    (BOSS_ATTACK_BASE_MS - f64::from(level) * BOSS_ATTACK_PER_LEVEL_MS).max(BOSS_ATTACK_MIN_MS)
}

/// Advance boss movement by one tick
pub fn step_boss(world: &mut World) {
    let arena = world.arena;
    let Some(boss) = world.boss.as_mut() else {
        return;
    };

    match boss.stage {
        BossStage::Entering => {
            boss.body.pos.y += boss.speed;
            if boss.body.pos.y >= BOSS_CRUISE_DEPTH {
                boss.stage = BossStage::Weaving;
                log::debug!("Boss {} reached cruise depth", boss.id);
            }
        }
        BossStage::Weaving => {
            boss.phase += BOSS_PHASE_STEP;
            let home = arena.x / 2.0 - boss.body.size.x / 2.0;
            boss.body.pos.x = home + boss.phase.sin() * (arena.x / BOSS_WEAVE_DIVISOR);
        }
    }
}

/// Fire if the attack timer has elapsed
pub fn boss_attack(world: &mut World) -> Option<BossAttack> {
    let delay = attack_delay_ms(world.level);
    let clock = world.clock_ms;
    let (id, origin) = {
        let boss = world.boss.as_mut()?;
        if clock - boss.last_shot_ms <= delay {
            return None;
        }
        boss.last_shot_ms = clock;
        (boss.id, boss.body.center())
    };

    world.cue(Cue::BossShoot);
    if world.roll() < BOSS_SPREAD_CHANCE {
        fire_spread(world, origin);
        Some(BossAttack::Spread)
    } else {
        order_aimed_burst(world, id, origin);
        Some(BossAttack::AimedBurst)
    }
}

fn fire_spread(world: &mut World, origin: Vec2) {
    for i in -SPREAD_HALF_COUNT..=SPREAD_HALF_COUNT {
        let angle = std::f32::consts::FRAC_PI_2 + i as f32 * SPREAD_STEP;
        world.enemy_bullets.push(Bullet::angled(
            Body::square(origin, SPREAD_BULLET_SIZE, palette::SPREAD_BULLET),
            SPREAD_SPEED,
            SPREAD_BULLET_DAMAGE,
            heading(angle) * SPREAD_SPEED,
        ));
    }
}

fn order_aimed_burst(world: &mut World, boss_id: u32, origin: Vec2) {
    let target = world.player.body.pos;
    let angle = (target.y - origin.y).atan2(target.x - origin.x);
    for round in 0..AIMED_ROUNDS {
        world.volleys.push(ScheduledVolley {
            fire_at_ms: world.clock_ms + f64::from(round) * AIMED_ROUND_GAP_MS,
            boss_id,
            origin,
            angle,
        });
    }
}

/// Fire every pending round that is due; drop rounds whose boss is gone
pub fn release_due_volleys(world: &mut World) {
    let clock = world.clock_ms;
    let live = world.boss.as_ref().map(|b| b.id);
    let mut due = Vec::new();
    world.volleys.retain(|volley| {
        if live != Some(volley.boss_id) {
            return false;
        }
        if volley.fire_at_ms <= clock {
            due.push(*volley);
            return false;
        }
        true
    });

    for volley in due {
        world.enemy_bullets.push(Bullet::angled(
            Body::square(volley.origin, AIMED_BULLET_SIZE, palette::AIMED_BULLET),
            AIMED_SPEED,
            AIMED_BULLET_DAMAGE,
            heading(volley.angle) * AIMED_SPEED,
        ));
    }
}
