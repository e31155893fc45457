//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives in [`World`]. Rendering and UI only
//! ever see it through shared borrows.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::ScheduledVolley;
use super::collision::Aabb;
use crate::audio::Cue;
use crate::consts::*;

/// Cosmetic colors (0xRRGGBB), ignored by game logic
pub mod palette {
    pub const PLAYER: u32 = 0x38bdf8;
    pub const BULLET: u32 = 0x7dd3fc;
    pub const TRIPLE_BULLET: u32 = 0xfbbf24;
    pub const BASIC: u32 = 0xf87171;
    pub const FAST: u32 = 0xfbbf24;
    pub const HEAVY: u32 = 0xef4444;
    pub const BOSS: u32 = 0xf472b6;
    pub const SPREAD_BULLET: u32 = 0xf472b6;
    pub const AIMED_BULLET: u32 = 0xec4899;
    pub const TRIPLE_PICKUP: u32 = 0xfbbf24;
    pub const SHIELD_PICKUP: u32 = 0xa855f7;
}

/// Position, size and color shared by every movable object.
///
/// `pos` is the top-left corner of the axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub size: Vec2,
    pub color: u32,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2, color: u32) -> Self {
        Self { pos, size, color }
    }

    pub fn square(pos: Vec2, side: f32, color: u32) -> Self {
        Self::new(pos, Vec2::splat(side), color)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_body(self)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Three-way fan with a shorter cooldown
    Triple,
    /// Absorbs ranged hits, converts rams into timer loss
    Shield,
}

impl PowerUpKind {
    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::Triple => palette::TRIPLE_PICKUP,
            PowerUpKind::Shield => palette::SHIELD_PICKUP,
        }
    }
}

/// Power-up currently held by the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub remaining_ms: f32,
}

impl ActivePowerUp {
    pub fn new(kind: PowerUpKind) -> Self {
        Self {
            kind,
            remaining_ms: POWERUP_DURATION_MS,
        }
    }

    pub fn tick(&mut self, elapsed_ms: f32) {
        self.remaining_ms -= elapsed_ms;
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms <= 0.0
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// 0..=100, reduced only by damage
    pub health: f32,
    pub score: u64,
    /// Simulation clock at the last auto-fire (ms)
    pub last_shot_ms: f64,
    pub power_up: Option<ActivePowerUp>,
}

impl Player {
    /// Fresh ship near the bottom of the arena
    pub fn spawn(arena: Vec2) -> Self {
        Self {
            body: Body::square(spawn_point(arena), PLAYER_SIZE, palette::PLAYER),
            health: PLAYER_MAX_HEALTH,
            score: 0,
            last_shot_ms: 0.0,
            power_up: None,
        }
    }

    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.power_up.is_some_and(|p| p.kind == kind)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Power-up timer in ms (0 when nothing is active)
    pub fn power_up_remaining_ms(&self) -> f32 {
        self.power_up.map_or(0.0, |p| p.remaining_ms)
    }
}

/// Where the ship (and the pointer target) start a session
pub fn spawn_point(arena: Vec2) -> Vec2 {
    Vec2::new(arena.x / 2.0, arena.y - PLAYER_SPAWN_OFFSET)
}

/// Regular enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Fast,
    Heavy,
}

impl EnemyKind {
    /// Pick a kind from a uniform roll in [0, 1)
    pub fn from_roll(roll: f32) -> Self {
        if roll > HEAVY_ROLL {
            EnemyKind::Heavy
        } else if roll > FAST_ROLL {
            EnemyKind::Fast
        } else {
            EnemyKind::Basic
        }
    }

    pub fn health_factor(self) -> f32 {
        match self {
            EnemyKind::Basic => 1.0,
            EnemyKind::Fast => 0.6,
            EnemyKind::Heavy => 5.0,
        }
    }

    pub fn speed_factor(self) -> f32 {
        match self {
            EnemyKind::Basic => 1.0,
            EnemyKind::Fast => 1.8,
            EnemyKind::Heavy => 0.4,
        }
    }

    pub fn size(self) -> f32 {
        match self {
            EnemyKind::Basic => BASIC_SIZE,
            EnemyKind::Fast => FAST_SIZE,
            EnemyKind::Heavy => HEAVY_SIZE,
        }
    }

    pub fn color(self) -> u32 {
        match self {
            EnemyKind::Basic => palette::BASIC,
            EnemyKind::Fast => palette::FAST,
            EnemyKind::Heavy => palette::HEAVY,
        }
    }
}

/// A regular enemy falling straight down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    pub health: f32,
    pub max_health: f32,
    /// Pixels per tick
    pub speed: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, pos: Vec2, health: f32, speed: f32) -> Self {
        Self {
            body: Body::square(pos, kind.size(), kind.color()),
            kind,
            health,
            max_health: health,
            speed,
        }
    }
}

/// Boss movement stage; only ever advances Entering -> Weaving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossStage {
    /// Descending into view
    Entering,
    /// Horizontal sine patrol at cruise depth
    Weaving,
}

/// The singleton boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    /// Distinguishes successive bosses so stale volleys never fire
    pub id: u32,
    pub body: Body,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub last_shot_ms: f64,
    /// Weave phase accumulator (radians)
    pub phase: f32,
    pub stage: BossStage,
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    /// Used along the owner's firing axis when `vel` is absent
    pub speed: f32,
    pub damage: f32,
    /// Explicit per-tick velocity for angled shots
    pub vel: Option<Vec2>,
}

impl Bullet {
    /// Straight-up player shot
    pub fn straight(pos: Vec2, color: u32) -> Self {
        Self {
            body: Body::new(
                pos,
                Vec2::new(PLAYER_BULLET_WIDTH, PLAYER_BULLET_HEIGHT),
                color,
            ),
            speed: PLAYER_BULLET_SPEED,
            damage: PLAYER_BULLET_DAMAGE,
            vel: None,
        }
    }

    /// Shot with an explicit velocity
    pub fn angled(body: Body, speed: f32, damage: f32, vel: Vec2) -> Self {
        Self {
            body,
            speed,
            damage,
            vel: Some(vel),
        }
    }
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
    pub speed: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, pos: Vec2) -> Self {
        Self {
            body: Body::square(pos, POWERUP_SIZE, kind.color()),
            kind,
            speed: POWERUP_FALL_SPEED,
        }
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub body: Body,
    pub vel: Vec2,
    /// Ticks lived
    pub life: f32,
    pub max_life: f32,
}

/// Things the outside world needs to hear about, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScoreChanged(u64),
    LevelUp(u32),
    GameOver { final_score: u64 },
    Sound(Cue),
}

/// Uniform randomness in [0, 1) for gameplay decisions
pub trait Dice: std::fmt::Debug {
    fn roll(&mut self) -> f32;
}

/// Seeded PCG-backed dice
#[derive(Debug, Clone)]
pub struct SeededDice(Pcg32);

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }
}

impl Dice for SeededDice {
    fn roll(&mut self) -> f32 {
        self.0.random::<f32>()
    }
}

/// Replays a fixed list of rolls, then repeats a fallback value.
///
/// Lets hosts replay recorded sessions and tests force specific outcomes.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }

    /// Always returns `value`
    pub fn repeating(value: f32) -> Self {
        Self::new([], value)
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

/// Stream selector so cosmetic draws never shift gameplay rolls
const FX_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Complete simulation state
#[derive(Debug)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Current arena size in pixels; may change between frames
    pub arena: Vec2,
    pub level: u32,
    /// Simulated milliseconds since start
    pub clock_ms: f64,
    pub time_ticks: u64,
    pub player: Player,
    /// Where the ship is being dragged to
    pub pointer_target: Vec2,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub player_bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    /// Camera shake magnitude (visual only)
    pub shake: f32,
    /// Pending aimed-burst rounds
    pub volleys: Vec<ScheduledVolley>,
    /// Set once the player has died
    pub game_over: bool,
    pub max_particles: usize,
    /// Events produced this tick
    pub events: Vec<GameEvent>,
    dice: Box<dyn Dice>,
    fx: Pcg32,
    next_boss_id: u32,
}

impl World {
    /// Create a world with seeded dice
    pub fn new(seed: u64, arena: Vec2) -> Self {
        Self::with_dice(seed, arena, Box::new(SeededDice::new(seed)))
    }

    /// Create a world whose gameplay rolls come from `dice`
    pub fn with_dice(seed: u64, arena: Vec2, dice: Box<dyn Dice>) -> Self {
        Self {
            seed,
            arena,
            level: 1,
            clock_ms: 0.0,
            time_ticks: 0,
            player: Player::spawn(arena),
            pointer_target: spawn_point(arena),
            enemies: Vec::new(),
            boss: None,
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            power_ups: Vec::new(),
            particles: Vec::new(),
            shake: 0.0,
            volleys: Vec::new(),
            game_over: false,
            max_particles: MAX_PARTICLES,
            events: Vec::new(),
            dice,
            fx: Pcg32::new(seed, FX_STREAM),
            next_boss_id: 1,
        }
    }

    /// Clear every collection and put a fresh ship at the spawn point.
    ///
    /// The dice keep their sequence so consecutive sessions differ.
    pub fn reset(&mut self, arena: Vec2) {
        self.arena = arena;
        self.level = 1;
        self.clock_ms = 0.0;
        self.time_ticks = 0;
        self.player = Player::spawn(arena);
        self.pointer_target = spawn_point(arena);
        self.enemies.clear();
        self.boss = None;
        self.player_bullets.clear();
        self.enemy_bullets.clear();
        self.power_ups.clear();
        self.particles.clear();
        self.shake = 0.0;
        self.volleys.clear();
        self.game_over = false;
        self.events.clear();
    }

    /// Gameplay roll in [0, 1)
    pub fn roll(&mut self) -> f32 {
        self.dice.roll()
    }

    /// Cosmetic/placement draw in [lo, hi)
    pub fn fx_range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        lo + self.fx.random::<f32>() * (hi - lo)
    }

    pub fn allocate_boss_id(&mut self) -> u32 {
        let id = self.next_boss_id;
        self.next_boss_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn cue(&mut self, cue: Cue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Start a camera shake impulse
    pub fn kick_shake(&mut self, magnitude: f32) {
        self.shake = magnitude;
    }

    /// Add to the score and announce it. The score is frozen after game over.
    pub fn award(&mut self, points: u64) {
        if self.game_over {
            return;
        }
        self.player.score += points;
        self.emit(GameEvent::ScoreChanged(self.player.score));
    }

    /// Advance exactly one level, unless the run has ended
    pub fn advance_level(&mut self) {
        if self.game_over {
            return;
        }
        self.level += 1;
        log::info!("Level up: {}", self.level);
        self.emit(GameEvent::LevelUp(self.level));
        self.cue(Cue::LevelUp);
    }

    /// Apply unshielded damage; fires game over the first time health hits zero
    pub fn hurt_player(&mut self, amount: f32, shake: f32) {
        if self.game_over {
            return;
        }
        self.player.health = (self.player.health - amount).clamp(0.0, PLAYER_MAX_HEALTH);
        self.kick_shake(shake);
        self.cue(Cue::PlayerDamage);
        if self.player.is_dead() {
            self.game_over = true;
            log::info!(
                "Game over at level {} with score {}",
                self.level,
                self.player.score
            );
            self.emit(GameEvent::GameOver {
                final_score: self.player.score,
            });
        }
    }

    /// Spray `count` cosmetic particles from `origin`
    pub fn burst(&mut self, origin: Vec2, color: u32, count: usize) {
        for _ in 0..count {
            let w = self.fx_range(1.0, 4.0);
            let h = self.fx_range(1.0, 4.0);
            let vel = Vec2::new(self.fx_range(-5.0, 5.0), self.fx_range(-5.0, 5.0));
            let max_life = self.fx_range(20.0, 50.0);
            self.particles.push(Particle {
                body: Body::new(origin, Vec2::new(w, h), color),
                vel,
                life: 0.0,
                max_life,
            });
        }
        if self.particles.len() > self.max_particles {
            let excess = self.particles.len() - self.max_particles;
            self.particles.drain(..excess);
        }
    }

    /// Every fifth level summons a boss
    pub fn is_boss_level(&self) -> bool {
        self.level % BOSS_LEVEL_INTERVAL == 0
    }
}
