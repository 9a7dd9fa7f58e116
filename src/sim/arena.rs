//! Brick grid, boss orbs, and damage application
//!
//! Damage and money are denominated in the same unit: the amount a hit awards
//! is exactly the amount removed from the target's remaining value. Money is
//! credited by the event reducer in `tick`, not here.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;

/// A destructible brick. `value` is the remaining HP in money units.
///
/// Invariant after every mutation: `0 <= value <= max_value` and
/// `alive == (value > 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub value: u64,
    pub max_value: u64,
    pub alive: bool,
}

impl Brick {
    /// Nearest-point circle-vs-rect overlap test
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let nearest_x = center.x.clamp(self.x, self.x + self.w);
        let nearest_y = center.y.clamp(self.y, self.y + self.h);
        let dx = center.x - nearest_x;
        let dy = center.y - nearest_y;
        dx * dx + dy * dy <= radius * radius
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// The timed boss orb that replaces the grid every 10th level
#[derive(Debug, Clone, PartialEq)]
pub struct Boss {
    pub pos: Vec2,
    pub radius: f32,
    pub value: u64,
    pub max_value: u64,
    pub alive: bool,
    /// Seconds until the boss escapes
    pub timer: f32,
}

/// The playing field: brick grid or a single boss, never both
#[derive(Debug, Clone)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub bricks: Vec<Brick>,
    pub boss: Option<Boss>,
}

impl Arena {
    pub fn generate(level: u32) -> Self {
        let mut arena = Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            bricks: Vec::new(),
            boss: None,
        };
        arena.generate_level(level);
        arena
    }

    /// Rebuild the arena contents for `level`
    pub fn generate_level(&mut self, level: u32) {
        let level = level.max(1);
        self.bricks.clear();
        self.boss = None;

        if level % BOSS_LEVEL_INTERVAL == 0 {
            let hp = (BOSS_HP_PER_LEVEL * level as u64).max(BOSS_MIN_HP);
            let radius = (20.0 + level as f32 * 2.0).min(BOSS_MAX_RADIUS);
            self.boss = Some(Boss {
                pos: Vec2::new(self.width / 2.0, self.height * 0.35),
                radius,
                value: hp,
                max_value: hp,
                alive: true,
                timer: BOSS_TIMER_SECS,
            });
            return;
        }

        // Grid scales with level: rows grow then cap at 8, cols cap at 12.
        let rows = (4 + (level - 1)).min(8);
        let cols = (7 + (level - 1) / 2).min(12);
        let total_pad = BRICK_PADDING * (cols as f32 + 1.0);
        let brick_w = ((self.width - total_pad) / cols as f32).floor();
        // Flat per-brick value: every brick on a level has identical HP.
        let value = BRICK_VALUE_PER_LEVEL * level as u64;

        for r in 0..rows {
            for c in 0..cols {
                let x = BRICK_PADDING + c as f32 * (brick_w + BRICK_PADDING);
                let y = BRICK_OFFSET_TOP + r as f32 * (BRICK_HEIGHT + BRICK_PADDING);
                self.bricks.push(Brick {
                    x,
                    y,
                    w: brick_w,
                    h: BRICK_HEIGHT,
                    value,
                    max_value: value,
                    alive: true,
                });
            }
        }
    }

    pub fn all_bricks_dead(&self) -> bool {
        self.bricks.iter().all(|b| !b.alive)
    }

    /// True once the current level is beaten: boss dead on a boss level,
    /// every brick dead otherwise.
    pub fn cleared(&self) -> bool {
        match &self.boss {
            Some(boss) => !boss.alive,
            None => !self.bricks.is_empty() && self.all_bricks_dead(),
        }
    }
}

/// Roll a critical hit: chance = min(0.5, stacks * 0.05)
pub fn roll_crit(crit_stacks: u32, rng: &mut impl Rng) -> bool {
    let chance = (crit_stacks as f64 * CRIT_CHANCE_PER_STACK).min(CRIT_CHANCE_CAP);
    chance > 0.0 && rng.random::<f64>() < chance
}

/// Apply damage to a brick (doubled on crit, capped at remaining value) and
/// return the awarded amount. Dead bricks award 0 and are left untouched.
pub fn damage_brick(brick: &mut Brick, amount: u64, crit: bool) -> u64 {
    if !brick.alive || amount == 0 {
        return 0;
    }
    let effective = if crit { amount * 2 } else { amount };
    let awarded = effective.min(brick.value);
    brick.value -= awarded;
    if brick.value == 0 {
        brick.alive = false;
    }
    awarded
}

/// Boss counterpart of [`damage_brick`], same award rules
pub fn damage_boss(boss: &mut Boss, amount: u64, crit: bool) -> u64 {
    if !boss.alive || amount == 0 {
        return 0;
    }
    let effective = if crit { amount * 2 } else { amount };
    let awarded = effective.min(boss.value);
    boss.value -= awarded;
    if boss.value == 0 {
        boss.alive = false;
    }
    awarded
}
