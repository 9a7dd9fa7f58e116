//! Game state and core simulation types
//!
//! One `GameState` holds everything: the economy ledger, the arena, and the
//! active balls. The tick driver owns the single instance; all mutation goes
//! through explicit transition functions.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::arena::Arena;
use super::catalog::{self, BallKind, GemItem};
use super::progression::Phase;
use crate::consts::*;

/// Behavior variant of an active ball. Behavior-specific fields exist only on
/// the matching variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Standard,
    Heavy,
    /// Alternates between seeking the nearest brick and flying until a wall
    /// bounce re-arms targeting.
    Sniper {
        can_retarget: bool,
        hit_brick_since_wall: bool,
    },
    /// Splits on wall bounces and brick hits, subject to a cooldown and a
    /// lifetime child cap.
    Scatter {
        last_split_at: f32,
        children_spawned: u8,
    },
    /// Transient child from a scatter split; capacity-exempt, discarded at
    /// the next level transition.
    ScatterChild,
}

impl Behavior {
    pub fn for_kind(kind: BallKind) -> Self {
        match kind {
            BallKind::Standard => Behavior::Standard,
            BallKind::Heavy => Behavior::Heavy,
            BallKind::Sniper => Behavior::Sniper {
                can_retarget: true,
                hit_brick_since_wall: false,
            },
            BallKind::Scatter => Behavior::Scatter {
                last_split_at: f32::NEG_INFINITY,
                children_spawned: 0,
            },
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Behavior::ScatterChild)
    }
}

/// An active ball in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub kind: BallKind,
    /// Damage per hit in money units (base + damage-upgrade bonus)
    pub damage: u64,
    pub behavior: Behavior,
}

/// Keys in the upgrade-level map: per-type damage, per-type speed, and click
/// damage. String forms are `"<id>"`, `"<id>-speed"`, `"click"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpgradeKey {
    Damage(BallKind),
    Speed(BallKind),
    Click,
}

impl UpgradeKey {
    pub fn as_string(&self) -> String {
        match self {
            UpgradeKey::Damage(kind) => kind.as_str().to_string(),
            UpgradeKey::Speed(kind) => format!("{}-speed", kind.as_str()),
            UpgradeKey::Click => "click".to_string(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s == "click" {
            return Some(UpgradeKey::Click);
        }
        if let Some(base) = s.strip_suffix("-speed") {
            return BallKind::parse(base).map(UpgradeKey::Speed);
        }
        BallKind::parse(s).map(UpgradeKey::Damage)
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub money: u64,
    pub gems: u32,
    pub rebirths: u32,
    pub level: u32,
    /// Cap on active balls, scatter children excluded. Enforced at spawn time.
    pub max_active_balls: usize,
    /// Owned balls per type (active instances are spawned from this count)
    pub inventory: BTreeMap<BallKind, u32>,
    /// Current buy price per type; scales up on purchase, resets on rebirth
    pub prices: BTreeMap<BallKind, u64>,
    pub upgrades: BTreeMap<UpgradeKey, u32>,
    pub gem_items: BTreeMap<GemItem, u32>,
    pub balls: Vec<Ball>,
    pub arena: Arena,
    pub phase: Phase,
    /// Simulation clock in seconds; drives scatter split cooldowns
    pub time_secs: f32,
}

impl GameState {
    pub fn new() -> Self {
        let mut state = Self {
            money: START_MONEY,
            gems: 0,
            rebirths: 0,
            level: 1,
            max_active_balls: BASE_MAX_ACTIVE_BALLS,
            inventory: BTreeMap::new(),
            prices: BTreeMap::new(),
            upgrades: BTreeMap::new(),
            gem_items: BTreeMap::new(),
            balls: Vec::new(),
            arena: Arena::generate(1),
            phase: Phase::Playing,
            time_secs: 0.0,
        };
        for def in &catalog::CATALOG {
            state.inventory.insert(def.kind, 0);
            state.prices.insert(def.kind, def.price);
        }
        state
    }

    /// Active balls that count against `max_active_balls`
    pub fn active_non_child_count(&self) -> usize {
        self.balls.iter().filter(|b| !b.behavior.is_child()).count()
    }

    pub fn capacity_remaining(&self) -> usize {
        self.max_active_balls
            .saturating_sub(self.active_non_child_count())
    }

    pub fn active_of_kind(&self, kind: BallKind) -> usize {
        self.balls
            .iter()
            .filter(|b| b.kind == kind && !b.behavior.is_child())
            .count()
    }

    pub fn price_of(&self, kind: BallKind) -> u64 {
        self.prices
            .get(&kind)
            .copied()
            .unwrap_or_else(|| catalog::type_def(kind).price)
    }

    pub fn owned(&self, kind: BallKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }

    pub fn upgrade_level(&self, key: UpgradeKey) -> u32 {
        self.upgrades.get(&key).copied().unwrap_or(0)
    }

    pub fn gem_item_stacks(&self, item: GemItem) -> u32 {
        self.gem_items.get(&item).copied().unwrap_or(0)
    }

    pub fn crit_stacks(&self) -> u32 {
        self.gem_item_stacks(GemItem::Crit)
    }

    /// Total damage-upgrade bonus at `level`: a geometric series with each
    /// term rounded before summing.
    pub fn damage_bonus(level: u32) -> u64 {
        (0..level)
            .map(|k| DAMAGE_BONUS_RATIO.powi(k as i32).round() as u64)
            .sum()
    }

    /// Per-hit damage for a freshly spawned ball of `kind`
    pub fn ball_damage(&self, kind: BallKind) -> u64 {
        catalog::type_def(kind).base_damage
            + Self::damage_bonus(self.upgrade_level(UpgradeKey::Damage(kind)))
    }

    pub fn speed_multiplier(&self, kind: BallKind) -> f32 {
        SPEED_MULT_PER_LEVEL.powi(self.upgrade_level(UpgradeKey::Speed(kind)) as i32)
    }

    pub fn click_damage(&self) -> u64 {
        1 + self.upgrade_level(UpgradeKey::Click) as u64
    }

    /// Spawn point: arena center with a little jitter so stacked spawns
    /// separate on their own.
    pub fn spawn_point(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            self.arena.width / 2.0 + (rng.random::<f32>() - 0.5) * 12.0,
            self.arena.height / 2.0 + (rng.random::<f32>() - 0.5) * 12.0,
        )
    }

    /// Launch velocity for `kind` with the current speed upgrade applied.
    /// Heavy balls fly slower.
    pub fn spawn_velocity(&self, kind: BallKind, rng: &mut impl Rng) -> Vec2 {
        let mut vx = (rng.random::<f32>() - 0.5) * 72.0;
        let mut vy = -(210.0 + rng.random::<f32>() * 72.0);
        if kind == BallKind::Heavy {
            vx *= 0.6;
            vy *= 0.6;
        }
        Vec2::new(vx, vy) * self.speed_multiplier(kind)
    }

    /// Spawn one active ball of `kind` at `pos`. Returns false when the
    /// capacity cap is hit (scatter children bypass this path entirely).
    pub fn spawn_ball(&mut self, kind: BallKind, pos: Vec2, rng: &mut impl Rng) -> bool {
        if self.capacity_remaining() == 0 {
            return false;
        }
        let radius = if kind == BallKind::Heavy {
            HEAVY_BALL_RADIUS
        } else {
            BALL_RADIUS
        };
        let vel = self.spawn_velocity(kind, rng);
        let damage = self.ball_damage(kind);
        self.balls.push(Ball {
            pos,
            vel,
            radius,
            kind,
            damage,
            behavior: Behavior::for_kind(kind),
        });
        true
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_upgrade_key_string_forms() {
        assert_eq!(UpgradeKey::Click.as_string(), "click");
        assert_eq!(UpgradeKey::Damage(BallKind::Heavy).as_string(), "heavy");
        assert_eq!(
            UpgradeKey::Speed(BallKind::Sniper).as_string(),
            "sniper-speed"
        );
        for key in [
            UpgradeKey::Click,
            UpgradeKey::Damage(BallKind::Scatter),
            UpgradeKey::Speed(BallKind::Standard),
        ] {
            assert_eq!(UpgradeKey::parse(&key.as_string()), Some(key));
        }
        assert_eq!(UpgradeKey::parse("bogus-speed"), None);
    }

    #[test]
    fn test_damage_bonus_series() {
        // round(1.25^k) summed: 1, 1+1, 1+1+2, ...
        assert_eq!(GameState::damage_bonus(0), 0);
        assert_eq!(GameState::damage_bonus(1), 1);
        assert_eq!(GameState::damage_bonus(2), 2);
        assert_eq!(GameState::damage_bonus(3), 4);
        assert_eq!(GameState::damage_bonus(4), 6);
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut state = GameState::new();
        state.max_active_balls = 3;
        for _ in 0..5 {
            let pos = state.spawn_point(&mut rng);
            state.spawn_ball(BallKind::Standard, pos, &mut rng);
        }
        assert_eq!(state.balls.len(), 3);
        assert_eq!(state.capacity_remaining(), 0);
    }

    #[test]
    fn test_children_are_capacity_exempt() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut state = GameState::new();
        state.max_active_balls = 1;
        let pos = state.spawn_point(&mut rng);
        assert!(state.spawn_ball(BallKind::Scatter, pos, &mut rng));
        state.balls.push(Ball {
            pos,
            vel: Vec2::ZERO,
            radius: SCATTER_CHILD_RADIUS,
            kind: BallKind::Scatter,
            damage: 1,
            behavior: Behavior::ScatterChild,
        });
        assert_eq!(state.active_non_child_count(), 1);
        assert_eq!(state.capacity_remaining(), 0);
        assert_eq!(state.balls.len(), 2);
    }

    #[test]
    fn test_heavy_spawns_slower_and_bigger() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut state = GameState::new();
        let pos = state.spawn_point(&mut rng);
        state.spawn_ball(BallKind::Heavy, pos, &mut rng);
        state.spawn_ball(BallKind::Standard, pos, &mut rng);
        let heavy = &state.balls[0];
        let standard = &state.balls[1];
        assert_eq!(heavy.radius, HEAVY_BALL_RADIUS);
        assert_eq!(heavy.damage, 5);
        assert!(heavy.vel.length() < standard.vel.length());
    }
}
