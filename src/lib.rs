//! Brickfall - an incremental brick breaker
//!
//! Core modules:
//! - `sim`: deterministic simulation (catalog, economy, arena, physics, progression)
//! - `persistence`: versioned save-blob codec with legacy-field migration
//! - `platform`: key-value storage abstraction (LocalStorage on web)
//! - `game`: facade owning the single state instance and the command/query surface

pub mod game;
pub mod persistence;
pub mod platform;
pub mod sim;

pub use game::Game;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (canvas units)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Lower bound on a single integration step. Drivers run at whatever rate
    /// they like; a step never integrates less than this.
    pub const DT_FLOOR: f32 = 1.0 / 1000.0;

    /// Economy
    pub const START_MONEY: u64 = 0;
    pub const BASE_MAX_ACTIVE_BALLS: usize = 20;
    pub const PRICE_GROWTH: f64 = 1.15;
    /// Balls granted to the inventory on the very first run
    pub const FIRST_RUN_STANDARD_BALLS: u32 = 20;

    /// Rebirth (prestige)
    pub const REBIRTH_COST: u64 = 50_000;
    pub const REBIRTH_CAPACITY_BONUS: usize = 5;
    pub const REBIRTH_GEM_AWARD: u32 = 1;

    /// Upgrades
    pub const UPGRADE_BASE_COST: u64 = 50;
    pub const CLICK_UPGRADE_BASE_COST: u64 = 20;
    pub const UPGRADE_COST_GROWTH: f64 = 1.18;
    pub const UPGRADE_LEVEL_TAX: f64 = 0.03;
    pub const SPEED_MULT_PER_LEVEL: f32 = 1.08;
    pub const DAMAGE_BONUS_RATIO: f64 = 1.25;

    /// Crit chance per stack of the crit gem item, and its hard cap
    pub const CRIT_CHANCE_PER_STACK: f64 = 0.05;
    pub const CRIT_CHANCE_CAP: f64 = 0.5;

    /// Bricks
    pub const BRICK_VALUE_PER_LEVEL: u64 = 5;
    pub const BRICK_HEIGHT: f32 = 22.0;
    pub const BRICK_PADDING: f32 = 6.0;
    pub const BRICK_OFFSET_TOP: f32 = 40.0;

    /// Boss orbs (every 10th level)
    pub const BOSS_LEVEL_INTERVAL: u32 = 10;
    pub const BOSS_HP_PER_LEVEL: u64 = 1000;
    pub const BOSS_MIN_HP: u64 = 5000;
    pub const BOSS_MAX_RADIUS: f32 = 60.0;
    pub const BOSS_TIMER_SECS: f32 = 30.0;
    /// Fraction of max HP paid out when the boss escapes
    pub const BOSS_TIMEOUT_AWARD_FACTOR: f64 = 0.5;

    /// Balls
    pub const BALL_RADIUS: f32 = 6.0;
    pub const HEAVY_BALL_RADIUS: f32 = 8.0;
    pub const SCATTER_CHILD_RADIUS: f32 = 4.0;
    pub const SCATTER_SPLIT_COOLDOWN: f32 = 0.150;
    pub const SCATTER_MAX_CHILDREN: u8 = 10;
    /// Direction jitter on a brick hit (radians, +/-)
    pub const BRICK_HIT_JITTER: f32 = 0.15;

    /// Level transition phases (seconds)
    pub const TRANSITION_FADE_OUT: f32 = 0.25;
    pub const TRANSITION_HOLD: f32 = 0.20;
    pub const TRANSITION_FADE_IN: f32 = 0.25;

    /// Periodic autosave interval (seconds)
    pub const AUTOSAVE_INTERVAL: f32 = 15.0;
}
