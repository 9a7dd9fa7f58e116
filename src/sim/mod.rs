//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (injected by the caller)
//! - Stable iteration order (balls and bricks in array order, maps BTree-keyed)
//! - No rendering or platform dependencies

pub mod arena;
pub mod catalog;
pub mod economy;
pub mod progression;
pub mod state;
pub mod tick;

pub use arena::{Arena, Boss, Brick};
pub use catalog::{BallKind, BallTypeDef, GemItem, gem_item_def, type_def};
pub use progression::{Phase, TransitionPhase, TransitionSnapshot};
pub use state::{Ball, Behavior, GameState, UpgradeKey};
pub use tick::{SimEvent, apply_events, click_at, step};
