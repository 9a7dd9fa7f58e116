//! Save/load codec
//!
//! A versioned, flat JSON record written into a single storage slot. Decoding
//! is deliberately tolerant: legacy field names are coerced through an
//! explicit migration step, absent fields default, extra fields are ignored,
//! and a save with no alive bricks makes the caller regenerate the arena.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::consts::*;
use crate::sim::catalog::GemItem;
use crate::sim::progression::Phase;
use crate::sim::{BallKind, Brick, GameState, UpgradeKey};

/// The only defined save version. Unknown versions are read as this one.
pub const SAVE_VERSION: u32 = 1;

/// Storage slot for the save blob
pub const SAVE_KEY: &str = "brickfall-save";
/// Flag marking that the game has run before (gates first-run defaults)
pub const SEEN_KEY: &str = "brickfall-seen";

/// Flat persisted record
#[derive(Debug, Clone, Serialize)]
pub struct SaveBlob {
    pub version: u32,
    pub money: u64,
    pub gems: u32,
    pub rebirths: u32,
    pub level: u32,
    #[serde(rename = "maxActiveBalls")]
    pub max_active_balls: usize,
    /// Owned balls per type id
    pub inventory: BTreeMap<String, u32>,
    /// Current buy price per type id
    pub prices: BTreeMap<String, u64>,
    pub upgrades: BTreeMap<String, u32>,
    #[serde(rename = "gemItems")]
    pub gem_items: BTreeMap<String, u32>,
    pub bricks: Vec<BrickRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrickRecord {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub value: u64,
    pub alive: bool,
    #[serde(rename = "maxValue")]
    pub max_value: u64,
}

/// Serialize the persisted slice of the state. Active balls are not stored;
/// the loader respawns them from the inventory counts.
pub fn encode(state: &GameState) -> Option<String> {
    let blob = SaveBlob {
        version: SAVE_VERSION,
        money: state.money,
        gems: state.gems,
        rebirths: state.rebirths,
        level: state.level,
        max_active_balls: state.max_active_balls,
        inventory: state
            .inventory
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect(),
        prices: state
            .prices
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect(),
        upgrades: state
            .upgrades
            .iter()
            .map(|(k, v)| (k.as_string(), *v))
            .collect(),
        gem_items: state
            .gem_items
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect(),
        bricks: state
            .arena
            .bricks
            .iter()
            .map(|b| BrickRecord {
                x: b.x,
                y: b.y,
                w: b.w,
                h: b.h,
                value: b.value,
                alive: b.alive,
                max_value: b.max_value,
            })
            .collect(),
    };
    serde_json::to_string(&blob).ok()
}

/// Parse a raw slot value. Returns `None` only for unusable input (not JSON,
/// or not an object); everything else migrates field by field.
pub fn decode(raw: &str) -> Option<SaveBlob> {
    let value: Value = serde_json::from_str(raw).ok()?;
    migrate(&value)
}

/// Explicit migration from any known save shape to the current one. One
/// coercion case per legacy field name, nothing inferred inline elsewhere.
fn migrate(value: &Value) -> Option<SaveBlob> {
    let obj = value.as_object()?;

    // legacy saves called these ballsByType / pricesByType
    let mut inventory: BTreeMap<String, u32> =
        coerce_map_u64(obj.get("inventory").or_else(|| obj.get("ballsByType")))
            .into_iter()
            .map(|(k, v)| (k, v as u32))
            .collect();
    let mut prices = coerce_map_u64(obj.get("prices").or_else(|| obj.get("pricesByType")));
    // the oldest shape tracked standard balls in two scalars
    if !inventory.contains_key("standard") {
        if let Some(n) = coerce_u64(obj.get("ballsOwned")) {
            inventory.insert("standard".to_string(), n as u32);
        }
    }
    if !prices.contains_key("standard") {
        if let Some(p) = coerce_u64(obj.get("ballPrice")) {
            prices.insert("standard".to_string(), p);
        }
    }

    Some(SaveBlob {
        version: coerce_u64(obj.get("version")).unwrap_or(SAVE_VERSION as u64) as u32,
        money: coerce_u64(obj.get("money")).unwrap_or(0),
        gems: coerce_u64(obj.get("gems")).unwrap_or(0) as u32,
        rebirths: coerce_u64(obj.get("rebirths")).unwrap_or(0) as u32,
        level: coerce_u64(obj.get("level")).unwrap_or(1).max(1) as u32,
        max_active_balls: coerce_u64(obj.get("maxActiveBalls"))
            .unwrap_or(BASE_MAX_ACTIVE_BALLS as u64)
            .max(1) as usize,
        inventory,
        prices,
        upgrades: coerce_map_u64(obj.get("upgrades"))
            .into_iter()
            .map(|(k, v)| (k, v as u32))
            .collect(),
        gem_items: coerce_map_u64(obj.get("gemItems"))
            .into_iter()
            .map(|(k, v)| (k, v as u32))
            .collect(),
        bricks: obj
            .get("bricks")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(migrate_brick).collect())
            .unwrap_or_default(),
    })
}

/// Per-brick migration: `value`, else legacy `hp`, else legacy `maxHp`,
/// else 0; `alive` defaults to `value > 0` and is always re-derived so a
/// stored record cannot disagree with its own value.
fn migrate_brick(value: &Value) -> Option<BrickRecord> {
    let obj = value.as_object()?;
    let hp = [obj.get("value"), obj.get("hp"), obj.get("maxHp")]
        .into_iter()
        .find_map(coerce_u64)
        .unwrap_or(0);
    let max_value = coerce_u64(obj.get("maxValue")).unwrap_or(hp).max(hp);
    let alive = obj
        .get("alive")
        .and_then(Value::as_bool)
        .unwrap_or(hp > 0)
        && hp > 0;
    Some(BrickRecord {
        x: coerce_f32(obj.get("x")),
        y: coerce_f32(obj.get("y")),
        w: coerce_f32(obj.get("w")),
        h: coerce_f32(obj.get("h")),
        value: hp,
        alive,
        max_value,
    })
}

/// Type-checked numeric coercion: accepts any JSON number, clamps negatives
fn coerce_u64(value: Option<&Value>) -> Option<u64> {
    value?.as_f64().map(|f| f.max(0.0) as u64)
}

fn coerce_f32(value: Option<&Value>) -> f32 {
    value.and_then(Value::as_f64).unwrap_or(0.0) as f32
}

fn coerce_map_u64(value: Option<&Value>) -> BTreeMap<String, u64> {
    value
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| coerce_u64(Some(v)).map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}

/// Rebuild a `GameState` from a decoded blob. Active balls are not restored
/// here; the caller respawns them from the inventory. Returns true when the
/// arena had to be regenerated because the save held no alive bricks.
pub fn apply(blob: &SaveBlob, state: &mut GameState) -> bool {
    state.money = blob.money;
    state.gems = blob.gems;
    state.rebirths = blob.rebirths;
    state.level = blob.level.max(1);
    state.max_active_balls = blob.max_active_balls;

    for (key, count) in &blob.inventory {
        if let Some(kind) = BallKind::parse(key) {
            state.inventory.insert(kind, *count);
        }
    }
    for (key, price) in &blob.prices {
        if let Some(kind) = BallKind::parse(key) {
            state.prices.insert(kind, (*price).max(1));
        }
    }
    for (key, level) in &blob.upgrades {
        if let Some(upgrade) = UpgradeKey::parse(key) {
            state.upgrades.insert(upgrade, *level);
        }
    }
    for (key, stacks) in &blob.gem_items {
        if let Some(item) = GemItem::parse(key) {
            state.gem_items.insert(item, *stacks);
        }
    }

    state.balls.clear();
    state.phase = Phase::Playing;
    state.time_secs = 0.0;

    let any_alive = blob.bricks.iter().any(|b| b.alive);
    if any_alive {
        state.arena.boss = None;
        state.arena.bricks = blob
            .bricks
            .iter()
            .map(|b| Brick {
                x: b.x,
                y: b.y,
                w: b.w,
                h: b.h,
                value: b.value,
                max_value: b.max_value,
                alive: b.alive,
            })
            .collect();
        false
    } else {
        // corrupt or legacy save: never leave the player with an empty field
        state.arena.generate_level(state.level);
        true
    }
}
