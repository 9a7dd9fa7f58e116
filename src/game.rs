//! Game facade
//!
//! Owns the simulation state, the RNG, and a storage backend, and is the only
//! layer that touches persistence. Every money-changing operation writes
//! through to the store; a slow autosave catches anything that slips past.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::persistence::{self, SAVE_KEY, SEEN_KEY};
use crate::platform::KvStore;
use crate::sim::progression::{self, TransitionSnapshot};
use crate::sim::{self, BallKind, GameState, GemItem, UpgradeKey};

pub struct Game<S: KvStore> {
    state: GameState,
    rng: Pcg32,
    store: S,
    autosave_clock: f32,
}

impl<S: KvStore> Game<S> {
    /// Boot the game: restore the save if one exists, otherwise seed a
    /// first-run state with a starting stock of standard balls.
    pub fn new(store: S, seed: u64) -> Self {
        let mut game = Self {
            state: GameState::new(),
            rng: Pcg32::seed_from_u64(seed),
            store,
            autosave_clock: 0.0,
        };
        game.load();
        game
    }

    /// Re-read the save slot and rebuild the state from it. The starting
    /// stock is granted only when the seen flag is absent; a returning
    /// player with an unreadable save recovers to an empty inventory.
    pub fn load(&mut self) {
        let blob = self
            .store
            .get(SAVE_KEY)
            .and_then(|raw| persistence::decode(&raw));

        match blob {
            Some(blob) => {
                self.state = GameState::new();
                let regenerated = persistence::apply(&blob, &mut self.state);
                if regenerated {
                    log::warn!("save held no alive bricks, regenerated level {}", self.state.level);
                }
                for kind in BallKind::ALL {
                    self.spawn_from_inventory(kind);
                }
            }
            None => {
                self.state = GameState::new();
                if self.store.get(SEEN_KEY).is_none() {
                    self.state
                        .inventory
                        .insert(BallKind::Standard, FIRST_RUN_STANDARD_BALLS);
                    self.spawn_from_inventory(BallKind::Standard);
                    self.store.set(SEEN_KEY, "1");
                } else {
                    log::warn!("save missing or unreadable, starting fresh");
                }
                self.save();
            }
        }
    }

    /// Best-effort write of the current state to the store
    pub fn save(&mut self) {
        match persistence::encode(&self.state) {
            Some(json) => {
                if !self.store.set(SAVE_KEY, &json) {
                    log::warn!("save write failed");
                }
            }
            None => log::warn!("save serialization failed"),
        }
    }

    /// Advance the simulation by `dt` seconds of wall time
    pub fn step(&mut self, dt: f32) {
        let level_before = self.state.level;
        let events = sim::step(&mut self.state, dt, &mut self.rng);
        let money_changed = sim::apply_events(&mut self.state, &events);

        self.autosave_clock += dt;
        if money_changed
            || self.state.level != level_before
            || self.autosave_clock >= AUTOSAVE_INTERVAL
        {
            self.autosave_clock = 0.0;
            self.save();
        }
    }

    /// Manual click damage at arena coordinates
    pub fn click_at(&mut self, x: f32, y: f32) {
        let events = sim::click_at(&mut self.state, Vec2::new(x, y), &mut self.rng);
        if sim::apply_events(&mut self.state, &events) {
            self.save();
        }
    }

    pub fn purchase(&mut self, kind: BallKind, count: u32) -> bool {
        let ok = self.state.purchase(kind, count, None, &mut self.rng);
        if ok {
            self.save();
        }
        ok
    }

    pub fn sell(&mut self, kind: BallKind, count: u32) -> u32 {
        let sold = self.state.sell(kind, count, None);
        if sold > 0 {
            self.save();
        }
        sold
    }

    pub fn purchase_upgrade(&mut self, key: UpgradeKey) -> bool {
        let ok = self.state.purchase_upgrade(key);
        if ok {
            self.save();
        }
        ok
    }

    pub fn purchase_gem_item(&mut self, item: GemItem) -> bool {
        let ok = self.state.purchase_gem_item(item);
        if ok {
            self.save();
        }
        ok
    }

    pub fn use_gem_item(&mut self, item: GemItem) -> bool {
        let ok = self.state.use_gem_item(item, &mut self.rng);
        if ok {
            self.save();
        }
        ok
    }

    pub fn rebirth(&mut self) -> bool {
        let ok = self.state.rebirth();
        if ok {
            // prestige wipes the table; respawn from the reset inventory
            for kind in BallKind::ALL {
                self.spawn_from_inventory(kind);
            }
            self.save();
        }
        ok
    }

    /// Hard reset: wipes everything including prestige, back to first-run
    pub fn reset_all(&mut self) {
        self.state.reset_all();
        self.store.remove(SAVE_KEY);
        self.state
            .inventory
            .insert(BallKind::Standard, FIRST_RUN_STANDARD_BALLS);
        self.spawn_from_inventory(BallKind::Standard);
        self.store.set(SEEN_KEY, "1");
        self.autosave_clock = 0.0;
        self.save();
    }

    /// Spawn active balls of `kind` until the inventory count or the
    /// capacity is reached, whichever comes first.
    pub fn spawn_from_inventory(&mut self, kind: BallKind) {
        let owned = self.state.owned(kind) as usize;
        let active = self.state.active_of_kind(kind);
        let to_spawn = owned
            .saturating_sub(active)
            .min(self.state.capacity_remaining());
        for _ in 0..to_spawn {
            let pos = self.state.spawn_point(&mut self.rng);
            self.state.spawn_ball(kind, pos, &mut self.rng);
        }
    }

    // Query surface for drivers and UI

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn money(&self) -> u64 {
        self.state.money
    }

    pub fn gems(&self) -> u32 {
        self.state.gems
    }

    pub fn rebirths(&self) -> u32 {
        self.state.rebirths
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn transition(&self) -> TransitionSnapshot {
        progression::snapshot(&self.state.phase)
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}
