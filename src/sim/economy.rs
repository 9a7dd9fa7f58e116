//! Economy ledger: purchases, sales, upgrades, the gem shop, and rebirth
//!
//! Every transition is atomic against the state: a failed operation leaves it
//! untouched and reports through the return value. Nothing here throws.

use rand::Rng;

use super::catalog::{self, BallKind, GemItem};
use super::progression::Phase;
use super::state::{GameState, UpgradeKey};
use crate::consts::*;

impl GameState {
    /// Buy `count` balls of `kind`. The count is clamped to remaining
    /// capacity and to what the player can afford; the clamped purchase
    /// either happens in full or not at all. Price scaling is applied only
    /// after a successful purchase, once per unit bought.
    pub fn purchase(
        &mut self,
        kind: BallKind,
        count: u32,
        unit_price_override: Option<u64>,
        rng: &mut impl Rng,
    ) -> bool {
        let unit_price = unit_price_override
            .filter(|p| *p > 0)
            .unwrap_or_else(|| self.price_of(kind));
        if unit_price == 0 {
            return false;
        }
        let actual = (count as u64)
            .min(self.capacity_remaining() as u64)
            .min(self.money / unit_price) as u32;
        if actual == 0 {
            return false;
        }

        self.money -= unit_price * actual as u64;
        *self.inventory.entry(kind).or_insert(0) += actual;
        for _ in 0..actual {
            let pos = self.spawn_point(rng);
            self.spawn_ball(kind, pos, rng);
        }

        let scaled = (self.price_of(kind) as f64 * PRICE_GROWTH.powi(actual as i32))
            .round()
            .max(1.0);
        self.prices.insert(kind, scaled as u64);
        true
    }

    /// Sell up to `count` balls of `kind` at half the current buy price.
    /// Removes the most-recently-added active balls of that type first
    /// (scatter children are not sellable). Returns the units sold.
    pub fn sell(&mut self, kind: BallKind, count: u32, unit_price_override: Option<u64>) -> u32 {
        let owned = self.owned(kind);
        let to_sell = count.min(owned);
        if to_sell == 0 {
            return 0;
        }
        let buy_price = unit_price_override
            .filter(|p| *p > 0)
            .unwrap_or_else(|| self.price_of(kind));
        let sell_unit = buy_price / 2;

        let mut removed = 0;
        for i in (0..self.balls.len()).rev() {
            if removed >= to_sell {
                break;
            }
            if self.balls[i].kind == kind && !self.balls[i].behavior.is_child() {
                self.balls.remove(i);
                removed += 1;
            }
        }

        self.inventory.insert(kind, owned - to_sell);
        self.money += sell_unit * to_sell as u64;
        to_sell
    }

    /// Cost of the next level of `key`. Grows geometrically with the key's
    /// own level and takes a flat tax from the current game level.
    pub fn upgrade_cost(&self, key: UpgradeKey) -> u64 {
        let base = if key == UpgradeKey::Click {
            CLICK_UPGRADE_BASE_COST
        } else {
            UPGRADE_BASE_COST
        };
        let key_level = self.upgrade_level(key);
        (base as f64
            * UPGRADE_COST_GROWTH.powi(key_level as i32)
            * (1.0 + self.level as f64 * UPGRADE_LEVEL_TAX))
            .ceil() as u64
    }

    /// Buy one level of `key`. Fails silently on insufficient funds. Live
    /// balls are updated in place: speed keys rescale velocity preserving
    /// heading, damage keys overwrite per-hit damage (scatter children keep
    /// theirs - it derives from the parent at split time).
    pub fn purchase_upgrade(&mut self, key: UpgradeKey) -> bool {
        let cost = self.upgrade_cost(key);
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        let new_level = self.upgrade_level(key) + 1;
        self.upgrades.insert(key, new_level);

        match key {
            UpgradeKey::Speed(kind) => {
                // new multiplier / old multiplier is a single growth step
                for ball in self.balls.iter_mut().filter(|b| b.kind == kind) {
                    ball.vel *= SPEED_MULT_PER_LEVEL;
                }
            }
            UpgradeKey::Damage(kind) => {
                let damage = self.ball_damage(kind);
                for ball in self
                    .balls
                    .iter_mut()
                    .filter(|b| b.kind == kind && !b.behavior.is_child())
                {
                    ball.damage = damage;
                }
            }
            UpgradeKey::Click => {}
        }
        true
    }

    /// Buy one stack of a gem-shop item. Permanent items enforce their stack
    /// cap; the crit item's first stack is discounted.
    pub fn purchase_gem_item(&mut self, item: GemItem) -> bool {
        let def = catalog::gem_item_def(item);
        let stacks = self.gem_item_stacks(item);
        if let Some(cap) = def.max_stacks {
            if stacks >= cap {
                return false;
            }
        }
        let cost = if stacks == 0 {
            def.first_cost.unwrap_or(def.cost)
        } else {
            def.cost
        };
        if self.gems < cost {
            return false;
        }
        self.gems -= cost;
        *self.gem_items.entry(item).or_insert(0) += 1;
        true
    }

    /// Consume one stack of a consumable item. Permanent items are passive
    /// and cannot be used.
    pub fn use_gem_item(&mut self, item: GemItem, rng: &mut impl Rng) -> bool {
        let def = catalog::gem_item_def(item);
        if def.max_stacks.is_some() {
            return false;
        }
        let stacks = self.gem_item_stacks(item);
        if stacks == 0 {
            return false;
        }
        self.gem_items.insert(item, stacks - 1);

        match item {
            GemItem::BonusBalls => {
                *self.inventory.entry(BallKind::Standard).or_insert(0) += 3;
                for _ in 0..3 {
                    let pos = self.spawn_point(rng);
                    self.spawn_ball(BallKind::Standard, pos, rng);
                }
            }
            GemItem::Crit => {}
        }
        true
    }

    /// Prestige reset: trade accumulated money for a gem and a permanent
    /// capacity bonus. Gems and the rebirth count survive; everything else
    /// returns to its starting value.
    pub fn rebirth(&mut self) -> bool {
        if self.money < REBIRTH_COST {
            return false;
        }
        self.money = START_MONEY;
        self.rebirths += 1;
        self.gems += REBIRTH_GEM_AWARD;
        self.max_active_balls += REBIRTH_CAPACITY_BONUS;
        for def in &catalog::CATALOG {
            self.inventory.insert(def.kind, 0);
            self.prices.insert(def.kind, def.price);
        }
        self.upgrades.clear();
        self.balls.clear();
        self.level = 1;
        self.arena.generate_level(1);
        self.phase = Phase::Playing;
        self.time_secs = 0.0;
        true
    }

    /// Factory reset: everything goes, prestige currency included
    pub fn reset_all(&mut self) {
        *self = GameState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_purchase_clamps_to_funds_and_capacity() {
        // money=100, unit=15, capacity=3, request 10 -> buys 3 for 45
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 100;
        state.max_active_balls = 3;
        assert!(state.purchase(BallKind::Standard, 10, Some(15), &mut rng));
        assert_eq!(state.money, 55);
        assert_eq!(state.owned(BallKind::Standard), 3);
        assert_eq!(state.balls.len(), 3);
    }

    #[test]
    fn test_purchase_fails_without_state_change() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 5;
        let price_before = state.price_of(BallKind::Standard);
        assert!(!state.purchase(BallKind::Standard, 1, None, &mut rng));
        assert_eq!(state.money, 5);
        assert_eq!(state.price_of(BallKind::Standard), price_before);
        assert!(state.balls.is_empty());
    }

    #[test]
    fn test_price_scales_only_on_success() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 1000;
        assert!(state.purchase(BallKind::Standard, 2, None, &mut rng));
        // 10 * 1.15^2 = 13.225 -> 13
        assert_eq!(state.price_of(BallKind::Standard), 13);
    }

    #[test]
    fn test_sell_removes_most_recent_active_first() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 1000;
        state.purchase(BallKind::Standard, 2, Some(10), &mut rng);
        state.purchase(BallKind::Heavy, 1, Some(45), &mut rng);
        let last_standard = state.balls[1].clone();

        let sold = state.sell(BallKind::Standard, 1, Some(10));
        assert_eq!(sold, 1);
        // the later standard ball is gone, the earlier one survives
        assert_eq!(state.balls.len(), 2);
        assert!(state.balls.iter().all(|b| *b != last_standard));
        assert_eq!(state.owned(BallKind::Standard), 1);
    }

    #[test]
    fn test_sell_credits_half_buy_price() {
        let mut state = GameState::new();
        state.inventory.insert(BallKind::Heavy, 4);
        let sold = state.sell(BallKind::Heavy, 10, Some(45));
        assert_eq!(sold, 4);
        assert_eq!(state.money, 22 * 4);
        assert_eq!(state.owned(BallKind::Heavy), 0);
    }

    #[test]
    fn test_sell_nothing_owned_returns_zero() {
        let mut state = GameState::new();
        assert_eq!(state.sell(BallKind::Sniper, 3, None), 0);
        assert_eq!(state.money, 0);
    }

    #[test]
    fn test_upgrade_cost_formula() {
        let mut state = GameState::new();
        // level 1 game, fresh key: ceil(50 * 1.0 * 1.03) = 52
        assert_eq!(state.upgrade_cost(UpgradeKey::Damage(BallKind::Standard)), 52);
        // click base is 20: ceil(20 * 1.03) = 21
        assert_eq!(state.upgrade_cost(UpgradeKey::Click), 21);

        state.upgrades.insert(UpgradeKey::Click, 2);
        state.level = 5;
        // ceil(20 * 1.18^2 * 1.15) = ceil(32.0252) = 33
        assert_eq!(state.upgrade_cost(UpgradeKey::Click), 33);
    }

    #[test]
    fn test_upgrade_fails_silently_when_broke() {
        let mut state = GameState::new();
        assert!(!state.purchase_upgrade(UpgradeKey::Click));
        assert_eq!(state.upgrade_level(UpgradeKey::Click), 0);
        assert_eq!(state.money, 0);
    }

    #[test]
    fn test_damage_upgrade_rewrites_live_balls() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 10_000;
        state.purchase(BallKind::Standard, 2, Some(10), &mut rng);
        assert!(state.purchase_upgrade(UpgradeKey::Damage(BallKind::Standard)));
        assert!(
            state
                .balls
                .iter()
                .all(|b| b.damage == 1 + GameState::damage_bonus(1))
        );
    }

    #[test]
    fn test_speed_upgrade_rescales_preserving_heading() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 10_000;
        state.purchase(BallKind::Sniper, 1, Some(70), &mut rng);
        let before = state.balls[0].vel;
        assert!(state.purchase_upgrade(UpgradeKey::Speed(BallKind::Sniper)));
        let after = state.balls[0].vel;
        assert!((after.length() / before.length() - SPEED_MULT_PER_LEVEL).abs() < 1e-4);
        assert!(
            before.normalize().dot(after.normalize()) > 0.9999,
            "heading must not change"
        );
    }

    #[test]
    fn test_crit_first_stack_discount() {
        let mut state = GameState::new();
        state.gems = 20;
        assert!(state.purchase_gem_item(GemItem::Crit));
        assert_eq!(state.gems, 17); // first stack costs 3
        assert!(state.purchase_gem_item(GemItem::Crit));
        assert_eq!(state.gems, 5); // later stacks cost 12
        assert!(!state.purchase_gem_item(GemItem::Crit)); // can't afford a third
        assert_eq!(state.gem_item_stacks(GemItem::Crit), 2);
    }

    #[test]
    fn test_gem_item_stack_cap() {
        let mut state = GameState::new();
        state.gems = 1000;
        for _ in 0..10 {
            assert!(state.purchase_gem_item(GemItem::Crit));
        }
        assert!(!state.purchase_gem_item(GemItem::Crit));
        assert_eq!(state.gem_item_stacks(GemItem::Crit), 10);
    }

    #[test]
    fn test_use_consumable() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.gems = 5;
        assert!(state.purchase_gem_item(GemItem::BonusBalls));
        assert!(state.use_gem_item(GemItem::BonusBalls, &mut rng));
        assert_eq!(state.owned(BallKind::Standard), 3);
        assert_eq!(state.balls.len(), 3);
        // stack spent
        assert!(!state.use_gem_item(GemItem::BonusBalls, &mut rng));
        // permanents are passive
        assert!(!state.use_gem_item(GemItem::Crit, &mut rng));
    }

    #[test]
    fn test_rebirth() {
        let mut rng = rng();
        let mut state = GameState::new();
        state.money = 60_000;
        state.level = 7;
        state.purchase(BallKind::Heavy, 3, Some(45), &mut rng);
        state.purchase_upgrade(UpgradeKey::Click);

        assert!(state.rebirth());
        assert_eq!(state.money, 0);
        assert_eq!(state.gems, 1);
        assert_eq!(state.rebirths, 1);
        assert_eq!(
            state.max_active_balls,
            BASE_MAX_ACTIVE_BALLS + REBIRTH_CAPACITY_BONUS
        );
        assert_eq!(state.upgrade_level(UpgradeKey::Click), 0);
        assert_eq!(state.owned(BallKind::Heavy), 0);
        assert_eq!(
            state.price_of(BallKind::Heavy),
            catalog::type_def(BallKind::Heavy).price
        );
        assert!(state.balls.is_empty());
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_rebirth_below_threshold_fails() {
        let mut state = GameState::new();
        state.money = REBIRTH_COST - 1;
        assert!(!state.rebirth());
        assert_eq!(state.money, REBIRTH_COST - 1);
        assert_eq!(state.rebirths, 0);
    }

    #[test]
    fn test_rebirth_preserves_prestige_currency() {
        let mut state = GameState::new();
        state.money = REBIRTH_COST;
        state.gems = 9;
        state.rebirths = 2;
        assert!(state.rebirth());
        assert_eq!(state.gems, 10);
        assert_eq!(state.rebirths, 3);
    }

    proptest! {
        #[test]
        fn prop_purchase_never_overdraws(
            money in 0u64..100_000,
            unit in 1u64..500,
            req in 0u32..64,
            cap in 0usize..40,
        ) {
            let mut rng = Pcg32::seed_from_u64(7);
            let mut state = GameState::new();
            state.money = money;
            state.max_active_balls = cap;

            let ok = state.purchase(BallKind::Standard, req, Some(unit), &mut rng);
            let actual = (req as u64).min(cap as u64).min(money / unit);
            prop_assert_eq!(ok, actual > 0);
            prop_assert_eq!(state.money, money - unit * actual);
            prop_assert!(state.active_non_child_count() as u64 <= cap as u64);
        }

        #[test]
        fn prop_damage_award_bounded(value in 0u64..10_000, dmg in 0u64..10_000, crit: bool) {
            use crate::sim::arena::{Brick, damage_brick};
            let mut b = Brick {
                x: 0.0, y: 0.0, w: 10.0, h: 10.0,
                value, max_value: value, alive: value > 0,
            };
            let awarded = damage_brick(&mut b, dmg, crit);
            let requested = if crit { dmg * 2 } else { dmg };
            prop_assert!(awarded <= requested.min(value));
            prop_assert_eq!(b.value, value - awarded);
            prop_assert_eq!(b.alive, b.value > 0);
        }
    }
}
