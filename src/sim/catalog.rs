//! Static ball-type and gem-item catalogs
//!
//! Loaded once, never mutated. Unknown ids fall back to the standard ball.

/// The four purchasable ball types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BallKind {
    Standard,
    Heavy,
    Sniper,
    Scatter,
}

impl BallKind {
    pub const ALL: [BallKind; 4] = [
        BallKind::Standard,
        BallKind::Heavy,
        BallKind::Sniper,
        BallKind::Scatter,
    ];

    /// Save-blob compatible id
    pub fn as_str(&self) -> &'static str {
        match self {
            BallKind::Standard => "standard",
            BallKind::Heavy => "heavy",
            BallKind::Sniper => "sniper",
            BallKind::Scatter => "scatter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(BallKind::Standard),
            "heavy" => Some(BallKind::Heavy),
            "sniper" => Some(BallKind::Sniper),
            "scatter" => Some(BallKind::Scatter),
            _ => None,
        }
    }
}

/// Static definition of a ball type
#[derive(Debug, Clone, Copy)]
pub struct BallTypeDef {
    pub kind: BallKind,
    pub name: &'static str,
    /// Base buy price in money units
    pub price: u64,
    /// Damage per hit before upgrades, in money units
    pub base_damage: u64,
}

pub const CATALOG: [BallTypeDef; 4] = [
    BallTypeDef {
        kind: BallKind::Standard,
        name: "Standard",
        price: 10,
        base_damage: 1,
    },
    BallTypeDef {
        kind: BallKind::Heavy,
        name: "Heavy",
        price: 45,
        base_damage: 5,
    },
    BallTypeDef {
        kind: BallKind::Sniper,
        name: "Sniper",
        price: 70,
        base_damage: 1,
    },
    BallTypeDef {
        kind: BallKind::Scatter,
        name: "Scatter",
        price: 50,
        base_damage: 2,
    },
];

/// Pure lookup. Falls back to the standard-ball definition so callers never
/// have to handle a missing entry.
pub fn type_def(kind: BallKind) -> &'static BallTypeDef {
    CATALOG
        .iter()
        .find(|d| d.kind == kind)
        .unwrap_or(&CATALOG[0])
}

/// Gem-shop items, bought with the prestige currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GemItem {
    /// Permanent: +5% crit chance per stack
    Crit,
    /// Consumable: grants 3 standard balls to the inventory on use
    BonusBalls,
}

impl GemItem {
    pub const ALL: [GemItem; 2] = [GemItem::Crit, GemItem::BonusBalls];

    pub fn as_str(&self) -> &'static str {
        match self {
            GemItem::Crit => "crit",
            GemItem::BonusBalls => "bonus-balls",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "crit" => Some(GemItem::Crit),
            "bonus-balls" => Some(GemItem::BonusBalls),
            _ => None,
        }
    }
}

/// Static definition of a gem-shop item
#[derive(Debug, Clone, Copy)]
pub struct GemItemDef {
    pub item: GemItem,
    pub name: &'static str,
    /// Cost in gems
    pub cost: u32,
    /// Discounted cost for the first stack, if any
    pub first_cost: Option<u32>,
    /// Stack cap for permanent items; `None` marks a consumable
    pub max_stacks: Option<u32>,
}

pub const GEM_CATALOG: [GemItemDef; 2] = [
    GemItemDef {
        item: GemItem::Crit,
        name: "Critical Strikes",
        cost: 12,
        first_cost: Some(3),
        max_stacks: Some(10),
    },
    GemItemDef {
        item: GemItem::BonusBalls,
        name: "Bonus Balls",
        cost: 5,
        first_cost: None,
        max_stacks: None,
    },
];

pub fn gem_item_def(item: GemItem) -> &'static GemItemDef {
    GEM_CATALOG
        .iter()
        .find(|d| d.item == item)
        .unwrap_or(&GEM_CATALOG[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_id_round_trip() {
        for kind in BallKind::ALL {
            assert_eq!(BallKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(BallKind::parse("bouncy"), None);
    }

    #[test]
    fn test_type_def_lookup() {
        assert_eq!(type_def(BallKind::Heavy).base_damage, 5);
        assert_eq!(type_def(BallKind::Sniper).price, 70);
    }

    #[test]
    fn test_gem_catalog() {
        let crit = gem_item_def(GemItem::Crit);
        assert_eq!(crit.first_cost, Some(3));
        assert_eq!(crit.cost, 12);
        assert_eq!(crit.max_stacks, Some(10));
        assert!(gem_item_def(GemItem::BonusBalls).max_stacks.is_none());
    }
}
