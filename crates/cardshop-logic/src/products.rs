//! Product catalogue: rarities, orderable products, and what a shelf holds.
//!
//! Product keys (`booster`, `deck`, `single_rare`, ...) are the stable
//! string form used by analytics, pricing tables and host-side parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Card rarity tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// All rarities in ascending order.
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_key(key: &str) -> Option<Rarity> {
        Rarity::ALL.into_iter().find(|r| r.key() == key)
    }
}

/// A fungible product that can be ordered, held in inventory and shelved in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Booster,
    Deck,
    Single(Rarity),
}

impl ProductKind {
    /// Every orderable product, in display order.
    pub fn all() -> Vec<ProductKind> {
        let mut all = vec![ProductKind::Booster, ProductKind::Deck];
        all.extend(Rarity::ALL.into_iter().map(ProductKind::Single));
        all
    }

    /// Stable string key (`booster`, `deck`, `single_<rarity>`).
    pub fn key(self) -> String {
        match self {
            ProductKind::Booster => "booster".to_string(),
            ProductKind::Deck => "deck".to_string(),
            ProductKind::Single(r) => format!("single_{}", r.key()),
        }
    }

    /// Rarity for singles, `None` for sealed products.
    pub fn rarity(self) -> Option<Rarity> {
        match self {
            ProductKind::Single(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Returned when a product key does not name a known product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown product '{0}'")]
pub struct UnknownProduct(pub String);

impl FromStr for ProductKind {
    type Err = UnknownProduct;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booster" => Ok(ProductKind::Booster),
            "deck" => Ok(ProductKind::Deck),
            other => other
                .strip_prefix("single_")
                .and_then(Rarity::from_key)
                .map(ProductKind::Single)
                .ok_or_else(|| UnknownProduct(other.to_string())),
        }
    }
}

/// What a shelf is configured to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShelfProduct {
    /// Nothing assigned yet; never restocked by staff, never sold from.
    #[default]
    Empty,
    /// Fungible stock counted by quantity.
    Bulk(ProductKind),
    /// Specific cards of one rarity, one slot per listed card id.
    Listed(Rarity),
}

impl ShelfProduct {
    /// Product key used for pricing and analytics; listed cards sell as singles.
    pub fn sale_product(self) -> Option<ProductKind> {
        match self {
            ShelfProduct::Empty => None,
            ShelfProduct::Bulk(kind) => Some(kind),
            ShelfProduct::Listed(r) => Some(ProductKind::Single(r)),
        }
    }

    pub fn is_listed(self) -> bool {
        matches!(self, ShelfProduct::Listed(_))
    }
}
