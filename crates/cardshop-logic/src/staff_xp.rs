//! Staff experience awards and level derivation.
//!
//! The staff member earns XP from sales, restocking and opened packs.
//! Level is always derived from total XP and never stored on its own.
//!
//! ```
//! use cardshop_logic::staff_xp::{award_xp, level_from_xp, XpSource};
//!
//! let award = award_xp(95, XpSource::Restock, 2, None, 0.0);
//! assert_eq!(award.gained, 6);
//! assert!(award.leveled_up());
//! assert_eq!(level_from_xp(award.new_xp), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::products::{ProductKind, Rarity};

pub const XP_PER_LEVEL: u64 = 100;
pub const XP_PER_SALE_DOLLAR: f32 = 2.0;
pub const XP_PER_RESTOCK_ITEM: f32 = 3.0;
pub const XP_PER_PACK_OPENED: u64 = 12;

/// What earned the XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XpSource {
    /// `amount` is sale revenue in dollars.
    Sale,
    /// `amount` is items actually moved onto a shelf.
    Restock,
    /// `amount` is packs opened.
    PackOpen,
}

/// Outcome of a single award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub source: XpSource,
    pub gained: u64,
    pub prev_xp: u64,
    pub new_xp: u64,
    pub prev_level: u32,
    pub new_level: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.prev_level
    }
}

/// `1 + xp / 100`.
pub fn level_from_xp(xp: u64) -> u32 {
    let level = 1 + xp / XP_PER_LEVEL;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Singles of higher rarity are worth more XP.
pub fn rarity_multiplier(rarity: Rarity) -> f32 {
    match rarity {
        Rarity::Common => 1.0,
        Rarity::Uncommon => 1.15,
        Rarity::Rare => 1.4,
        Rarity::Epic => 1.8,
        Rarity::Legendary => 2.4,
    }
}

fn product_multiplier(product: Option<ProductKind>) -> f32 {
    product
        .and_then(ProductKind::rarity)
        .map(rarity_multiplier)
        .unwrap_or(1.0)
}

/// XP for one event. Zero amount earns nothing; any positive amount earns at least 1.
pub fn compute_xp(
    source: XpSource,
    amount: u32,
    product: Option<ProductKind>,
    sales_xp_pct: f32,
) -> u64 {
    if amount == 0 {
        return 0;
    }
    let amt = amount as f32;
    let mult = product_multiplier(product);
    match source {
        XpSource::Sale => {
            let bonus = 1.0 + sales_xp_pct.max(0.0);
            ((amt * XP_PER_SALE_DOLLAR * mult * bonus).round() as u64).max(1)
        }
        XpSource::Restock => ((amt * XP_PER_RESTOCK_ITEM * mult).round() as u64).max(1),
        XpSource::PackOpen => u64::from(amount) * XP_PER_PACK_OPENED,
    }
}

/// Pure award: new total and the level change it caused.
pub fn award_xp(
    current_xp: u64,
    source: XpSource,
    amount: u32,
    product: Option<ProductKind>,
    sales_xp_pct: f32,
) -> XpAward {
    let gained = compute_xp(source, amount, product, sales_xp_pct);
    let new_xp = current_xp.saturating_add(gained);
    XpAward {
        source,
        gained,
        prev_xp: current_xp,
        new_xp,
        prev_level: level_from_xp(current_xp),
        new_level: level_from_xp(new_xp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_curve() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(99), 1);
        assert_eq!(level_from_xp(100), 2);
        assert_eq!(level_from_xp(1_050), 11);
    }

    #[test]
    fn test_zero_amount_no_xp() {
        for source in [XpSource::Sale, XpSource::Restock, XpSource::PackOpen] {
            assert_eq!(compute_xp(source, 0, None, 0.0), 0);
        }
    }

    #[test]
    fn test_sale_xp_scales_with_revenue_and_rarity() {
        assert_eq!(compute_xp(XpSource::Sale, 4, Some(ProductKind::Booster), 0.0), 8);
        assert_eq!(
            compute_xp(
                XpSource::Sale,
                10,
                Some(ProductKind::Single(Rarity::Legendary)),
                0.0
            ),
            48
        );
        assert_eq!(compute_xp(XpSource::Sale, 10, None, 0.5), 30);
    }

    #[test]
    fn test_restock_and_pack_xp() {
        assert_eq!(compute_xp(XpSource::Restock, 2, Some(ProductKind::Deck), 0.0), 6);
        assert_eq!(compute_xp(XpSource::PackOpen, 3, None, 0.0), 36);
    }

    #[test]
    fn test_award_reports_level_change() {
        let award = award_xp(190, XpSource::PackOpen, 1, None, 0.0);
        assert_eq!(award.new_xp, 202);
        assert_eq!(award.prev_level, 2);
        assert_eq!(award.new_level, 3);
        assert!(award.leveled_up());

        let quiet = award_xp(0, XpSource::Restock, 1, None, 0.0);
        assert!(!quiet.leveled_up());
    }
}
