//! Retail pricing, wholesale costs, and sale modifiers.
//!
//! Wholesale (supplier) costs are a separate source of truth from retail
//! prices: changing retail prices or markup never changes what an order costs.
//!
//! ```
//! use cardshop_logic::pricing::{effective_sale_price, Modifiers, Prices, PricingSettings};
//! use cardshop_logic::products::ProductKind;
//!
//! let price = effective_sale_price(
//!     &Prices::default(),
//!     &PricingSettings::default(),
//!     &Modifiers::default(),
//!     ProductKind::Booster,
//! );
//! assert_eq!(price, 4);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::products::{ProductKind, Rarity};

/// Player-set retail prices (whole dollars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prices {
    pub booster: u32,
    pub deck: u32,
    pub single_common: u32,
    pub single_uncommon: u32,
    pub single_rare: u32,
    pub single_epic: u32,
    pub single_legendary: u32,
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            booster: 4,
            deck: 18,
            single_common: 1,
            single_uncommon: 2,
            single_rare: 6,
            single_epic: 12,
            single_legendary: 28,
        }
    }
}

impl Prices {
    pub fn get(&self, product: ProductKind) -> u32 {
        match product {
            ProductKind::Booster => self.booster,
            ProductKind::Deck => self.deck,
            ProductKind::Single(Rarity::Common) => self.single_common,
            ProductKind::Single(Rarity::Uncommon) => self.single_uncommon,
            ProductKind::Single(Rarity::Rare) => self.single_rare,
            ProductKind::Single(Rarity::Epic) => self.single_epic,
            ProductKind::Single(Rarity::Legendary) => self.single_legendary,
        }
    }

    pub fn set(&mut self, product: ProductKind, price: u32) {
        let slot = match product {
            ProductKind::Booster => &mut self.booster,
            ProductKind::Deck => &mut self.deck,
            ProductKind::Single(Rarity::Common) => &mut self.single_common,
            ProductKind::Single(Rarity::Uncommon) => &mut self.single_uncommon,
            ProductKind::Single(Rarity::Rare) => &mut self.single_rare,
            ProductKind::Single(Rarity::Epic) => &mut self.single_epic,
            ProductKind::Single(Rarity::Legendary) => &mut self.single_legendary,
        };
        *slot = price.max(1);
    }
}

/// How retail prices are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PricingMode {
    /// Use the dollar amounts in [`Prices`].
    #[default]
    Absolute,
    /// Wholesale cost plus a per-product markup.
    Markup,
}

/// Player-configurable pricing controls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub mode: PricingMode,
    /// Markup fraction per product key (0.5 == +50%).
    pub markup_pct: BTreeMap<String, f32>,
}

impl PricingSettings {
    pub fn markup_for(&self, product: ProductKind) -> f32 {
        clamp_markup(self.markup_pct.get(&product.key()).copied().unwrap_or(0.0))
    }

    pub fn set_markup(&mut self, product: ProductKind, pct: f32) {
        self.markup_pct.insert(product.key(), clamp_markup(pct));
    }
}

/// Markup is kept within 0%..200%.
pub fn clamp_markup(pct: f32) -> f32 {
    if pct.is_nan() {
        return 0.0;
    }
    pct.clamp(0.0, 2.0)
}

/// Aggregated skill/fixture modifiers (fractions, 0.10 == +10%).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub sell_price_pct: f32,
    pub sales_xp_pct: f32,
}

/// Supplier cost per unit when ordering.
pub fn wholesale_unit_cost(product: ProductKind) -> u32 {
    match product {
        ProductKind::Booster => 2,
        ProductKind::Deck => 11,
        ProductKind::Single(Rarity::Common) => 1,
        ProductKind::Single(Rarity::Uncommon) => 1,
        ProductKind::Single(Rarity::Rare) => 4,
        ProductKind::Single(Rarity::Epic) => 7,
        ProductKind::Single(Rarity::Legendary) => 17,
    }
}

/// Total supplier cost for `qty` units.
pub fn wholesale_order_total(product: ProductKind, qty: u32) -> u64 {
    u64::from(wholesale_unit_cost(product)) * u64::from(qty)
}

/// Retail price from wholesale cost and markup, never below 1.
pub fn retail_from_markup(wholesale: u32, markup_pct: f32) -> u32 {
    let base = wholesale.max(1) as f32;
    ((base * (1.0 + clamp_markup(markup_pct))).round() as u32).max(1)
}

/// Retail base price before modifiers.
pub fn retail_base_price(prices: &Prices, pricing: &PricingSettings, product: ProductKind) -> u32 {
    match pricing.mode {
        PricingMode::Absolute => prices.get(product).max(1),
        PricingMode::Markup => {
            retail_from_markup(wholesale_unit_cost(product), pricing.markup_for(product))
        }
    }
}

/// Apply a sell price percentage to a base price, never below 1.
///
/// A non-finite percentage counts as no change.
pub fn apply_sell_price_pct(base: u32, pct: f32) -> u32 {
    let pct = if pct.is_finite() { pct } else { 0.0 };
    let p = (base as f32 * (1.0 + pct)).round();
    if p < 1.0 {
        1
    } else {
        p as u32
    }
}

/// Price a customer actually pays for one unit of `product`.
pub fn effective_sale_price(
    prices: &Prices,
    pricing: &PricingSettings,
    mods: &Modifiers,
    product: ProductKind,
) -> u32 {
    apply_sell_price_pct(retail_base_price(prices, pricing, product), mods.sell_price_pct)
}
