//! Reorder forecasting from recent sales.
//!
//! Daily demand is converted into demand over the delivery lead time, plus
//! a small safety buffer, minus what is already on hand.

use serde::{Deserialize, Serialize};

use crate::products::ProductKind;

/// Safety stock is average daily demand divided by this, at least one unit.
pub const SAFETY_DIVISOR: f64 = 10.0;

/// A suggested reorder for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockSuggestion {
    pub product: ProductKind,
    pub recommended_qty: u32,
    pub avg_daily_units: f64,
    pub current_total_stock: u32,
    pub lead_time_s: f64,
}

/// Mean of the per-day unit counts that were actually recorded.
///
/// Days with no record are skipped rather than counted as zero.
pub fn average_daily_units<I>(recorded_days: I) -> f64
where
    I: IntoIterator<Item = u32>,
{
    let (total, days) = recorded_days
        .into_iter()
        .fold((0u64, 0u32), |(t, d), units| (t + u64::from(units), d + 1));
    if days == 0 {
        0.0
    } else {
        total as f64 / f64::from(days)
    }
}

/// Units to order so lead-time demand plus safety stock is covered.
///
/// Lead time and day length are floored at one second.
pub fn recommended_qty(avg_daily: f64, day_seconds: f64, lead_time_s: f64, current: u32) -> u32 {
    if avg_daily <= 0.0 {
        return 0;
    }
    let lead = lead_time_s.max(1.0);
    let day = day_seconds.max(1.0);
    let demand = avg_daily * lead / day;
    let safety = (avg_daily / SAFETY_DIVISOR).max(1.0);
    let want = (demand + safety - f64::from(current)).ceil();
    if want <= 0.0 {
        0
    } else {
        want as u32
    }
}

/// Most urgent first: larger orders, then higher demand.
pub fn rank_suggestions(suggestions: &mut [RestockSuggestion]) {
    suggestions.sort_by(|a, b| {
        b.recommended_qty.cmp(&a.recommended_qty).then(
            b.avg_daily_units
                .partial_cmp(&a.avg_daily_units)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::Rarity;

    #[test]
    fn test_average_skips_missing_days() {
        assert_eq!(average_daily_units(Vec::new()), 0.0);
        assert_eq!(average_daily_units([4, 8]), 6.0);
    }

    #[test]
    fn test_no_demand_no_order() {
        assert_eq!(recommended_qty(0.0, 300.0, 30.0, 0), 0);
    }

    #[test]
    fn test_safety_stock_dominates_short_lead() {
        // 10/day over a 300s day: 1 unit of lead demand + 1 safety.
        assert_eq!(recommended_qty(10.0, 300.0, 30.0, 0), 2);
        assert_eq!(recommended_qty(10.0, 300.0, 30.0, 1), 1);
        assert_eq!(recommended_qty(10.0, 300.0, 30.0, 5), 0);
    }

    #[test]
    fn test_long_lead_time_scales_demand() {
        // 30/day, 300s lead: 30 units + 3 safety.
        assert_eq!(recommended_qty(30.0, 300.0, 300.0, 0), 33);
    }

    #[test]
    fn test_ranking() {
        let make = |product, qty, avg| RestockSuggestion {
            product,
            recommended_qty: qty,
            avg_daily_units: avg,
            current_total_stock: 0,
            lead_time_s: 30.0,
        };
        let mut list = vec![
            make(ProductKind::Deck, 2, 1.0),
            make(ProductKind::Booster, 5, 3.0),
            make(ProductKind::Single(Rarity::Rare), 2, 4.0),
        ];
        rank_suggestions(&mut list);
        assert_eq!(list[0].product, ProductKind::Booster);
        assert_eq!(list[1].product, ProductKind::Single(Rarity::Rare));
        assert_eq!(list[2].product, ProductKind::Deck);
    }
}
