//! Pure customer economy logic: daily footfall, arrival pacing, purchase choice.
//!
//! All randomness is drawn from a caller-supplied generator so a fixed seed
//! reproduces the exact same sale sequence.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::products::ProductKind;

/// Weight floor so even expensive products occasionally sell.
pub const MIN_PURCHASE_WEIGHT: f64 = 0.2;

/// How many customers visit on `day_index` (0-based), before any cap.
///
/// Grows by one per day with a little noise; never fewer than six.
pub fn daily_customer_count<R: Rng>(day_index: u32, rng: &mut R) -> u32 {
    let base = 6 + day_index as i64;
    let rolled = rng.gen_range(base - 2..=base + 3);
    rolled.max(6) as u32
}

/// Spreads a daily customer count evenly over a day.
///
/// Customer `i` of `n` is due at the middle of their slot,
/// `(i + 0.5) * day / n`. The count due is derived from elapsed Day time
/// rather than accumulated per tick, so frame size cannot lose a customer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalPacer {
    /// Customers expected today.
    pub daily_target: u32,
    /// Customers already admitted today.
    pub admitted: u32,
}

impl ArrivalPacer {
    pub fn for_day(daily_target: u32) -> Self {
        Self {
            daily_target,
            admitted: 0,
        }
    }

    /// Customers due now, `elapsed` seconds into a day lasting
    /// `day_duration` seconds, that have not been admitted yet.
    pub fn arrivals(&mut self, elapsed: f64, day_duration: f64) -> u32 {
        if !(elapsed.is_finite() && elapsed > 0.0 && day_duration > 0.0) {
            return 0;
        }
        let target = f64::from(self.daily_target);
        let due = (target * elapsed / day_duration + 0.5 + 1e-9)
            .floor()
            .min(target) as u32;
        let n = due.saturating_sub(self.admitted);
        self.admitted += n;
        n
    }

    pub fn remaining(&self) -> u32 {
        self.daily_target.saturating_sub(self.admitted)
    }
}

/// Price sensitivity: cheaper products are favoured. Non-increasing in price.
pub fn price_weight(product: ProductKind, price: u32) -> f64 {
    let price = price as f64;
    let w = match product {
        ProductKind::Booster => 1.2 - price / 10.0,
        ProductKind::Deck => 1.0 - price / 20.0,
        ProductKind::Single(_) => 1.4 - price / 4.0,
    };
    w.max(MIN_PURCHASE_WEIGHT)
}

/// Fuller shelves are more visible. Zero stock yields zero weight.
pub fn availability_weight(available: u32) -> f64 {
    (available as f64).sqrt()
}

/// One shelf a customer could buy from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseCandidate {
    pub product: ProductKind,
    pub price: u32,
    pub available: u32,
}

impl PurchaseCandidate {
    pub fn weight(&self) -> f64 {
        price_weight(self.product, self.price) * availability_weight(self.available)
    }
}

/// Pick one candidate by weighted random choice.
///
/// Returns the index into `candidates`, or `None` ("no purchase") if no
/// candidate has stock.
pub fn choose_purchase<R: Rng>(
    candidates: &[PurchaseCandidate],
    rng: &mut R,
) -> Option<usize> {
    if candidates.iter().all(|c| c.available == 0) {
        return None;
    }
    let weights: Vec<f64> = candidates.iter().map(PurchaseCandidate::weight).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(dist.sample(rng))
}
