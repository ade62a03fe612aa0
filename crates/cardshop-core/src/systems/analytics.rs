//! Per-day shop metrics and a capped event log.

use std::collections::BTreeMap;

use cardshop_logic::grid::Tile;
use cardshop_logic::products::ProductKind;
use cardshop_logic::staff_xp::XpAward;
use serde::{Deserialize, Serialize};

/// Oldest entries are dropped beyond this many.
pub const MAX_EVENTS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Phase,
    Order,
    Delivery,
    LevelUp,
    Autosave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub t: f64,
    pub kind: EventKind,
    #[serde(default)]
    pub message: String,
}

/// Counters for one day. Product maps are keyed by product key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyMetrics {
    pub visitors: u32,
    pub revenue: u64,
    pub units_sold: BTreeMap<String, u32>,
    pub revenue_by_product: BTreeMap<String, u64>,
    /// Units moved onto shelves, manual and staff.
    pub restocked: BTreeMap<String, u32>,
    pub orders_placed: BTreeMap<String, u32>,
    pub orders_delivered: BTreeMap<String, u32>,
    /// Times a sale emptied the shelf, keyed `x,y`.
    pub stockouts_by_shelf: BTreeMap<String, u32>,
    pub packs_opened: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub days: BTreeMap<u32, DailyMetrics>,
    pub event_log: Vec<EventLogEntry>,
}

fn shelf_key(tile: Tile) -> String {
    format!("{},{}", tile.x, tile.y)
}

fn bump(map: &mut BTreeMap<String, u32>, key: String, by: u32) {
    let slot = map.entry(key).or_insert(0);
    *slot = slot.saturating_add(by);
}

impl Analytics {
    pub fn day(&self, day: u32) -> Option<&DailyMetrics> {
        self.days.get(&day)
    }

    fn day_mut(&mut self, day: u32) -> &mut DailyMetrics {
        self.days.entry(day).or_default()
    }

    pub fn log(&mut self, day: u32, t: f64, kind: EventKind, message: impl Into<String>) {
        self.event_log.push(EventLogEntry {
            day,
            t,
            kind,
            message: message.into(),
        });
        if self.event_log.len() > MAX_EVENTS {
            let excess = self.event_log.len() - MAX_EVENTS;
            self.event_log.drain(..excess);
        }
    }

    pub fn record_visitor(&mut self, day: u32) {
        self.day_mut(day).visitors += 1;
    }

    pub fn record_sale(
        &mut self,
        day: u32,
        product: ProductKind,
        revenue: u32,
        shelf: Tile,
        became_empty: bool,
    ) {
        let m = self.day_mut(day);
        let key = product.key();
        m.revenue += u64::from(revenue);
        bump(&mut m.units_sold, key.clone(), 1);
        *m.revenue_by_product.entry(key).or_insert(0) += u64::from(revenue);
        if became_empty {
            bump(&mut m.stockouts_by_shelf, shelf_key(shelf), 1);
        }
    }

    pub fn record_restock(&mut self, day: u32, product: ProductKind, qty: u32) {
        if qty > 0 {
            bump(&mut self.day_mut(day).restocked, product.key(), qty);
        }
    }

    pub fn record_order_placed(&mut self, day: u32, product: ProductKind, qty: u32) {
        if qty > 0 {
            bump(&mut self.day_mut(day).orders_placed, product.key(), qty);
        }
    }

    pub fn record_order_delivered(&mut self, day: u32, product: ProductKind, qty: u32) {
        if qty > 0 {
            bump(&mut self.day_mut(day).orders_delivered, product.key(), qty);
        }
    }

    pub fn record_pack_open(&mut self, day: u32, packs: u32) {
        if packs > 0 {
            self.day_mut(day).packs_opened += packs;
        }
    }

    /// Log level-ups; plain awards are not logged.
    pub fn record_award(&mut self, day: u32, t: f64, award: &XpAward) {
        if award.leveled_up() {
            self.log(
                day,
                t,
                EventKind::LevelUp,
                format!("Staff reached level {}", award.new_level),
            );
        }
    }

    /// Units of `product` sold on each recorded day in the window ending at `day`.
    pub fn units_sold_window(&self, day: u32, window_days: u32, product: ProductKind) -> Vec<u32> {
        let key = product.key();
        let first = day.saturating_sub(window_days.max(1) - 1);
        self.days
            .range(first..=day)
            .map(|(_, m)| m.units_sold.get(&key).copied().unwrap_or(0))
            .collect()
    }

    /// Shelves that emptied most often over the window, most first.
    pub fn top_stockout_shelves(&self, day: u32, window_days: u32, limit: usize) -> Vec<(String, u32)> {
        let first = day.saturating_sub(window_days.max(1) - 1);
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for (_, m) in self.days.range(first..=day) {
            for (k, v) in &m.stockouts_by_shelf {
                bump(&mut counts, k.clone(), *v);
            }
        }
        let mut items: Vec<_> = counts.into_iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1));
        items.truncate(limit.max(1));
        items
    }
}
