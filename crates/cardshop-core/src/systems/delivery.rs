//! Delivery queue - supplier orders that mature into inventory.
//!
//! Orders age on the world clock, not the phase clock: they keep maturing
//! at night and while the shop is paused.

use std::collections::BTreeSet;

use cardshop_logic::products::ProductKind;
use serde::{Deserialize, Serialize};

use crate::components::Inventory;
use crate::error::ShopError;

/// Order ids start at 1; 0 marks an id missing from a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct OrderId(pub u64);

fn unknown_time() -> f64 {
    f64::NAN
}

/// An in-flight order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryOrder {
    #[serde(default)]
    pub order_id: OrderId,
    pub product: ProductKind,
    #[serde(default)]
    pub amount: u32,
    #[serde(default = "unknown_time")]
    pub placed_at: f64,
    #[serde(default = "unknown_time")]
    pub arrival_at: f64,
    /// Wholesale cost charged when the order was placed.
    #[serde(default)]
    pub cost: u64,
}

/// Read-only view for an "Incoming (ETA)" display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrderView {
    pub order_id: OrderId,
    pub product: ProductKind,
    pub amount: u32,
    pub eta_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryQueue {
    orders: Vec<InventoryOrder>,
    next_order_id: u64,
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            next_order_id: 1,
        }
    }
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[InventoryOrder] {
        &self.orders
    }

    /// Queue an order arriving `delay` seconds after `now`.
    pub fn enqueue(
        &mut self,
        product: ProductKind,
        amount: u32,
        now: f64,
        delay: f64,
        cost: u64,
    ) -> Result<OrderId, ShopError> {
        if amount == 0 {
            return Err(ShopError::invalid_order("amount must be positive"));
        }
        if !(delay.is_finite() && delay > 0.0) {
            return Err(ShopError::invalid_order(format!("bad delivery delay {delay}")));
        }
        let order_id = OrderId(self.next_order_id);
        self.next_order_id = self
            .next_order_id
            .checked_add(1)
            .ok_or_else(|| ShopError::invalid_order("order ids exhausted"))?;
        self.orders.push(InventoryOrder {
            order_id,
            product,
            amount,
            placed_at: now,
            arrival_at: now + delay,
            cost,
        });
        Ok(order_id)
    }

    /// Credit every due order into `inventory`, in insertion order.
    ///
    /// Returns the delivered orders; they are gone from the queue afterwards.
    pub fn resolve(&mut self, now: f64, inventory: &mut Inventory) -> Vec<InventoryOrder> {
        if !self.orders.iter().any(|o| o.arrival_at <= now) {
            return Vec::new();
        }
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.orders)
            .into_iter()
            .partition(|o| o.arrival_at <= now);
        self.orders = pending;
        for order in &due {
            inventory.add(order.product, order.amount);
        }
        due
    }

    /// Remaining time per pending order. Never mutates.
    pub fn pending(&self, now: f64) -> Vec<PendingOrderView> {
        self.orders
            .iter()
            .map(|o| PendingOrderView {
                order_id: o.order_id,
                product: o.product,
                amount: o.amount,
                eta_seconds: (o.arrival_at - now).max(0.0),
            })
            .collect()
    }

    /// Repair orders read from an older or hand-edited save.
    ///
    /// A missing timestamp is rebuilt from the other one and `delay`. Orders
    /// with no usable timestamp or a zero amount are dropped. Missing or
    /// duplicate ids get fresh ones above every saved id.
    pub(crate) fn normalize(&mut self, delay: f64) {
        let before = self.orders.len();
        self.orders.retain_mut(|o| {
            match (o.placed_at.is_finite(), o.arrival_at.is_finite()) {
                (true, true) => {}
                (true, false) => o.arrival_at = o.placed_at + delay,
                (false, true) => o.placed_at = o.arrival_at - delay,
                (false, false) => return false,
            }
            o.amount > 0 && o.arrival_at.is_finite()
        });
        if self.orders.len() < before {
            log::warn!("dropped {} unusable saved orders", before - self.orders.len());
        }

        let max_id = self.orders.iter().map(|o| o.order_id.0).max().unwrap_or(0);
        self.next_order_id = self.next_order_id.max(max_id.saturating_add(1)).max(1);
        let mut seen = BTreeSet::new();
        let mut next = self.next_order_id;
        self.orders.retain_mut(|o| {
            if o.order_id.0 != 0 && seen.insert(o.order_id) {
                return true;
            }
            match next.checked_add(1) {
                Some(after) => {
                    o.order_id = OrderId(next);
                    next = after;
                    true
                }
                None => {
                    log::warn!("dropping saved {} order: order ids exhausted", o.product);
                    false
                }
            }
        });
        self.next_order_id = next;
    }
}
