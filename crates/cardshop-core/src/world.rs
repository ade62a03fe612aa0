//! The shop world: one owned aggregate that every system mutates in turn.
//!
//! Systems receive `&mut ShopWorld` for the duration of a single call and
//! keep nothing between ticks.

use cardshop_logic::economy::{daily_customer_count, ArrivalPacer};
use cardshop_logic::pricing::{Modifiers, Prices, PricingSettings};
use cardshop_logic::products::ProductKind;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::components::*;
use crate::config::SimConfig;
use crate::systems::{Analytics, DeliveryQueue};

#[derive(Debug, Clone)]
pub struct ShopWorld {
    pub config: SimConfig,
    /// Seconds since the game started, including paused time.
    pub time_seconds: f64,
    pub money: u64,
    pub clock: DayNightClock,
    pub layout: ShopLayout,
    pub inventory: Inventory,
    pub collection: CardCollection,
    pub deck: Deck,
    pub staff: Staff,
    pub deliveries: DeliveryQueue,
    pub pacer: ArrivalPacer,
    pub prices: Prices,
    pub pricing: PricingSettings,
    pub modifiers: Modifiers,
    pub analytics: Analytics,
    /// Drives customer arrivals and purchases only.
    pub rng: ChaCha8Rng,
}

impl ShopWorld {
    /// A fresh shop on the morning of day 0.
    pub fn new(config: SimConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut inventory = Inventory::default();
        inventory.add(ProductKind::Booster, config.start_boosters);
        let daily = daily_customer_count(0, &mut rng).min(config.max_customers_per_day);

        Self {
            time_seconds: 0.0,
            money: config.start_money,
            clock: DayNightClock::default(),
            layout: ShopLayout::new(config.grid_width, config.grid_height),
            inventory,
            collection: CardCollection::default(),
            deck: Deck::default(),
            staff: Staff::at(config.staff.start_tile),
            deliveries: DeliveryQueue::default(),
            pacer: ArrivalPacer::for_day(daily),
            prices: Prices::default(),
            pricing: PricingSettings::default(),
            modifiers: Modifiers::default(),
            analytics: Analytics::default(),
            rng,
            config,
        }
    }

    pub fn day_index(&self) -> u32 {
        self.clock.day_index
    }

    /// Units of `product` held anywhere: back room plus matching shelves.
    pub fn total_stock(&self, product: ProductKind) -> u32 {
        let on_shelves: u32 = self
            .layout
            .shelves()
            .filter(|(_, s)| s.product.sale_product() == Some(product))
            .map(|(_, s)| s.available())
            .sum();
        self.inventory.count(product) + on_shelves
    }

    /// Cheap invariant check used by tests and the harness.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !self.layout.occupancy_consistent() {
            return Err("occupancy diverged from layout".to_string());
        }
        for (tile, shelf) in self.layout.shelves() {
            if shelf.quantity > shelf.max_quantity {
                return Err(format!(
                    "shelf at {tile} holds {} of {}",
                    shelf.quantity, shelf.max_quantity
                ));
            }
            if shelf.product.is_listed() && shelf.quantity as usize != shelf.listed_card_ids.len() {
                return Err(format!("listed shelf at {tile} miscounts its cards"));
            }
        }
        let day = self.clock.phase_duration(self.config.day_duration_s, self.config.night_duration_s);
        if self.clock.elapsed_in_phase >= day {
            return Err(format!(
                "elapsed {} is not below phase duration {day}",
                self.clock.elapsed_in_phase
            ));
        }
        Ok(())
    }
}
