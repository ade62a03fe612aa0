//! Shop engine - main entry point for hosts driving the simulation

use std::io::{Read, Write};

use cardshop_logic::forecast::RestockSuggestion;
use cardshop_logic::grid::{ObjectId, Tile};
use cardshop_logic::pricing::{wholesale_order_total, Modifiers, PricingMode};
use cardshop_logic::products::{ProductKind, Rarity, ShelfProduct, UnknownProduct};
use cardshop_logic::staff_xp::{XpAward, XpSource};

use crate::components::*;
use crate::config::SimConfig;
use crate::error::{ConfigError, SaveError, ShopError};
use crate::persistence::{self, Snapshot};
use crate::systems::*;
use crate::world::ShopWorld;

/// Called with a fresh snapshot each time a day closes.
pub trait AutosaveHook {
    fn autosave(&mut self, snapshot: &Snapshot);
}

impl<F: FnMut(&Snapshot)> AutosaveHook for F {
    fn autosave(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Everything that happened during one `advance` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub transition: Option<PhaseTransition>,
    pub autosaved: bool,
    pub delivered: Vec<OrderId>,
    pub visitors: u32,
    pub sales: Vec<SaleRecord>,
    pub restocks: Vec<RestockRecord>,
    pub xp_awards: Vec<XpAward>,
}

/// Main simulation engine
pub struct ShopEngine {
    /// The shop aggregate. Systems mutate it only from inside `advance`.
    pub world: ShopWorld,
    autosave: Option<Box<dyn AutosaveHook>>,
}

impl Default for ShopEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopEngine {
    /// A new shop with default tuning
    pub fn new() -> Self {
        Self {
            world: ShopWorld::new(SimConfig::default()),
            autosave: None,
        }
    }

    pub fn with_config(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: ShopWorld::new(config),
            autosave: None,
        })
    }

    pub fn set_autosave_hook(&mut self, hook: Box<dyn AutosaveHook>) {
        self.autosave = Some(hook);
    }

    pub fn clear_autosave_hook(&mut self) {
        self.autosave = None;
    }

    /// Step the whole simulation by `dt` seconds.
    ///
    /// Order within a tick: clock, deliveries, economy, staff. Deliveries
    /// mature in every phase and while paused; economy and staff run only
    /// during an unpaused Day.
    pub fn advance(&mut self, dt: f64) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut report = TickReport::default();
        self.world.time_seconds += dt;

        let config = &self.world.config;
        let (day_len, night_len) = (config.day_duration_s, config.night_duration_s);
        if let Some(transition) = advance_clock(&mut self.world.clock, dt, day_len, night_len) {
            apply_transition(&mut self.world, transition);
            report.transition = Some(transition);
            if let PhaseTransition::DayEnded { day_index } = transition {
                report.autosaved = self.run_autosave(day_index);
            }
        }

        self.resolve_deliveries(&mut report);

        if self.world.clock.is_open() {
            let econ = economy_step(&mut self.world);
            report.visitors = econ.visitors;
            report.sales = econ.sales;
            report.xp_awards = econ.xp_awards;

            let staff = staff_step(&mut self.world, dt as f32);
            report.restocks.extend(staff.restock);
            report.xp_awards.extend(staff.xp_award);
        }
        report
    }

    fn run_autosave(&mut self, day_index: u32) -> bool {
        if self.autosave.is_none() {
            return false;
        }
        let snapshot = self.snapshot();
        if let Some(hook) = self.autosave.as_mut() {
            hook.autosave(&snapshot);
        }
        log::info!("autosaved after day {day_index}");
        let t = self.world.time_seconds;
        self.world
            .analytics
            .log(day_index, t, EventKind::Autosave, "Autosaved");
        true
    }

    fn resolve_deliveries(&mut self, report: &mut TickReport) {
        let world = &mut self.world;
        let delivered = world
            .deliveries
            .resolve(world.time_seconds, &mut world.inventory);
        let day = world.clock.day_index;
        for order in delivered {
            log::info!(
                "order {} delivered: {} x{}",
                order.order_id.0,
                order.product,
                order.amount
            );
            world
                .analytics
                .record_order_delivered(day, order.product, order.amount);
            world.analytics.log(
                day,
                world.time_seconds,
                EventKind::Delivery,
                format!("Delivered {} x{}", order.product, order.amount),
            );
            report.delivered.push(order.order_id);
        }
    }

    // --- Orders ---

    /// Order `amount` units, paying wholesale cost now.
    pub fn place_order(&mut self, product: ProductKind, amount: u32) -> Result<OrderId, ShopError> {
        if amount == 0 {
            return Err(ShopError::invalid_order("amount must be positive"));
        }
        let cost = wholesale_order_total(product, amount);
        if cost > self.world.money {
            return Err(ShopError::InsufficientFunds {
                needed: cost,
                available: self.world.money,
            });
        }
        let world = &mut self.world;
        let order_id = world.deliveries.enqueue(
            product,
            amount,
            world.time_seconds,
            world.config.delivery_delay_s,
            cost,
        )?;
        world.money -= cost;
        let day = world.clock.day_index;
        world.analytics.record_order_placed(day, product, amount);
        world.analytics.log(
            day,
            world.time_seconds,
            EventKind::Order,
            format!("Ordered {product} x{amount} for ${cost}"),
        );
        log::debug!("order {} placed: {product} x{amount}", order_id.0);
        Ok(order_id)
    }

    /// Like [`place_order`](Self::place_order) with a product key such as `single_rare`.
    pub fn place_order_by_key(&mut self, product: &str, amount: u32) -> Result<OrderId, ShopError> {
        let product: ProductKind = product
            .parse()
            .map_err(|e: UnknownProduct| ShopError::invalid_order(e.to_string()))?;
        self.place_order(product, amount)
    }

    pub fn pending_orders(&self) -> Vec<PendingOrderView> {
        self.world.deliveries.pending(self.world.time_seconds)
    }

    // --- Layout ---

    pub fn place_object(&mut self, tile: Tile, kind: FixtureKind) -> Result<ObjectId, ShopError> {
        let capacity = self.world.config.shelf_capacity;
        self.world.layout.place(tile, kind, capacity)
    }

    /// Remove a fixture. Shelf contents go back to inventory and the collection.
    pub fn remove_object(&mut self, tile: Tile) -> Result<PlacedObject, ShopError> {
        let removed = self.world.layout.remove(tile)?;
        if let Fixture::Shelf(stock) = &removed.fixture {
            self.return_shelf_stock(stock.product, stock.quantity, &stock.listed_card_ids);
        }
        Ok(removed)
    }

    /// Assign what a shelf sells. Existing stock goes back when the product changes.
    pub fn set_shelf_product(&mut self, tile: Tile, product: ShelfProduct) -> Result<(), ShopError> {
        let shelf = self
            .world
            .layout
            .shelf_at_mut(tile)
            .ok_or(ShopError::NotFound { tile })?;
        let previous = shelf.product;
        let (units, cards) = shelf.set_product(product);
        self.return_shelf_stock(previous, units, &cards);
        Ok(())
    }

    fn return_shelf_stock(&mut self, product: ShelfProduct, units: u32, cards: &[CardId]) {
        match product {
            ShelfProduct::Empty => {}
            ShelfProduct::Bulk(kind) => self.world.inventory.add(kind, units),
            ShelfProduct::Listed(rarity) => {
                for card_id in cards {
                    self.world.collection.add(card_id, rarity, 1);
                }
            }
        }
    }

    /// Player restock of a bulk shelf from inventory. Returns units moved.
    pub fn stock_shelf_manually(&mut self, tile: Tile, amount: u32) -> Result<u32, ShopError> {
        let world = &mut self.world;
        let shelf = world
            .layout
            .shelf_at_mut(tile)
            .ok_or(ShopError::NotFound { tile })?;
        let ShelfProduct::Bulk(product) = shelf.product else {
            return Err(ShopError::conflict(tile, "shelf has no bulk product assigned"));
        };
        let want = amount.min(shelf.space());
        let taken = world.inventory.take(product, want);
        let moved = shelf.add_units(taken);
        world
            .analytics
            .record_restock(world.clock.day_index, product, moved);
        Ok(moved)
    }

    /// List a spare copy of `card_id` on a listed shelf of its rarity.
    pub fn list_card_on_shelf(&mut self, tile: Tile, card_id: &str) -> Result<(), ShopError> {
        let world = &mut self.world;
        let shelf = world
            .layout
            .shelf_at_mut(tile)
            .ok_or(ShopError::NotFound { tile })?;
        let ShelfProduct::Listed(rarity) = shelf.product else {
            return Err(ShopError::conflict(tile, "shelf is not a listed-card shelf"));
        };
        if world.collection.rarity_of(card_id) != Some(rarity) {
            return Err(ShopError::conflict(
                tile,
                format!("card {card_id} is not a {} single", rarity.key()),
            ));
        }
        if world.collection.spare(card_id, &world.deck) == 0 {
            return Err(ShopError::conflict(tile, format!("no spare copy of {card_id}")));
        }
        if shelf.space() == 0 {
            return Err(ShopError::conflict(tile, "shelf is full"));
        }
        world.collection.remove_one(card_id);
        shelf.list_card(card_id.to_string());
        world.analytics.record_restock(
            world.clock.day_index,
            ProductKind::Single(rarity),
            1,
        );
        Ok(())
    }

    // --- Collection & staff ---

    pub fn add_cards_to_collection(&mut self, card_id: &str, rarity: Rarity, qty: u32) {
        self.world.collection.add(card_id, rarity, qty);
    }

    pub fn set_deck_count(&mut self, card_id: &str, count: u32) {
        self.world.deck.set(card_id, count);
    }

    /// Credit pack-opening XP to the staff member.
    pub fn record_pack_open(&mut self, packs: u32) -> XpAward {
        let day = self.world.clock.day_index;
        self.world.analytics.record_pack_open(day, packs);
        award_staff_xp(&mut self.world, XpSource::PackOpen, packs, None)
    }

    // --- Controls ---

    pub fn set_paused(&mut self, paused: bool) {
        self.world.clock.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.world.clock.paused
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.world.modifiers = modifiers;
    }

    pub fn set_price(&mut self, product: ProductKind, price: u32) {
        self.world.prices.set(product, price);
    }

    pub fn set_pricing_mode(&mut self, mode: PricingMode) {
        self.world.pricing.mode = mode;
    }

    pub fn set_markup(&mut self, product: ProductKind, pct: f32) {
        self.world.pricing.set_markup(product, pct);
    }

    // --- Queries ---

    pub fn money(&self) -> u64 {
        self.world.money
    }

    pub fn phase(&self) -> Phase {
        self.world.clock.phase
    }

    pub fn day_index(&self) -> u32 {
        self.world.clock.day_index
    }

    pub fn time_seconds(&self) -> f64 {
        self.world.time_seconds
    }

    pub fn staff(&self) -> &Staff {
        &self.world.staff
    }

    pub fn inventory(&self) -> &Inventory {
        &self.world.inventory
    }

    pub fn layout(&self) -> &ShopLayout {
        &self.world.layout
    }

    pub fn restock_suggestions(
        &self,
        lead_time_s: f64,
        window_days: u32,
        max: usize,
    ) -> Vec<RestockSuggestion> {
        restock_suggestions(&self.world, lead_time_s, window_days, max)
    }

    // --- Persistence ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.world)
    }

    /// Replace the world with a saved one. The autosave hook stays registered.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.world = snapshot.into_world();
        log::info!(
            "restored day {} at t={:.1}s",
            self.world.clock.day_index,
            self.world.time_seconds
        );
    }

    pub fn save_json<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_json(writer, &self.snapshot())
    }

    pub fn load_json<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let snapshot = persistence::load_json(reader)?;
        self.restore(snapshot);
        Ok(())
    }

    pub fn save_binary<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_binary(writer, &self.snapshot())
    }

    pub fn load_binary<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let snapshot = persistence::load_binary(reader)?;
        self.restore(snapshot);
        Ok(())
    }
}
