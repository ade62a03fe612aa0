//! Save/Load functionality for persisting shop state
//!
//! A [`Snapshot`] is a plain serde value holding everything the world owns
//! except the occupancy map, which is always rebuilt from the layout on
//! restore. Two encodings are offered:
//! - JSON, forward compatible: missing keys fall back to defaults and older
//!   versions load.
//! - bincode, compact: the version must match exactly.

use std::io::{Read, Write};

use cardshop_logic::economy::ArrivalPacer;
use cardshop_logic::pricing::{Modifiers, Prices, PricingSettings};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SaveError;
use crate::systems::{Analytics, DeliveryQueue};
use crate::world::ShopWorld;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 2;

/// Serializable state of the whole shop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub version: u32,
    pub config: SimConfig,
    pub time_seconds: f64,
    pub money: u64,
    pub clock: DayNightClock,
    pub objects: Vec<PlacedObject>,
    pub next_object_id: u32,
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
    /// Missing in hand-written or very old saves; reseeded from the config.
    pub rng: Option<ChaCha8Rng>,
}

impl Snapshot {
    pub fn capture(world: &ShopWorld) -> Self {
        Self {
            version: SAVE_VERSION,
            config: world.config.clone(),
            time_seconds: world.time_seconds,
            money: world.money,
            clock: world.clock.clone(),
            objects: world.layout.objects().to_vec(),
            next_object_id: world.layout.next_object_id(),
            inventory: world.inventory.clone(),
            collection: world.collection.clone(),
            deck: world.deck.clone(),
            staff: world.staff.clone(),
            deliveries: world.deliveries.clone(),
            pacer: world.pacer,
            prices: world.prices.clone(),
            pricing: world.pricing.clone(),
            modifiers: world.modifiers,
            analytics: world.analytics.clone(),
            rng: Some(world.rng.clone()),
        }
    }

    /// Rebuild a world, repairing anything that would break an invariant.
    pub fn into_world(self) -> ShopWorld {
        let config = match self.config.validate() {
            Ok(()) => self.config,
            Err(e) => {
                log::warn!("saved config rejected ({e}); using defaults");
                SimConfig::default()
            }
        };

        let layout = ShopLayout::from_objects(
            config.grid_width,
            config.grid_height,
            self.objects,
            self.next_object_id,
        );

        let mut clock = self.clock;
        if !(clock.elapsed_in_phase.is_finite() && clock.elapsed_in_phase >= 0.0) {
            clock.elapsed_in_phase = 0.0;
        }
        if !(clock.carry_over.is_finite() && clock.carry_over >= 0.0) {
            clock.carry_over = 0.0;
        }
        let duration = clock.phase_duration(config.day_duration_s, config.night_duration_s);
        if clock.elapsed_in_phase >= duration {
            // Let the next tick cross the boundary and fire its side effects.
            clock.carry_over += clock.elapsed_in_phase;
            clock.elapsed_in_phase = 0.0;
        }

        let mut staff = self.staff;
        if !layout.occupancy().in_bounds(staff.tile()) {
            log::warn!("saved staff position {:?} is off the floor", staff.position);
            staff = Staff {
                xp: staff.xp,
                ..Staff::at(config.staff.start_tile)
            };
        }

        let mut deliveries = self.deliveries;
        deliveries.normalize(config.delivery_delay_s);

        let rng = self
            .rng
            .unwrap_or_else(|| ChaCha8Rng::seed_from_u64(config.seed));

        ShopWorld {
            time_seconds: self.time_seconds.max(0.0),
            money: self.money,
            clock,
            layout,
            inventory: self.inventory,
            collection: self.collection,
            deck: self.deck,
            staff,
            deliveries,
            pacer: self.pacer,
            prices: self.prices,
            pricing: self.pricing,
            modifiers: self.modifiers,
            analytics: self.analytics,
            rng,
            config,
        }
    }
}

/// Write a snapshot as pretty JSON.
pub fn save_json<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// Read a JSON snapshot. Any version up to the current one is accepted.
pub fn load_json<R: Read>(reader: R) -> Result<Snapshot, SaveError> {
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    if snapshot.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}

/// Write a snapshot with bincode.
pub fn save_binary<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), SaveError> {
    bincode::serialize_into(writer, snapshot)?;
    Ok(())
}

/// Read a bincode snapshot. The version must match exactly.
pub fn load_binary<R: Read>(reader: R) -> Result<Snapshot, SaveError> {
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardshop_logic::grid::Tile;
    use cardshop_logic::products::{ProductKind, ShelfProduct};

    fn sample_world() -> ShopWorld {
        let mut world = ShopWorld::new(SimConfig::default());
        let tile = Tile::new(4, 4);
        world.layout.place(tile, FixtureKind::Shelf, 10).unwrap();
        world.layout.place(Tile::new(6, 4), FixtureKind::Counter, 10).unwrap();
        let shelf = world.layout.shelf_at_mut(tile).unwrap();
        shelf.set_product(ShelfProduct::Bulk(ProductKind::Booster));
        shelf.add_units(3);
        world
            .deliveries
            .enqueue(ProductKind::Deck, 2, 0.0, 30.0, 22)
            .unwrap();
        world.staff.xp = 140;
        world.clock.elapsed_in_phase = 42.5;
        world
    }

    #[test]
    fn test_empty_json_loads_defaults() {
        let snap = load_json("{}".as_bytes()).unwrap();
        assert_eq!(snap.version, 0);
        let world = snap.into_world();
        assert_eq!(world.layout.objects().len(), 0);
        assert_eq!(world.config, SimConfig::default());
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let world = sample_world();
        let mut buf = Vec::new();
        save_json(&mut buf, &Snapshot::capture(&world)).unwrap();
        let loaded = load_json(&buf[..]).unwrap().into_world();

        assert_eq!(loaded.layout, world.layout);
        assert_eq!(loaded.deliveries, world.deliveries);
        assert_eq!(loaded.staff, world.staff);
        assert_eq!(loaded.clock, world.clock);
        assert_eq!(loaded.money, world.money);
    }

    #[test]
    fn test_binary_roundtrip() {
        let world = sample_world();
        let mut buf = Vec::new();
        save_binary(&mut buf, &Snapshot::capture(&world)).unwrap();
        let loaded = load_binary(&buf[..]).unwrap().into_world();
        assert_eq!(loaded.layout, world.layout);
        assert_eq!(loaded.inventory, world.inventory);
        assert_eq!(loaded.analytics, world.analytics);
    }

    #[test]
    fn test_version_checks() {
        let mut snap = Snapshot::capture(&sample_world());
        snap.version = SAVE_VERSION + 1;

        let mut buf = Vec::new();
        save_json(&mut buf, &snap).unwrap();
        assert!(matches!(
            load_json(&buf[..]),
            Err(SaveError::VersionMismatch { .. })
        ));

        let mut buf = Vec::new();
        save_binary(&mut buf, &snap).unwrap();
        assert!(matches!(
            load_binary(&buf[..]),
            Err(SaveError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_occupancy_rebuilt_not_stored() {
        let json = r#"{
            "objects": [
                {"id": 1, "tile": {"x": 2, "y": 2}, "fixture": "Counter"},
                {"id": 2, "tile": {"x": 2, "y": 2}, "fixture": "Poster"}
            ]
        }"#;
        let world = load_json(json.as_bytes()).unwrap().into_world();
        assert_eq!(world.layout.objects().len(), 1);
        assert!(!world.layout.occupancy().is_walkable(Tile::new(2, 2)));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_nested_missing_keys_default() {
        let json = r#"{
            "version": 1,
            "objects": [
                {"id": 3, "tile": {"x": 2}, "fixture": "Counter"},
                {"tile": {"x": 5, "y": 5}, "fixture": "Poster"},
                {"id": 9, "fixture": "Poster"}
            ],
            "deliveries": {"orders": [
                {"order_id": 1, "product": "Booster", "amount": 5, "arrival_at": 30.0},
                {"product": "Deck", "amount": 1, "placed_at": 10.0}
            ]},
            "collection": {"cards": {"c1": {"rarity": "Rare"}}},
            "staff": {"state": {"Idle": {}}},
            "analytics": {"event_log": [{"kind": "Order"}]}
        }"#;
        let world = load_json(json.as_bytes()).unwrap().into_world();

        let tiles: Vec<_> = world.layout.objects().iter().map(|o| (o.id.0, o.tile)).collect();
        assert_eq!(tiles, vec![(3, Tile::new(2, 0)), (10, Tile::new(5, 5))]);
        assert_eq!(world.layout.next_object_id(), 11);

        let orders = world.deliveries.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!((orders[0].placed_at, orders[0].arrival_at), (0.0, 30.0));
        assert_eq!(orders[1].order_id.0, 2);
        assert_eq!(orders[1].arrival_at, 40.0);

        assert_eq!(world.collection.cards["c1"].qty, 0);
        assert_eq!(world.analytics.event_log[0].t, 0.0);
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_max_object_id_restores_without_panic() {
        let json = format!(
            r#"{{"objects": [{{"id": {}, "tile": {{"x": 1, "y": 1}}, "fixture": "Counter"}}]}}"#,
            u32::MAX
        );
        let world = load_json(json.as_bytes()).unwrap().into_world();
        assert_eq!(world.layout.objects().len(), 1);
        assert_eq!(world.layout.next_object_id(), u32::MAX);
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_overlong_phase_repaired() {
        let mut snap = Snapshot::capture(&ShopWorld::new(SimConfig::default()));
        snap.clock.elapsed_in_phase = 900.0;
        let world = snap.into_world();
        assert_eq!(world.clock.elapsed_in_phase, 0.0);
        assert_eq!(world.clock.carry_over, 900.0);
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_truncated_binary_is_error() {
        let mut buf = Vec::new();
        save_binary(&mut buf, &Snapshot::capture(&sample_world())).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(matches!(load_binary(&buf[..]), Err(SaveError::Bincode(_))));
    }
}
