//! Shop floor: placed fixtures, shelf stock, and the occupancy map derived
//! from them.

use std::collections::BTreeSet;

use cardshop_logic::grid::{GridOccupancy, ObjectId, Tile};
use cardshop_logic::products::{ProductKind, Rarity, ShelfProduct};
use serde::{Deserialize, Serialize};

use super::inventory::CardId;
use crate::error::ShopError;

/// What a shelf holds and how much of it.
///
/// Listed shelves keep `quantity == listed_card_ids.len()` and use
/// `max_quantity` as their slot count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfStock {
    pub product: ShelfProduct,
    pub quantity: u32,
    pub max_quantity: u32,
    pub listed_card_ids: Vec<CardId>,
}

impl Default for ShelfStock {
    fn default() -> Self {
        Self::empty(10)
    }
}

/// What was taken off a shelf by a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakenItem {
    Unit(ProductKind),
    Card { card_id: CardId, rarity: Rarity },
}

impl TakenItem {
    pub fn product(&self) -> ProductKind {
        match self {
            TakenItem::Unit(kind) => *kind,
            TakenItem::Card { rarity, .. } => ProductKind::Single(*rarity),
        }
    }
}

impl ShelfStock {
    pub fn empty(max_quantity: u32) -> Self {
        Self {
            product: ShelfProduct::Empty,
            quantity: 0,
            max_quantity,
            listed_card_ids: Vec::new(),
        }
    }

    pub fn available(&self) -> u32 {
        self.quantity
    }

    pub fn space(&self) -> u32 {
        self.max_quantity.saturating_sub(self.quantity)
    }

    /// Fill fraction in `0.0..=1.0`; a zero-capacity shelf counts as full.
    pub fn stock_ratio(&self) -> f32 {
        if self.max_quantity == 0 {
            1.0
        } else {
            self.quantity as f32 / self.max_quantity as f32
        }
    }

    /// Quantity threshold check for bulk shelves, slot check for listed ones.
    ///
    /// Does not look at inventory; the staff controller checks availability.
    pub fn below_threshold(&self, threshold_ratio: f32) -> bool {
        match self.product {
            ShelfProduct::Empty => false,
            ShelfProduct::Bulk(_) => {
                let limit = (self.max_quantity as f32 * threshold_ratio).floor() as u32;
                self.quantity <= limit && self.quantity < self.max_quantity
            }
            ShelfProduct::Listed(_) => self.quantity < self.max_quantity,
        }
    }

    /// Assign a product. Clears existing stock when the product changes.
    ///
    /// Returns the cleared bulk units or card ids so the caller can put them
    /// back into inventory.
    pub fn set_product(&mut self, product: ShelfProduct) -> (u32, Vec<CardId>) {
        if self.product == product {
            return (0, Vec::new());
        }
        let units = if self.product.is_listed() { 0 } else { self.quantity };
        let cards = std::mem::take(&mut self.listed_card_ids);
        self.product = product;
        self.quantity = 0;
        (units, cards)
    }

    /// Add bulk units, clamped to free space. Returns how many were added.
    pub fn add_units(&mut self, amount: u32) -> u32 {
        if !matches!(self.product, ShelfProduct::Bulk(_)) {
            return 0;
        }
        let added = amount.min(self.space());
        self.quantity += added;
        added
    }

    /// List one specific card in a free slot.
    pub fn list_card(&mut self, card_id: CardId) -> bool {
        if !self.product.is_listed() || self.space() == 0 {
            return false;
        }
        self.listed_card_ids.push(card_id);
        self.quantity = self.listed_card_ids.len() as u32;
        true
    }

    /// Remove one unit, or the first listed card. `None` if nothing is in stock.
    pub fn take_one(&mut self) -> Option<TakenItem> {
        match self.product {
            ShelfProduct::Empty => None,
            ShelfProduct::Bulk(kind) => {
                if self.quantity == 0 {
                    return None;
                }
                self.quantity -= 1;
                Some(TakenItem::Unit(kind))
            }
            ShelfProduct::Listed(rarity) => {
                if self.listed_card_ids.is_empty() {
                    return None;
                }
                let card_id = self.listed_card_ids.remove(0);
                self.quantity = self.listed_card_ids.len() as u32;
                Some(TakenItem::Card { card_id, rarity })
            }
        }
    }

    /// Re-establish quantity bounds after loading untrusted data.
    pub(crate) fn normalize(&mut self) {
        if self.product.is_listed() {
            self.listed_card_ids.truncate(self.max_quantity as usize);
            self.quantity = self.listed_card_ids.len() as u32;
        } else {
            self.listed_card_ids.clear();
            if self.product == ShelfProduct::Empty {
                self.quantity = 0;
            }
            self.quantity = self.quantity.min(self.max_quantity);
        }
    }
}

/// Kind of fixture a host can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureKind {
    Shelf,
    Counter,
    Poster,
}

/// A placed fixture and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fixture {
    Shelf(ShelfStock),
    Counter,
    Poster,
}

impl Fixture {
    pub fn kind(&self) -> FixtureKind {
        match self {
            Fixture::Shelf(_) => FixtureKind::Shelf,
            Fixture::Counter => FixtureKind::Counter,
            Fixture::Poster => FixtureKind::Poster,
        }
    }
}

/// A missing id is 0 and gets reassigned on restore. A missing tile is off
/// the floor, so the object is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedObject {
    #[serde(default)]
    pub id: ObjectId,
    #[serde(default = "off_floor")]
    pub tile: Tile,
    pub fixture: Fixture,
}

fn off_floor() -> Tile {
    Tile::new(-1, -1)
}

impl PlacedObject {
    pub fn shelf(&self) -> Option<&ShelfStock> {
        match &self.fixture {
            Fixture::Shelf(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered placed objects plus an occupancy map kept in lockstep with them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopLayout {
    objects: Vec<PlacedObject>,
    next_object_id: u32,
    occupancy: GridOccupancy,
}

impl ShopLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            objects: Vec::new(),
            next_object_id: 1,
            occupancy: GridOccupancy::new(width, height),
        }
    }

    /// Rebuild a layout from saved objects.
    ///
    /// Occupancy is derived from the object list. Objects that fall outside
    /// the grid or collide with an earlier object are dropped. Missing or
    /// duplicate ids are replaced with fresh ones above every saved id.
    pub fn from_objects(
        width: u32,
        height: u32,
        objects: Vec<PlacedObject>,
        next_object_id: u32,
    ) -> Self {
        let mut layout = Self::new(width, height);
        let max_id = objects.iter().map(|o| o.id.0).max().unwrap_or(0);
        layout.next_object_id = next_object_id.max(max_id.saturating_add(1)).max(1);
        let mut seen = BTreeSet::new();
        for mut obj in objects {
            if obj.id.0 == 0 || !seen.insert(obj.id) {
                let Some(id) = layout.allocate_id() else {
                    log::warn!("dropping saved object at {}: object ids exhausted", obj.tile);
                    continue;
                };
                log::warn!("saved object at {} had id {}; now {}", obj.tile, obj.id.0, id.0);
                obj.id = id;
                seen.insert(id);
            }
            if let Err(e) = layout.occupancy.occupy(obj.tile, obj.id) {
                log::warn!("dropping saved object {} at {}: {e}", obj.id.0, obj.tile);
                continue;
            }
            if let Fixture::Shelf(stock) = &mut obj.fixture {
                stock.normalize();
            }
            layout.objects.push(obj);
        }
        layout
    }

    /// Hand out the next object id, or `None` once `u32` ids run out.
    fn allocate_id(&mut self) -> Option<ObjectId> {
        let id = self.next_object_id;
        self.next_object_id = id.checked_add(1)?;
        Some(ObjectId(id))
    }

    pub fn width(&self) -> u32 {
        self.occupancy.width()
    }

    pub fn height(&self) -> u32 {
        self.occupancy.height()
    }

    pub fn occupancy(&self) -> &GridOccupancy {
        &self.occupancy
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    pub fn object_at(&self, tile: Tile) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.tile == tile)
    }

    pub fn shelf_at(&self, tile: Tile) -> Option<&ShelfStock> {
        self.object_at(tile).and_then(PlacedObject::shelf)
    }

    pub fn shelf_at_mut(&mut self, tile: Tile) -> Option<&mut ShelfStock> {
        self.objects
            .iter_mut()
            .find(|o| o.tile == tile)
            .and_then(|o| match &mut o.fixture {
                Fixture::Shelf(s) => Some(s),
                _ => None,
            })
    }

    /// Shelves in placement order.
    pub fn shelves(&self) -> impl Iterator<Item = (Tile, &ShelfStock)> {
        self.objects
            .iter()
            .filter_map(|o| o.shelf().map(|s| (o.tile, s)))
    }

    /// Place a fixture on a free in-bounds tile.
    pub fn place(
        &mut self,
        tile: Tile,
        kind: FixtureKind,
        shelf_capacity: u32,
    ) -> Result<ObjectId, ShopError> {
        let id = ObjectId(self.next_object_id);
        let next = self
            .next_object_id
            .checked_add(1)
            .ok_or_else(|| ShopError::conflict(tile, "object ids exhausted"))?;
        self.occupancy
            .occupy(tile, id)
            .map_err(|e| ShopError::conflict(tile, e.to_string()))?;
        self.next_object_id = next;
        let fixture = match kind {
            FixtureKind::Shelf => Fixture::Shelf(ShelfStock::empty(shelf_capacity)),
            FixtureKind::Counter => Fixture::Counter,
            FixtureKind::Poster => Fixture::Poster,
        };
        self.objects.push(PlacedObject { id, tile, fixture });
        Ok(id)
    }

    /// Remove the fixture on `tile`, returning it.
    pub fn remove(&mut self, tile: Tile) -> Result<PlacedObject, ShopError> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.tile == tile)
            .ok_or(ShopError::NotFound { tile })?;
        self.occupancy.release(tile);
        Ok(self.objects.remove(idx))
    }

    /// True when the occupancy map matches one rebuilt from the object list.
    pub fn occupancy_consistent(&self) -> bool {
        let (rebuilt, rejected) = GridOccupancy::from_objects(
            self.width(),
            self.height(),
            self.objects.iter().map(|o| (o.tile, o.id)),
        );
        rejected.is_empty() && rebuilt == self.occupancy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_shelf(qty: u32, max: u32) -> ShelfStock {
        ShelfStock {
            product: ShelfProduct::Bulk(ProductKind::Booster),
            quantity: qty,
            max_quantity: max,
            listed_card_ids: Vec::new(),
        }
    }

    #[test]
    fn test_place_conflict_leaves_layout_untouched() {
        let mut layout = ShopLayout::new(5, 5);
        let t = Tile::new(2, 2);
        layout.place(t, FixtureKind::Shelf, 10).unwrap();
        let before = layout.clone();
        let err = layout.place(t, FixtureKind::Counter, 10).unwrap_err();
        assert!(matches!(err, ShopError::Conflict { .. }));
        assert_eq!(layout, before);

        let err = layout
            .place(Tile::new(5, 0), FixtureKind::Poster, 10)
            .unwrap_err();
        assert!(matches!(err, ShopError::Conflict { .. }));
        assert!(layout.occupancy_consistent());
    }

    #[test]
    fn test_remove_frees_tile() {
        let mut layout = ShopLayout::new(5, 5);
        let t = Tile::new(1, 1);
        layout.place(t, FixtureKind::Counter, 10).unwrap();
        assert!(!layout.occupancy().is_walkable(t));
        let removed = layout.remove(t).unwrap();
        assert_eq!(removed.fixture, Fixture::Counter);
        assert!(layout.occupancy().is_walkable(t));
        assert_eq!(layout.remove(t), Err(ShopError::NotFound { tile: t }));
        assert!(layout.occupancy_consistent());
    }

    #[test]
    fn test_from_objects_drops_duplicates() {
        let make = |id, x| PlacedObject {
            id: ObjectId(id),
            tile: Tile::new(x, 0),
            fixture: Fixture::Counter,
        };
        let layout = ShopLayout::from_objects(4, 4, vec![make(1, 0), make(2, 0), make(3, 9)], 0);
        assert_eq!(layout.objects().len(), 1);
        assert_eq!(layout.next_object_id(), 4);
        assert!(layout.occupancy_consistent());
    }

    #[test]
    fn test_from_objects_reassigns_missing_and_duplicate_ids() {
        let make = |id, x| PlacedObject {
            id: ObjectId(id),
            tile: Tile::new(x, 0),
            fixture: Fixture::Counter,
        };
        let layout =
            ShopLayout::from_objects(4, 4, vec![make(2, 0), make(2, 1), make(0, 2)], 1);
        let ids: Vec<_> = layout.objects().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(layout.next_object_id(), 5);
        assert!(layout.occupancy_consistent());
    }

    #[test]
    fn test_max_saved_object_id_does_not_overflow() {
        let objects = vec![
            PlacedObject {
                id: ObjectId(u32::MAX),
                tile: Tile::new(0, 0),
                fixture: Fixture::Counter,
            },
            PlacedObject {
                id: ObjectId(0),
                tile: Tile::new(1, 0),
                fixture: Fixture::Poster,
            },
        ];
        let mut layout = ShopLayout::from_objects(4, 4, objects, 1);
        assert_eq!(layout.objects().len(), 1);
        assert_eq!(layout.next_object_id(), u32::MAX);

        let before = layout.clone();
        let err = layout
            .place(Tile::new(2, 2), FixtureKind::Counter, 10)
            .unwrap_err();
        assert!(matches!(err, ShopError::Conflict { .. }));
        assert_eq!(layout, before);
    }

    #[test]
    fn test_threshold() {
        assert!(bulk_shelf(1, 10).below_threshold(0.999));
        assert!(bulk_shelf(9, 10).below_threshold(0.999));
        assert!(!bulk_shelf(10, 10).below_threshold(0.999));
        assert!(!bulk_shelf(6, 10).below_threshold(0.5));
        assert!(!ShelfStock::empty(10).below_threshold(0.999));
    }

    #[test]
    fn test_take_one_never_negative() {
        let mut shelf = bulk_shelf(1, 10);
        assert_eq!(shelf.take_one(), Some(TakenItem::Unit(ProductKind::Booster)));
        assert_eq!(shelf.take_one(), None);
        assert_eq!(shelf.quantity, 0);
    }

    #[test]
    fn test_add_units_clamped() {
        let mut shelf = bulk_shelf(8, 10);
        assert_eq!(shelf.add_units(5), 2);
        assert_eq!(shelf.quantity, 10);
    }

    #[test]
    fn test_listed_shelf_slots() {
        let mut shelf = ShelfStock::empty(2);
        shelf.set_product(ShelfProduct::Listed(Rarity::Rare));
        assert_eq!(shelf.add_units(1), 0);
        assert!(shelf.list_card("c1".into()));
        assert!(shelf.list_card("c2".into()));
        assert!(!shelf.list_card("c3".into()));
        assert_eq!(shelf.quantity, 2);
        assert!(!shelf.below_threshold(0.999));

        let taken = shelf.take_one().unwrap();
        assert_eq!(
            taken,
            TakenItem::Card {
                card_id: "c1".into(),
                rarity: Rarity::Rare
            }
        );
        assert_eq!(taken.product(), ProductKind::Single(Rarity::Rare));
        assert_eq!(shelf.quantity, 1);
    }

    #[test]
    fn test_set_product_returns_old_stock() {
        let mut shelf = bulk_shelf(4, 10);
        let (units, cards) = shelf.set_product(ShelfProduct::Bulk(ProductKind::Deck));
        assert_eq!(units, 4);
        assert!(cards.is_empty());
        assert_eq!(shelf.quantity, 0);
        assert_eq!(shelf.set_product(ShelfProduct::Bulk(ProductKind::Deck)), (0, vec![]));
    }
}
