//! Customer economy - arrivals and purchases during open hours.

use cardshop_logic::economy::{choose_purchase, PurchaseCandidate};
use cardshop_logic::grid::Tile;
use cardshop_logic::pricing::effective_sale_price;
use cardshop_logic::products::ProductKind;
use cardshop_logic::staff_xp::{XpAward, XpSource};

use super::staff::award_staff_xp;
use crate::components::{CardId, TakenItem};
use crate::world::ShopWorld;

/// One completed sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub shelf: Tile,
    pub product: ProductKind,
    /// Set for listed-card sales.
    pub card_id: Option<CardId>,
    pub price: u32,
    pub shelf_emptied: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomyStep {
    pub visitors: u32,
    pub sales: Vec<SaleRecord>,
    pub xp_awards: Vec<XpAward>,
}

/// Admit the customers due by the current Day time and let each one buy at
/// most one item.
pub fn economy_step(world: &mut ShopWorld) -> EconomyStep {
    let mut step = EconomyStep::default();
    let arrivals = world
        .pacer
        .arrivals(world.clock.elapsed_in_phase, world.config.day_duration_s);
    let day = world.clock.day_index;

    for _ in 0..arrivals {
        step.visitors += 1;
        world.analytics.record_visitor(day);

        let (tiles, candidates) = purchase_candidates(world);
        let Some(choice) = choose_purchase(&candidates, &mut world.rng) else {
            continue;
        };
        if let Some(sale) = apply_purchase(world, tiles[choice]) {
            let award = award_staff_xp(world, XpSource::Sale, sale.price, Some(sale.product));
            step.xp_awards.push(award);
            step.sales.push(sale);
        }
    }
    step
}

/// Shelves a customer can buy from, in layout order, with their prices.
fn purchase_candidates(world: &ShopWorld) -> (Vec<Tile>, Vec<PurchaseCandidate>) {
    world
        .layout
        .shelves()
        .filter_map(|(tile, shelf)| {
            let product = shelf.product.sale_product()?;
            let price =
                effective_sale_price(&world.prices, &world.pricing, &world.modifiers, product);
            Some((
                tile,
                PurchaseCandidate {
                    product,
                    price,
                    available: shelf.available(),
                },
            ))
        })
        .unzip()
}

/// Take one item off the shelf and bank the money.
///
/// A shelf that emptied since selection is simply no sale.
fn apply_purchase(world: &mut ShopWorld, tile: Tile) -> Option<SaleRecord> {
    let shelf = world.layout.shelf_at_mut(tile)?;
    let taken = shelf.take_one()?;
    let shelf_emptied = shelf.available() == 0;
    let product = taken.product();
    let price = effective_sale_price(&world.prices, &world.pricing, &world.modifiers, product);

    world.money = world.money.saturating_add(u64::from(price));
    world
        .analytics
        .record_sale(world.clock.day_index, product, price, tile, shelf_emptied);

    let card_id = match taken {
        TakenItem::Card { card_id, .. } => Some(card_id),
        TakenItem::Unit(_) => None,
    };
    Some(SaleRecord {
        shelf: tile,
        product,
        card_id,
        price,
        shelf_emptied,
    })
}
