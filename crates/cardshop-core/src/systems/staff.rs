//! Staff controller - scan shelves, walk over, restock, repeat.
//!
//! The controller is fully deterministic: plan selection orders candidates
//! by stock ratio then row-major tile index, and BFS breaks ties by the
//! smallest goal tile. It never touches the world RNG.

use std::collections::VecDeque;

use cardshop_logic::grid::Tile;
use cardshop_logic::pathfinding::{adjacent_walk_tiles, find_path_to_any, PathError, PathPlan};
use cardshop_logic::products::{ProductKind, ShelfProduct};
use cardshop_logic::staff_xp::{award_xp, XpAward, XpSource};

use crate::components::{CardId, RestockItem, RestockPlan, StaffState};
use crate::world::ShopWorld;

/// Stock moved onto a shelf, by staff or by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockRecord {
    pub shelf: Tile,
    pub product: ProductKind,
    pub amount: u32,
    pub card_id: Option<CardId>,
    pub by_staff: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffStep {
    pub restock: Option<RestockRecord>,
    pub xp_award: Option<XpAward>,
}

/// Award XP to the staff member and log any level-up.
pub fn award_staff_xp(
    world: &mut ShopWorld,
    source: XpSource,
    amount: u32,
    product: Option<ProductKind>,
) -> XpAward {
    let award = award_xp(
        world.staff.xp,
        source,
        amount,
        product,
        world.modifiers.sales_xp_pct,
    );
    world.staff.xp = award.new_xp;
    if award.leveled_up() {
        log::info!("staff reached level {}", award.new_level);
    }
    world
        .analytics
        .record_award(world.clock.day_index, world.time_seconds, &award);
    award
}

/// Advance the staff state machine by `dt` seconds.
pub fn staff_step(world: &mut ShopWorld, dt: f32) -> StaffStep {
    let dt = dt.max(0.0);
    let state = std::mem::take(&mut world.staff.state);
    let (next, step) = match state {
        StaffState::Idle { scan_cooldown } => {
            (step_idle(world, scan_cooldown - dt), StaffStep::default())
        }
        StaffState::Moving { plan, goal, path } => {
            (step_moving(world, plan, goal, path, dt), StaffStep::default())
        }
        StaffState::Stocking { plan, timer } => step_stocking(world, plan, timer - dt),
    };
    world.staff.state = next;
    step
}

fn idle_after_scan(world: &ShopWorld) -> StaffState {
    StaffState::Idle {
        scan_cooldown: world.config.staff.scan_interval_s,
    }
}

fn step_idle(world: &mut ShopWorld, scan_cooldown: f32) -> StaffState {
    if scan_cooldown > 0.0 {
        return StaffState::Idle { scan_cooldown };
    }
    let start = world.staff.tile();
    for plan in restock_candidates(world) {
        match route_to_shelf(world, start, plan.shelf) {
            Ok(route) => {
                log::debug!(
                    "staff restocking {} via {} ({} steps)",
                    plan.shelf,
                    route.goal,
                    route.len()
                );
                return begin_route(world, plan, route);
            }
            Err(e) => log::debug!("shelf {} skipped: {e}", plan.shelf),
        }
    }
    idle_after_scan(world)
}

fn begin_route(world: &ShopWorld, plan: RestockPlan, route: PathPlan) -> StaffState {
    if route.is_empty() {
        StaffState::Stocking {
            plan,
            timer: world.config.staff.stock_time_s,
        }
    } else {
        StaffState::Moving {
            plan,
            goal: route.goal,
            path: VecDeque::from(route.steps),
        }
    }
}

fn route_to_shelf(world: &ShopWorld, start: Tile, shelf: Tile) -> Result<PathPlan, PathError> {
    let grid = world.layout.occupancy();
    let goals = adjacent_walk_tiles(grid, shelf);
    find_path_to_any(grid, start, &goals)
}

/// Shelves that need restocking and can be restocked right now, most urgent first.
///
/// Urgency is the lowest stock ratio; ties go to the lowest row-major tile index.
pub fn restock_candidates(world: &ShopWorld) -> Vec<RestockPlan> {
    let threshold = world.config.staff.restock_threshold_ratio;
    let batch = world.config.staff.restock_batch;
    let grid = world.layout.occupancy();

    let mut ranked: Vec<(f32, usize, RestockPlan)> = world
        .layout
        .shelves()
        .filter(|(_, shelf)| shelf.below_threshold(threshold))
        .filter_map(|(tile, shelf)| {
            let item = match shelf.product {
                ShelfProduct::Empty => return None,
                ShelfProduct::Bulk(product) => {
                    let on_hand = world.inventory.count(product);
                    if on_hand == 0 {
                        return None;
                    }
                    RestockItem::Bulk {
                        product,
                        amount: batch.min(shelf.space()).min(on_hand),
                    }
                }
                ShelfProduct::Listed(rarity) => {
                    let card_id = world.collection.listable_card(
                        rarity,
                        &world.deck,
                        &shelf.listed_card_ids,
                    )?;
                    RestockItem::Card { card_id, rarity }
                }
            };
            let index = grid.index_of(tile).unwrap_or(usize::MAX);
            Some((shelf.stock_ratio(), index, RestockPlan { shelf: tile, item }))
        })
        .collect();

    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, _, plan)| plan).collect()
}

fn step_moving(
    world: &mut ShopWorld,
    plan: RestockPlan,
    mut goal: Tile,
    mut path: VecDeque<Tile>,
    dt: f32,
) -> StaffState {
    if world.layout.shelf_at(plan.shelf).is_none() {
        log::debug!("restock target {} disappeared", plan.shelf);
        return idle_after_scan(world);
    }

    let grid = world.layout.occupancy();
    let blocked = !grid.is_walkable(goal) || path.iter().any(|t| !grid.is_walkable(*t));
    if blocked {
        match route_to_shelf(world, world.staff.tile(), plan.shelf) {
            Ok(route) => {
                log::debug!("staff rerouting to {} via {}", plan.shelf, route.goal);
                goal = route.goal;
                path = VecDeque::from(route.steps);
            }
            Err(e) => {
                log::debug!("restock target {} unreachable: {e}", plan.shelf);
                return idle_after_scan(world);
            }
        }
    }

    let mut budget = world.config.staff.speed_tiles_per_s * dt;
    while let Some(next) = path.front().copied() {
        let (tx, ty) = next.center();
        let (px, py) = world.staff.position;
        let (dx, dy) = (tx - px, ty - py);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= budget {
            world.staff.position = (tx, ty);
            budget -= dist;
            path.pop_front();
        } else {
            if budget > 0.0 {
                world.staff.position = (px + dx / dist * budget, py + dy / dist * budget);
            }
            break;
        }
    }

    if path.is_empty() {
        StaffState::Stocking {
            plan,
            timer: world.config.staff.stock_time_s,
        }
    } else {
        StaffState::Moving { plan, goal, path }
    }
}

fn step_stocking(world: &mut ShopWorld, plan: RestockPlan, timer: f32) -> (StaffState, StaffStep) {
    if timer > 0.0 {
        return (StaffState::Stocking { plan, timer }, StaffStep::default());
    }
    let mut step = StaffStep::default();
    if let Some(record) = apply_restock_plan(world, &plan) {
        step.xp_award = Some(award_staff_xp(
            world,
            XpSource::Restock,
            record.amount,
            Some(record.product),
        ));
        step.restock = Some(record);
    }
    (idle_after_scan(world), step)
}

/// Move stock onto the planned shelf, re-checking everything.
///
/// Anything that changed since planning caps the amount; zero moved is `None`.
fn apply_restock_plan(world: &mut ShopWorld, plan: &RestockPlan) -> Option<RestockRecord> {
    let day = world.clock.day_index;
    let batch = world.config.staff.restock_batch;
    let shelf = world.layout.shelf_at_mut(plan.shelf)?;

    let record = match &plan.item {
        RestockItem::Bulk { product, amount } => {
            if shelf.product != ShelfProduct::Bulk(*product) {
                return None;
            }
            let want = (*amount)
                .min(batch)
                .min(shelf.space())
                .min(world.inventory.count(*product));
            if want == 0 {
                return None;
            }
            let taken = world.inventory.take(*product, want);
            let added = shelf.add_units(taken);
            RestockRecord {
                shelf: plan.shelf,
                product: *product,
                amount: added,
                card_id: None,
                by_staff: true,
            }
        }
        RestockItem::Card { card_id, rarity } => {
            if shelf.product != ShelfProduct::Listed(*rarity) || shelf.space() == 0 {
                return None;
            }
            let card_id = if world.collection.spare(card_id, &world.deck) > 0 {
                card_id.clone()
            } else {
                world
                    .collection
                    .listable_card(*rarity, &world.deck, &shelf.listed_card_ids)?
            };
            if !world.collection.remove_one(&card_id) {
                return None;
            }
            shelf.list_card(card_id.clone());
            RestockRecord {
                shelf: plan.shelf,
                product: ProductKind::Single(*rarity),
                amount: 1,
                card_id: Some(card_id),
                by_staff: true,
            }
        }
    };
    world.analytics.record_restock(day, record.product, record.amount);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FixtureKind;
    use crate::config::SimConfig;
    use cardshop_logic::products::Rarity;

    fn world_with_staff_at(tile: Tile) -> ShopWorld {
        let mut config = SimConfig::default();
        config.staff.start_tile = tile;
        let mut world = ShopWorld::new(config);
        world.inventory.boosters = 20;
        world
    }

    fn add_shelf(world: &mut ShopWorld, tile: Tile, product: ShelfProduct, qty: u32) {
        world.layout.place(tile, FixtureKind::Shelf, 10).unwrap();
        let shelf = world.layout.shelf_at_mut(tile).unwrap();
        shelf.set_product(product);
        shelf.quantity = qty;
    }

    fn run(world: &mut ShopWorld, seconds: f32) -> Vec<RestockRecord> {
        let dt = 0.05;
        let mut records = Vec::new();
        for _ in 0..(seconds / dt) as usize {
            if let Some(r) = staff_step(world, dt).restock {
                records.push(r);
            }
        }
        records
    }

    #[test]
    fn test_lowest_ratio_selected_first() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        add_shelf(&mut world, Tile::new(5, 5), ShelfProduct::Bulk(ProductKind::Booster), 10);
        add_shelf(&mut world, Tile::new(8, 2), ShelfProduct::Bulk(ProductKind::Booster), 1);
        add_shelf(&mut world, Tile::new(2, 8), ShelfProduct::Bulk(ProductKind::Booster), 5);
        let plans = restock_candidates(&world);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].shelf, Tile::new(8, 2));
        assert_eq!(plans[1].shelf, Tile::new(2, 8));
    }

    #[test]
    fn test_ratio_tie_breaks_on_tile_index() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        add_shelf(&mut world, Tile::new(1, 3), ShelfProduct::Bulk(ProductKind::Booster), 2);
        add_shelf(&mut world, Tile::new(9, 1), ShelfProduct::Bulk(ProductKind::Booster), 2);
        let plans = restock_candidates(&world);
        assert_eq!(plans[0].shelf, Tile::new(9, 1));
    }

    #[test]
    fn test_no_inventory_no_plan() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        add_shelf(&mut world, Tile::new(5, 5), ShelfProduct::Bulk(ProductKind::Deck), 0);
        assert!(restock_candidates(&world).is_empty());
        staff_step(&mut world, 0.1);
        assert!(world.staff.is_idle());
    }

    #[test]
    fn test_full_cycle_restocks_and_awards_xp() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        let shelf = Tile::new(4, 0);
        add_shelf(&mut world, shelf, ShelfProduct::Bulk(ProductKind::Booster), 7);

        let records = run(&mut world, 6.0);
        assert!(!records.is_empty());
        assert_eq!(records[0].amount, 2);
        assert_eq!(world.layout.shelf_at(shelf).unwrap().quantity, 10);
        assert_eq!(world.inventory.boosters, 17);
        assert_eq!(world.staff.xp, 6 + 3);
        assert_eq!(world.staff.tile().manhattan(shelf), 1);
    }

    #[test]
    fn test_routes_around_blocked_tile() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        world.layout.place(Tile::new(1, 0), FixtureKind::Counter, 10).unwrap();
        add_shelf(&mut world, Tile::new(4, 0), ShelfProduct::Bulk(ProductKind::Booster), 1);

        staff_step(&mut world, 0.0);
        match &world.staff.state {
            StaffState::Moving { goal, path, .. } => {
                assert_eq!(*goal, Tile::new(3, 0));
                assert_eq!(path.len(), 5);
                assert!(!path.contains(&Tile::new(1, 0)));
            }
            other => panic!("expected Moving, got {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_shelf_stays_idle() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        world.layout.place(Tile::new(1, 0), FixtureKind::Counter, 10).unwrap();
        world.layout.place(Tile::new(0, 1), FixtureKind::Counter, 10).unwrap();
        add_shelf(&mut world, Tile::new(6, 6), ShelfProduct::Bulk(ProductKind::Booster), 1);
        staff_step(&mut world, 0.0);
        assert!(world.staff.is_idle());
    }

    #[test]
    fn test_reroutes_when_path_blocked() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        add_shelf(&mut world, Tile::new(6, 0), ShelfProduct::Bulk(ProductKind::Booster), 1);
        staff_step(&mut world, 0.0);
        assert!(matches!(world.staff.state, StaffState::Moving { .. }));

        world.layout.place(Tile::new(3, 0), FixtureKind::Poster, 10).unwrap();
        staff_step(&mut world, 0.01);
        match &world.staff.state {
            StaffState::Moving { path, .. } => assert!(!path.contains(&Tile::new(3, 0))),
            other => panic!("expected Moving, got {other:?}"),
        }
    }

    #[test]
    fn test_removed_shelf_abandons_plan() {
        let mut world = world_with_staff_at(Tile::new(0, 0));
        add_shelf(&mut world, Tile::new(6, 0), ShelfProduct::Bulk(ProductKind::Booster), 1);
        staff_step(&mut world, 0.0);
        world.layout.remove(Tile::new(6, 0)).unwrap();
        staff_step(&mut world, 0.1);
        assert!(world.staff.is_idle());
        assert_eq!(world.inventory.boosters, 20);
    }

    #[test]
    fn test_stocking_never_exceeds_planned_amount() {
        let mut world = world_with_staff_at(Tile::new(3, 0));
        let shelf = Tile::new(4, 0);
        add_shelf(&mut world, shelf, ShelfProduct::Bulk(ProductKind::Booster), 9);
        staff_step(&mut world, 0.0);
        match world.staff.state.plan().map(|p| &p.item) {
            Some(RestockItem::Bulk { amount, .. }) => assert_eq!(*amount, 1),
            other => panic!("expected a bulk plan, got {other:?}"),
        }

        world.layout.shelf_at_mut(shelf).unwrap().quantity = 5;
        let step = staff_step(&mut world, 1.0);
        assert_eq!(step.restock.map(|r| r.amount), Some(1));
        assert_eq!(world.layout.shelf_at(shelf).unwrap().quantity, 6);
        assert_eq!(world.inventory.boosters, 19);
    }

    #[test]
    fn test_inventory_gone_at_stocking_means_no_xp() {
        let mut world = world_with_staff_at(Tile::new(3, 0));
        add_shelf(&mut world, Tile::new(4, 0), ShelfProduct::Bulk(ProductKind::Booster), 1);
        staff_step(&mut world, 0.0);
        assert!(matches!(world.staff.state, StaffState::Stocking { .. }));

        world.inventory.boosters = 0;
        let step = staff_step(&mut world, 1.0);
        assert_eq!(step.restock, None);
        assert_eq!(step.xp_award, None);
        assert_eq!(world.staff.xp, 0);
        assert!(world.staff.is_idle());
    }

    #[test]
    fn test_listed_shelf_takes_spare_card() {
        let mut world = world_with_staff_at(Tile::new(3, 0));
        add_shelf(&mut world, Tile::new(4, 0), ShelfProduct::Listed(Rarity::Rare), 0);
        world.collection.add("c010", Rarity::Rare, 1);
        world.collection.add("c011", Rarity::Rare, 2);
        world.deck.set("c010", 1);

        staff_step(&mut world, 0.0);
        let step = staff_step(&mut world, 1.0);
        let record = step.restock.unwrap();
        assert_eq!(record.card_id.as_deref(), Some("c011"));
        assert_eq!(world.collection.qty("c011"), 1);
        assert_eq!(world.collection.qty("c010"), 1);
        let shelf = world.layout.shelf_at(Tile::new(4, 0)).unwrap();
        assert_eq!(shelf.listed_card_ids, vec!["c011".to_string()]);
        assert_eq!(shelf.quantity, 1);
        // Restock XP for one rare single: round(3 * 1.4).
        assert_eq!(world.staff.xp, 4);
    }

    #[test]
    fn test_deterministic_choices() {
        let build = || {
            let mut world = world_with_staff_at(Tile::new(0, 0));
            world.layout.place(Tile::new(2, 1), FixtureKind::Counter, 10).unwrap();
            add_shelf(&mut world, Tile::new(7, 3), ShelfProduct::Bulk(ProductKind::Booster), 3);
            add_shelf(&mut world, Tile::new(3, 7), ShelfProduct::Bulk(ProductKind::Booster), 3);
            world
        };
        let mut a = build();
        let mut b = build();
        let ra = run(&mut a, 20.0);
        let rb = run(&mut b, 20.0);
        assert_eq!(ra, rb);
        assert_eq!(a.staff, b.staff);
    }
}
