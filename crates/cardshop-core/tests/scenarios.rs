//! End-to-end behaviour of the engine driven the way a host loop drives it.

use std::cell::Cell;
use std::rc::Rc;

use cardshop_core::prelude::*;
use cardshop_core::systems::{restock_candidates, SaleRecord};

const FRAME: f64 = 1.0 / 60.0;

fn stocked_engine(config: SimConfig) -> ShopEngine {
    let mut engine = ShopEngine::with_config(config).unwrap();
    engine.world.inventory.boosters = 40;
    engine.world.inventory.decks = 6;
    for (tile, product) in [
        (Tile::new(4, 3), ProductKind::Booster),
        (Tile::new(8, 3), ProductKind::Deck),
        (Tile::new(12, 3), ProductKind::Booster),
    ] {
        engine.place_object(tile, FixtureKind::Shelf).unwrap();
        engine
            .set_shelf_product(tile, ShelfProduct::Bulk(product))
            .unwrap();
        engine.stock_shelf_manually(tile, 5).unwrap();
    }
    engine
}

fn run_frames(engine: &mut ShopEngine, frames: usize) -> Vec<SaleRecord> {
    let mut sales = Vec::new();
    for _ in 0..frames {
        sales.extend(engine.advance(FRAME).sales);
    }
    sales
}

#[test]
fn test_day_closes_after_300s_and_autosaves_once() {
    let mut engine = stocked_engine(SimConfig::default());
    let saves = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&saves);
    engine.set_autosave_hook(Box::new(move |_: &Snapshot| counter.set(counter.get() + 1)));

    assert_eq!(engine.day_index(), 0);
    assert_eq!(engine.world.clock.elapsed_in_phase, 0.0);

    let mut closed_at = None;
    for frame in 1..=18_010 {
        let report = engine.advance(FRAME);
        if let Some(PhaseTransition::DayEnded { day_index }) = report.transition {
            assert_eq!(day_index, 0);
            assert!(report.autosaved);
            closed_at = Some(frame);
            break;
        }
    }
    let frame = closed_at.expect("day never closed");
    assert!((17_995..=18_005).contains(&frame), "closed at frame {frame}");
    assert_eq!(engine.phase(), Phase::Night);
    assert_eq!(saves.get(), 1);

    let visitors = engine.world.analytics.day(0).map(|d| d.visitors);
    let money = engine.money();
    for _ in 0..600 {
        let report = engine.advance(FRAME);
        assert_eq!(report.visitors, 0);
        assert!(report.sales.is_empty());
        assert!(report.restocks.is_empty());
    }
    assert_eq!(engine.world.analytics.day(0).map(|d| d.visitors), visitors);
    assert_eq!(engine.money(), money);
    assert_eq!(saves.get(), 1);
}

#[test]
fn test_order_arrives_after_delay() {
    let mut engine = ShopEngine::new();
    let before = engine.inventory().boosters;
    let id = engine.place_order(ProductKind::Booster, 5).unwrap();

    for _ in 0..299 {
        engine.advance(0.1);
    }
    assert!(engine.time_seconds() < 30.0);
    assert_eq!(engine.inventory().boosters, before);
    assert_eq!(engine.pending_orders().len(), 1);

    let mut delivered = Vec::new();
    for _ in 0..2 {
        delivered.extend(engine.advance(0.1).delivered);
    }
    assert!(engine.time_seconds() > 30.0);
    assert_eq!(delivered, vec![id]);
    assert_eq!(engine.inventory().boosters, before + 5);
    assert!(engine.pending_orders().iter().all(|o| o.order_id != id));
}

#[test]
fn test_order_matures_during_night() {
    let mut engine = ShopEngine::new();
    engine.advance(290.0);
    assert_eq!(engine.phase(), Phase::Day);
    let before = engine.inventory().boosters;
    let id = engine.place_order(ProductKind::Booster, 5).unwrap();

    let report = engine.advance(15.0);
    assert!(matches!(
        report.transition,
        Some(PhaseTransition::DayEnded { day_index: 0 })
    ));
    assert!(report.delivered.is_empty());
    assert_eq!(engine.phase(), Phase::Night);
    assert_eq!(engine.inventory().boosters, before);

    let report = engine.advance(20.0);
    assert_eq!(engine.phase(), Phase::Night);
    assert_eq!(report.delivered, vec![id]);
    assert_eq!(engine.inventory().boosters, before + 5);
    assert!(engine.pending_orders().is_empty());
}

#[test]
fn test_full_day_at_60fps_admits_every_customer() {
    let mut engine = stocked_engine(SimConfig::default());
    let target = engine.world.pacer.daily_target;
    let mut visitors = 0;
    loop {
        let report = engine.advance(FRAME);
        visitors += report.visitors;
        if report.transition.is_some() {
            break;
        }
    }
    assert_eq!(visitors, target);
    assert_eq!(engine.world.analytics.day(0).map(|d| d.visitors), Some(target));
}

#[test]
fn test_delivery_is_credited_exactly_once() {
    let mut engine = ShopEngine::new();
    engine.place_order(ProductKind::Deck, 2).unwrap();
    let mut deliveries = 0;
    for _ in 0..1_000 {
        deliveries += engine.advance(0.1).delivered.len();
    }
    assert_eq!(deliveries, 1);
    assert_eq!(engine.inventory().decks, 2);
    let day = engine.world.analytics.day(0).unwrap();
    assert_eq!(day.orders_placed.get("deck"), Some(&2));
    assert_eq!(day.orders_delivered.get("deck"), Some(&2));
}

#[test]
fn test_nearly_empty_shelf_beats_full_shelf() {
    let mut engine = ShopEngine::new();
    engine.world.inventory.boosters = 20;
    let full = Tile::new(5, 5);
    let low = Tile::new(10, 5);
    for (tile, qty) in [(full, 10), (low, 1)] {
        engine.place_object(tile, FixtureKind::Shelf).unwrap();
        engine
            .set_shelf_product(tile, ShelfProduct::Bulk(ProductKind::Booster))
            .unwrap();
        engine.stock_shelf_manually(tile, qty).unwrap();
    }
    assert_eq!(engine.world.config.staff.restock_threshold_ratio, 0.999);

    let plans = restock_candidates(&engine.world);
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].shelf, low);

    engine.advance(0.0);
    let plan = engine.staff().state.plan().expect("staff should have a plan");
    assert_eq!(plan.shelf, low);
}

#[test]
fn test_staff_routes_around_blocked_tile() {
    let mut config = SimConfig::default();
    config.staff.start_tile = Tile::new(0, 0);
    let mut engine = ShopEngine::with_config(config).unwrap();
    let blocked = Tile::new(1, 0);
    let shelf = Tile::new(3, 0);
    engine.place_object(blocked, FixtureKind::Counter).unwrap();
    engine.place_object(shelf, FixtureKind::Shelf).unwrap();
    engine
        .set_shelf_product(shelf, ShelfProduct::Bulk(ProductKind::Booster))
        .unwrap();
    engine.stock_shelf_manually(shelf, 1).unwrap();

    engine.advance(0.0);
    match &engine.staff().state {
        StaffState::Moving { goal, path, .. } => {
            assert_eq!(*goal, Tile::new(2, 0));
            assert_eq!(path.len(), 4);
            assert!(!path.contains(&blocked));
        }
        other => panic!("expected Moving, got {other:?}"),
    }

    let mut arrived = false;
    for _ in 0..60 {
        engine.advance(0.05);
        assert_ne!(engine.staff().tile(), blocked);
        if matches!(engine.staff().state, StaffState::Stocking { .. }) {
            arrived = true;
            break;
        }
    }
    assert!(arrived);
    assert_eq!(engine.staff().tile(), Tile::new(2, 0));
    assert!(engine.layout().occupancy().is_walkable(engine.staff().tile()));
}

#[test]
fn test_restore_replays_identically() {
    let mut original = stocked_engine(SimConfig::default());
    run_frames(&mut original, 3_000);

    let mut restored = ShopEngine::new();
    restored.restore(original.snapshot());

    let a = run_frames(&mut original, 6_000);
    let b = run_frames(&mut restored, 6_000);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&original.snapshot()).unwrap(),
        serde_json::to_string(&restored.snapshot()).unwrap()
    );
}

#[test]
fn test_binary_save_replays_identically() {
    let mut original = stocked_engine(SimConfig::default());
    run_frames(&mut original, 1_500);

    let mut buf = Vec::new();
    original.save_binary(&mut buf).unwrap();
    let mut loaded = ShopEngine::new();
    loaded.load_binary(&buf[..]).unwrap();

    let a = run_frames(&mut original, 3_000);
    let b = run_frames(&mut loaded, 3_000);
    assert_eq!(a, b);
    assert_eq!(original.money(), loaded.money());
    assert_eq!(original.staff(), loaded.staff());
}

#[test]
fn test_json_save_keeps_pending_orders() {
    let mut engine = ShopEngine::new();
    engine.place_order(ProductKind::Booster, 4).unwrap();
    engine.advance(12.0);

    let mut buf = Vec::new();
    engine.save_json(&mut buf).unwrap();
    let mut loaded = ShopEngine::new();
    loaded.load_json(&buf[..]).unwrap();

    assert_eq!(loaded.pending_orders(), engine.pending_orders());
    assert_eq!(loaded.pending_orders()[0].eta_seconds, 18.0);
    loaded.advance(18.0);
    assert_eq!(loaded.inventory().boosters, 7);
}

#[test]
fn test_same_seed_same_sales() {
    let mut a = stocked_engine(SimConfig::default());
    let mut b = stocked_engine(SimConfig::default());
    let sales_a = run_frames(&mut a, 18_000);
    let sales_b = run_frames(&mut b, 18_000);
    assert!(!sales_a.is_empty());
    assert_eq!(sales_a, sales_b);
    assert_eq!(a.money(), b.money());
}

#[test]
fn test_paused_world_resumes_where_it_stopped() {
    let mut engine = stocked_engine(SimConfig::default());
    run_frames(&mut engine, 600);
    let staff = engine.staff().clone();
    let elapsed = engine.world.clock.elapsed_in_phase;

    engine.set_paused(true);
    let sales = run_frames(&mut engine, 600);
    assert!(sales.is_empty());
    assert_eq!(engine.staff(), &staff);
    assert_eq!(engine.world.clock.elapsed_in_phase, elapsed);

    engine.set_paused(false);
    engine.advance(FRAME);
    assert!(engine.world.clock.elapsed_in_phase > elapsed);
}
