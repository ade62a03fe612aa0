//! CardShop Headless Simulation Harness
//!
//! Drives the engine in-process the way a game host would and checks the
//! results. No renderer, no files.
//!
//! Usage:
//!   cargo run -p cardshop-simtest
//!   cargo run -p cardshop-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p cardshop-simtest

use std::cell::Cell;
use std::rc::Rc;

use cardshop_core::prelude::*;
use cardshop_core::systems::restock_candidates;
use cardshop_logic::pricing::{Modifiers, PricingMode};

// ── Harness config (a partial document; the rest defaults) ──────────────
const HARNESS_CONFIG_JSON: &str = r#"{
    "seed": 4242,
    "start_boosters": 30,
    "staff": { "start_tile": { "x": 0, "y": 0 } }
}"#;

const FRAME: f64 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CardShop Simulation Harness ===\n");

    let config = match SimConfig::from_json_str(HARNESS_CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ config_parse: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Configuration
    results.extend(validate_config(&config, verbose));

    // 2. Day/night clock and autosave
    results.extend(validate_day_cycle(&config, verbose));

    // 3. Supplier deliveries
    results.extend(validate_deliveries(&config, verbose));

    // 4. Floor layout and occupancy
    results.extend(validate_layout(&config, verbose));

    // 5. Staff restocking
    results.extend(validate_staff(&config, verbose));

    // 6. Customer economy
    results.extend(validate_economy(&config, verbose));

    // 7. Save / load
    results.extend(validate_persistence(&config, verbose));

    // 8. Multi-day soak with forecasting
    results.extend(validate_soak(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
        if !r.passed {
            log::warn!("check {} failed: {}", r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn section(title: &str) {
    println!("--- {title} ---");
    log::info!("section: {title}");
}

fn new_engine(config: &SimConfig) -> Option<ShopEngine> {
    ShopEngine::with_config(config.clone()).ok()
}

/// Shelves along the top wall, stocked from inventory.
fn furnish(engine: &mut ShopEngine) -> Vec<Tile> {
    let mut shelves = Vec::new();
    for (x, product) in [
        (4, ProductKind::Booster),
        (7, ProductKind::Deck),
        (10, ProductKind::Booster),
    ] {
        let tile = Tile::new(x, 2);
        if engine.place_object(tile, FixtureKind::Shelf).is_err() {
            continue;
        }
        if engine
            .set_shelf_product(tile, ShelfProduct::Bulk(product))
            .is_ok()
        {
            let _ = engine.stock_shelf_manually(tile, 5);
            shelves.push(tile);
        }
    }
    shelves
}

fn run_seconds(engine: &mut ShopEngine, seconds: f64) -> Vec<TickReport> {
    let frames = (seconds / FRAME).round() as usize;
    (0..frames).map(|_| engine.advance(FRAME)).collect()
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_config(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Configuration");
    let mut results = Vec::new();

    results.push(check(
        "config_partial_defaults",
        config.day_duration_s == 300.0 && config.grid_width == 20,
        format!(
            "day={}s grid={}x{} seed={}",
            config.day_duration_s, config.grid_width, config.grid_height, config.seed
        ),
    ));

    let bad = r#"{ "staff": { "restock_threshold_ratio": 1.5 } }"#;
    let rejected = SimConfig::from_json_str(bad).is_err();
    results.push(check(
        "config_rejects_bad_ratio",
        rejected,
        "threshold ratio outside 0..=1 refused",
    ));

    let mut off_grid = config.clone();
    off_grid.staff.start_tile = Tile::new(config.grid_width as i32, 0);
    results.push(check(
        "config_rejects_off_grid_staff",
        ShopEngine::with_config(off_grid).is_err(),
        "staff start tile checked against grid",
    ));

    if verbose {
        println!("    {} config checks", results.len());
    }
    results
}

// ── 2. Day cycle ────────────────────────────────────────────────────────

fn validate_day_cycle(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Day/Night Cycle");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        results.push(check("day_engine", false, "engine rejected config"));
        return results;
    };
    furnish(&mut engine);

    let saves = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&saves);
    engine.set_autosave_hook(Box::new(move |_: &Snapshot| counter.set(counter.get() + 1)));

    let reports = run_seconds(&mut engine, 301.0);
    let closed = reports
        .iter()
        .filter(|r| matches!(r.transition, Some(PhaseTransition::DayEnded { .. })))
        .count();
    results.push(check(
        "day_closes_once",
        closed == 1 && engine.phase() == Phase::Night,
        format!("{} closings, phase {:?}", closed, engine.phase()),
    ));
    results.push(check(
        "autosave_once_per_day",
        saves.get() == 1,
        format!("{} autosaves", saves.get()),
    ));

    let visitors = engine.world.analytics.day(0).map_or(0, |d| d.visitors);
    let night = run_seconds(&mut engine, 30.0);
    let night_visitors: u32 = night.iter().map(|r| r.visitors).sum();
    results.push(check(
        "shop_closed_at_night",
        night_visitors == 0,
        format!("{} day-0 visitors, {} at night", visitors, night_visitors),
    ));

    run_seconds(&mut engine, 31.0);
    results.push(check(
        "next_day_opens",
        engine.phase() == Phase::Day && engine.day_index() == 1 && saves.get() == 1,
        format!("day {} {:?}", engine.day_index(), engine.phase()),
    ));

    if verbose {
        println!("    ran {:.1}s of game time", engine.time_seconds());
    }
    results
}

// ── 3. Deliveries ───────────────────────────────────────────────────────

fn validate_deliveries(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Deliveries");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        results.push(check("delivery_engine", false, "engine rejected config"));
        return results;
    };

    let start = engine.inventory().boosters;
    let money = engine.money();
    let id = match engine.place_order(ProductKind::Booster, 5) {
        Ok(id) => id,
        Err(e) => {
            results.push(check("order_accepted", false, e.to_string()));
            return results;
        }
    };
    results.push(check(
        "order_charged_wholesale",
        engine.money() == money - 10,
        format!("${} -> ${}", money, engine.money()),
    ));

    for _ in 0..299 {
        engine.advance(0.1);
    }
    results.push(check(
        "order_not_early",
        engine.inventory().boosters == start && engine.pending_orders().len() == 1,
        format!(
            "t={:.2} boosters={} eta={:?}",
            engine.time_seconds(),
            engine.inventory().boosters,
            engine.pending_orders().first().map(|o| o.eta_seconds)
        ),
    ));

    let mut delivered = Vec::new();
    for _ in 0..100 {
        delivered.extend(engine.advance(0.1).delivered);
    }
    results.push(check(
        "order_delivered_once",
        delivered == vec![id] && engine.inventory().boosters == start + 5,
        format!("{} deliveries, boosters={}", delivered.len(), engine.inventory().boosters),
    ));

    let rejected = [
        engine.place_order(ProductKind::Deck, 0).is_err(),
        engine.place_order_by_key("sleeves", 3).is_err(),
        engine.place_order(ProductKind::Single(Rarity::Legendary), 10_000).is_err(),
    ];
    results.push(check(
        "bad_orders_rejected",
        rejected.iter().all(|r| *r) && engine.pending_orders().is_empty(),
        format!("{:?}", rejected),
    ));

    if verbose {
        println!("    order {} settled", id.0);
    }
    results
}

// ── 4. Layout ───────────────────────────────────────────────────────────

fn validate_layout(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Layout");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        results.push(check("layout_engine", false, "engine rejected config"));
        return results;
    };

    let tile = Tile::new(5, 5);
    let first = engine.place_object(tile, FixtureKind::Counter).is_ok();
    let second = engine.place_object(tile, FixtureKind::Shelf);
    results.push(check(
        "placement_conflict",
        first && matches!(second, Err(ShopError::Conflict { .. })),
        format!("{:?}", second),
    ));

    let outside = engine.place_object(Tile::new(-1, 3), FixtureKind::Poster);
    results.push(check(
        "placement_out_of_bounds",
        outside.is_err(),
        format!("{:?}", outside),
    ));

    let shelf = Tile::new(8, 8);
    let _ = engine.place_object(shelf, FixtureKind::Shelf);
    let _ = engine.set_shelf_product(shelf, ShelfProduct::Bulk(ProductKind::Booster));
    let stocked = engine.stock_shelf_manually(shelf, 4).unwrap_or(0);
    let before = engine.world.total_stock(ProductKind::Booster);
    let removed = engine.remove_object(shelf).is_ok();
    results.push(check(
        "remove_returns_stock",
        removed && engine.world.total_stock(ProductKind::Booster) == before,
        format!("{} stocked, {} total after removal", stocked, before),
    ));

    results.push(check(
        "occupancy_consistent",
        engine.world.check_invariants().is_ok(),
        format!("{} objects", engine.layout().objects().len()),
    ));

    if verbose {
        println!("    {} objects on the floor", engine.layout().objects().len());
    }
    results
}

// ── 5. Staff ────────────────────────────────────────────────────────────

fn validate_staff(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Staff");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        results.push(check("staff_engine", false, "engine rejected config"));
        return results;
    };

    let blocked = Tile::new(1, 0);
    let shelf = Tile::new(3, 0);
    let full = Tile::new(9, 4);
    let _ = engine.place_object(blocked, FixtureKind::Counter);
    for (tile, qty) in [(shelf, 1), (full, 10)] {
        let _ = engine.place_object(tile, FixtureKind::Shelf);
        let _ = engine.set_shelf_product(tile, ShelfProduct::Bulk(ProductKind::Booster));
        let _ = engine.stock_shelf_manually(tile, qty);
    }

    let plans = restock_candidates(&engine.world);
    results.push(check(
        "full_shelf_never_selected",
        plans.iter().all(|p| p.shelf != full) && plans.first().map(|p| p.shelf) == Some(shelf),
        format!("{} candidates", plans.len()),
    ));

    engine.advance(0.0);
    let route_ok = match &engine.staff().state {
        StaffState::Moving { goal, path, .. } => {
            goal.manhattan(shelf) == 1 && !path.contains(&blocked)
        }
        _ => false,
    };
    results.push(check(
        "route_avoids_blocked_tile",
        route_ok,
        format!("state {}", engine.staff().state.label()),
    ));

    let reports = run_seconds(&mut engine, 5.0);
    let restocked: u32 = reports
        .iter()
        .flat_map(|r| &r.restocks)
        .map(|r| r.amount)
        .sum();
    results.push(check(
        "staff_restocks_shelf",
        restocked > 0 && engine.staff().xp > 0,
        format!(
            "{} units restocked, xp={} level={}",
            restocked,
            engine.staff().xp,
            engine.staff().level()
        ),
    ));

    let award = engine.record_pack_open(10);
    results.push(check(
        "pack_open_xp",
        award.gained == 120 && award.leveled_up(),
        format!("+{} xp, level {} -> {}", award.gained, award.prev_level, award.new_level),
    ));

    if verbose {
        println!("    staff at {}", engine.staff().tile());
    }
    results
}

// ── 6. Economy ──────────────────────────────────────────────────────────

fn validate_economy(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Economy");
    let mut results = Vec::new();
    let (Some(mut a), Some(mut b)) = (new_engine(config), new_engine(config)) else {
        results.push(check("economy_engine", false, "engine rejected config"));
        return results;
    };
    furnish(&mut a);
    furnish(&mut b);

    let sales_a: Vec<_> = run_seconds(&mut a, 299.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .collect();
    let sales_b: Vec<_> = run_seconds(&mut b, 299.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .collect();

    results.push(check(
        "customers_buy",
        !sales_a.is_empty(),
        format!("{} sales, ${} in till", sales_a.len(), a.money()),
    ));
    results.push(check(
        "seeded_sales_repeat",
        sales_a == sales_b,
        format!("{} vs {} sales", sales_a.len(), sales_b.len()),
    ));

    let Some(mut c) = new_engine(config) else {
        return results;
    };
    furnish(&mut c);
    c.set_pricing_mode(PricingMode::Markup);
    c.set_markup(ProductKind::Booster, 2.0);
    c.set_modifiers(Modifiers {
        sell_price_pct: 0.5,
        sales_xp_pct: 0.0,
    });
    let marked_up: Vec<_> = run_seconds(&mut c, 299.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .filter(|s| s.product == ProductKind::Booster)
        .collect();
    results.push(check(
        "markup_and_modifiers_priced",
        marked_up.iter().all(|s| s.price == 9),
        format!("{} booster sales", marked_up.len()),
    ));

    if verbose {
        if let Some(day) = a.world.analytics.day(0) {
            println!(
                "    day 0: {} visitors, {} units, ${}",
                day.visitors,
                day.units_sold.values().sum::<u32>(),
                day.revenue
            );
        }
    }
    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Persistence");
    let mut results = Vec::new();
    let Some(mut original) = new_engine(config) else {
        results.push(check("persistence_engine", false, "engine rejected config"));
        return results;
    };
    furnish(&mut original);
    let _ = original.place_order(ProductKind::Deck, 2);
    run_seconds(&mut original, 20.0);

    let mut json = Vec::new();
    let mut binary = Vec::new();
    let saved = original.save_json(&mut json).is_ok() && original.save_binary(&mut binary).is_ok();
    results.push(check(
        "saves_written",
        saved,
        format!("json {} bytes, binary {} bytes", json.len(), binary.len()),
    ));

    let mut from_json = ShopEngine::new();
    let mut from_binary = ShopEngine::new();
    let loaded =
        from_json.load_json(&json[..]).is_ok() && from_binary.load_binary(&binary[..]).is_ok();
    results.push(check(
        "saves_loaded",
        loaded && from_json.pending_orders() == original.pending_orders(),
        format!("{} pending orders", from_json.pending_orders().len()),
    ));

    let mut restored = ShopEngine::new();
    restored.restore(original.snapshot());
    let a: Vec<_> = run_seconds(&mut original, 60.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .collect();
    let b: Vec<_> = run_seconds(&mut restored, 60.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .collect();
    let c: Vec<_> = run_seconds(&mut from_binary, 60.0)
        .into_iter()
        .flat_map(|r| r.sales)
        .collect();
    results.push(check(
        "restore_replays",
        a == b && a == c && original.staff() == restored.staff(),
        format!("{} sales replayed", a.len()),
    ));

    let legacy = br#"{ "version": 0, "money": 50 }"#;
    let mut old = ShopEngine::new();
    let legacy_ok = old.load_json(&legacy[..]).is_ok() && old.money() == 50;
    results.push(check(
        "legacy_json_defaults",
        legacy_ok && old.world.check_invariants().is_ok(),
        "missing keys defaulted",
    ));

    // Nested keys dropped from an otherwise valid save.
    let sparse = serde_json::json!({
        "version": 1,
        "objects": [
            { "id": 3, "tile": { "x": 2 }, "fixture": "Counter" },
            { "tile": { "x": 4, "y": 1 }, "fixture": "Poster" }
        ],
        "deliveries": {
            "orders": [
                { "order_id": 1, "product": "Booster", "amount": 5, "arrival_at": 30.0 }
            ]
        }
    });
    let mut repaired = ShopEngine::new();
    let sparse_ok = match serde_json::to_vec(&sparse) {
        Ok(bytes) => repaired.load_json(&bytes[..]).is_ok(),
        Err(e) => {
            log::warn!("sparse save did not encode: {e}");
            false
        }
    };
    let objects = repaired.layout().objects().len();
    let orders = repaired.pending_orders().len();
    results.push(check(
        "sparse_json_repaired",
        sparse_ok && objects == 2 && orders == 1 && repaired.world.check_invariants().is_ok(),
        format!("{objects} objects, {orders} orders"),
    ));

    if verbose {
        println!("    snapshot version {}", original.snapshot().version);
    }
    results
}

// ── 8. Soak ─────────────────────────────────────────────────────────────

fn validate_soak(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Multi-day Soak");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        results.push(check("soak_engine", false, "engine rejected config"));
        return results;
    };
    furnish(&mut engine);

    let mut violations = Vec::new();
    for day in 0..3 {
        for _ in 0..(360.0 / FRAME) as usize {
            engine.advance(FRAME);
        }
        if let Err(e) = engine.world.check_invariants() {
            violations.push(format!("day {day}: {e}"));
        }
        for s in engine.restock_suggestions(config.delivery_delay_s, 3, 2) {
            let _ = engine.place_order(s.product, s.recommended_qty);
        }
    }
    results.push(check(
        "soak_invariants_hold",
        violations.is_empty(),
        if violations.is_empty() {
            format!("{} days simulated", engine.day_index())
        } else {
            violations.join("; ")
        },
    ));

    let sold: u32 = (0..=engine.day_index())
        .filter_map(|d| engine.world.analytics.day(d))
        .flat_map(|d| d.units_sold.values())
        .sum();
    let ordered: u32 = (0..=engine.day_index())
        .filter_map(|d| engine.world.analytics.day(d))
        .flat_map(|d| d.orders_placed.values())
        .sum();
    results.push(check(
        "soak_trades",
        sold > 0,
        format!("{} units sold, {} orders placed, ${}", sold, ordered, engine.money()),
    ));

    if verbose {
        for (shelf, count) in engine.world.analytics.top_stockout_shelves(engine.day_index(), 3, 3) {
            println!("    stockouts at {}: {}", shelf, count);
        }
    }
    results
}
