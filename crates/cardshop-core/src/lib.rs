//! CardShop Core - Card Shop Simulation Engine
//!
//! A deterministic, host-independent simulation of a small trading-card
//! shop: a day/night clock, supplier deliveries, customers buying from
//! shelves, and a staff member who walks the floor restocking them.
//!
//! # Architecture
//!
//! All state lives in one owned aggregate, [`world::ShopWorld`]:
//! - **Components**: Plain data (layout, shelves, inventory, staff, clock)
//! - **Systems**: Functions that take `&mut ShopWorld` for one tick
//! - **Engine**: [`engine::ShopEngine`], the only entry point a host needs
//!
//! Pure rules (pricing, pathfinding, XP, forecasting) live in `cardshop-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cardshop_core::prelude::*;
//!
//! let mut engine = ShopEngine::new();
//! let shelf = Tile::new(4, 3);
//! engine.place_object(shelf, FixtureKind::Shelf).unwrap();
//! engine
//!     .set_shelf_product(shelf, ShelfProduct::Bulk(ProductKind::Booster))
//!     .unwrap();
//!
//! loop {
//!     let report = engine.advance(1.0 / 60.0); // 60 FPS
//!     if report.autosaved {
//!         break;
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{SimConfig, StaffConfig};
    pub use crate::engine::{AutosaveHook, ShopEngine, TickReport};
    pub use crate::error::{ConfigError, SaveError, ShopError};
    pub use crate::persistence::Snapshot;
    pub use crate::systems::{OrderId, PendingOrderView};
    pub use cardshop_logic::grid::Tile;
    pub use cardshop_logic::products::{ProductKind, Rarity, ShelfProduct};
}
