//! Pure simulation logic for the card shop.
//!
//! This crate contains the shop rules that are independent of the tick
//! engine and of any host. Functions take plain data and return results,
//! which keeps them unit-testable and reusable from tools and benchmarks.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`economy`] | Daily footfall, arrival pacing, weighted purchase choice |
//! | [`forecast`] | Lead-time demand and reorder quantities |
//! | [`grid`] | Tiles, object ids, occupancy map |
//! | [`pathfinding`] | BFS over walkable tiles with deterministic tie-breaks |
//! | [`pricing`] | Retail prices, markup, wholesale costs, sale modifiers |
//! | [`products`] | Rarities, product kinds and keys, shelf products |
//! | [`staff_xp`] | Staff XP awards and the derived level curve |

pub mod economy;
pub mod forecast;
pub mod grid;
pub mod pathfinding;
pub mod pricing;
pub mod products;
pub mod staff_xp;
