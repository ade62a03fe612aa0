//! Plain data owned by the shop world.
//!
//! Components hold state and small invariant-keeping helpers.
//! Per-tick behavior lives in systems.

mod clock;
mod inventory;
mod layout;
mod staff;

pub use clock::*;
pub use inventory::*;
pub use layout::*;
pub use staff::*;
