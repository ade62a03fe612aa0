//! Systems - per-tick logic that operates on the shop world

mod analytics;
mod day_night;
mod delivery;
mod economy;
mod forecast;
mod staff;

pub use analytics::*;
pub use day_night::*;
pub use delivery::*;
pub use economy::*;
pub use forecast::*;
pub use staff::*;
