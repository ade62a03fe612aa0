//! The shop's staff member and their restock state machine.

use std::collections::VecDeque;

use cardshop_logic::grid::Tile;
use cardshop_logic::products::{ProductKind, Rarity};
use cardshop_logic::staff_xp::level_from_xp;
use serde::{Deserialize, Serialize};

use super::inventory::CardId;

/// What the staff intends to put on the target shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestockItem {
    /// Up to `amount` units from inventory; re-capped when stocking.
    Bulk {
        product: ProductKind,
        #[serde(default)]
        amount: u32,
    },
    /// One specific card from the collection.
    Card { card_id: CardId, rarity: Rarity },
}

/// A selected shelf plus what to move onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockPlan {
    #[serde(default)]
    pub shelf: Tile,
    pub item: RestockItem,
}

/// Staff controller state. Every non-idle state carries its plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaffState {
    Idle {
        #[serde(default)]
        scan_cooldown: f32,
    },
    Moving {
        plan: RestockPlan,
        /// Walkable tile next to the shelf the path ends at.
        #[serde(default)]
        goal: Tile,
        #[serde(default)]
        path: VecDeque<Tile>,
    },
    Stocking {
        plan: RestockPlan,
        #[serde(default)]
        timer: f32,
    },
}

impl Default for StaffState {
    fn default() -> Self {
        StaffState::Idle { scan_cooldown: 0.0 }
    }
}

impl StaffState {
    pub fn plan(&self) -> Option<&RestockPlan> {
        match self {
            StaffState::Idle { .. } => None,
            StaffState::Moving { plan, .. } | StaffState::Stocking { plan, .. } => Some(plan),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StaffState::Idle { .. } => "idle",
            StaffState::Moving { .. } => "moving",
            StaffState::Stocking { .. } => "stocking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Staff {
    /// Tile-space position; tile centres sit at `x + 0.5`.
    pub position: (f32, f32),
    pub xp: u64,
    pub state: StaffState,
}

impl Default for Staff {
    fn default() -> Self {
        Self::at(Tile::new(1, 10))
    }
}

impl Staff {
    pub fn at(tile: Tile) -> Self {
        Self {
            position: tile.center(),
            xp: 0,
            state: StaffState::default(),
        }
    }

    pub fn tile(&self) -> Tile {
        Tile::containing(self.position.0, self.position.1)
    }

    pub fn level(&self) -> u32 {
        level_from_xp(self.xp)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, StaffState::Idle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_follows_xp() {
        let mut staff = Staff::at(Tile::new(0, 0));
        assert_eq!(staff.level(), 1);
        staff.xp = 250;
        assert_eq!(staff.level(), 3);
    }

    #[test]
    fn test_tile_from_center() {
        let staff = Staff::at(Tile::new(3, 4));
        assert_eq!(staff.position, (3.5, 4.5));
        assert_eq!(staff.tile(), Tile::new(3, 4));
        assert!(staff.is_idle());
        assert!(staff.state.plan().is_none());
    }
}
