//! Shop floor grid and tile occupancy.
//!
//! The shop is a `width × height` grid of unit tiles. Every placed object has
//! a 1×1 footprint; multi-tile objects are not supported.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer tile coordinate. Ordering is lexicographic on `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four orthogonal neighbours in a fixed order (+x, -x, +y, -y).
    pub fn neighbors(self) -> [Tile; 4] {
        [
            Tile::new(self.x + 1, self.y),
            Tile::new(self.x - 1, self.y),
            Tile::new(self.x, self.y + 1),
            Tile::new(self.x, self.y - 1),
        ]
    }

    pub fn manhattan(self, other: Tile) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Centre of the tile in tile-space (`(x + 0.5, y + 0.5)`).
    pub fn center(self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Tile containing a tile-space point.
    pub fn containing(x: f32, y: f32) -> Tile {
        Tile::new(x.floor() as i32, y.floor() as i32)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identifier of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Why an occupancy change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("tile {0} is outside the shop")]
    OutOfBounds(Tile),
    #[error("tile {tile} is already occupied by object {}", .by.0)]
    Occupied { tile: Tile, by: ObjectId },
}

/// Dense occupancy map: which tiles are blocked and by which object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOccupancy {
    width: i32,
    height: i32,
    cells: Vec<Option<ObjectId>>,
}

impl GridOccupancy {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            cells: vec![None; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    /// Row-major tile index, used as a deterministic tie-break.
    pub fn index_of(&self, tile: Tile) -> Option<usize> {
        self.in_bounds(tile)
            .then(|| (tile.y * self.width + tile.x) as usize)
    }

    /// In bounds and not blocked by any object.
    pub fn is_walkable(&self, tile: Tile) -> bool {
        self.index_of(tile).is_some_and(|i| self.cells[i].is_none())
    }

    pub fn occupant(&self, tile: Tile) -> Option<ObjectId> {
        self.index_of(tile).and_then(|i| self.cells[i])
    }

    /// Mark `tile` as blocked by `id`. Fails if out of bounds or already taken.
    pub fn occupy(&mut self, tile: Tile, id: ObjectId) -> Result<(), OccupancyError> {
        let i = self
            .index_of(tile)
            .ok_or(OccupancyError::OutOfBounds(tile))?;
        if let Some(by) = self.cells[i] {
            return Err(OccupancyError::Occupied { tile, by });
        }
        self.cells[i] = Some(id);
        Ok(())
    }

    /// Free `tile`, returning the object that was there.
    pub fn release(&mut self, tile: Tile) -> Option<ObjectId> {
        let i = self.index_of(tile)?;
        self.cells[i].take()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Build an occupancy map from `(tile, id)` pairs, skipping any pair
    /// that is out of bounds or collides with an earlier one.
    pub fn from_objects<I>(width: u32, height: u32, objects: I) -> (Self, Vec<OccupancyError>)
    where
        I: IntoIterator<Item = (Tile, ObjectId)>,
    {
        let mut grid = Self::new(width, height);
        let mut rejected = Vec::new();
        for (tile, id) in objects {
            if let Err(e) = grid.occupy(tile, id) {
                rejected.push(e);
            }
        }
        (grid, rejected)
    }
}
