//! Pure BFS pathfinding over the shop grid.
//!
//! Paths are shortest in tile count (4-connected). Ties are broken
//! deterministically: neighbours are expanded in a fixed order and, when
//! several goal tiles are equally close, the lexicographically smallest
//! `(x, y)` wins.

use std::collections::VecDeque;

use thiserror::Error;

use crate::grid::{GridOccupancy, Tile};

/// Why no path could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// None of the candidate goal tiles is walkable.
    #[error("no walkable goal tile")]
    NoWalkableGoal,
    /// Goals exist but none is connected to the start.
    #[error("no path from {from}")]
    Unreachable { from: Tile },
}

/// A resolved route: the chosen goal and the tiles to step through
/// (excluding the start tile, ending at `goal`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPlan {
    pub goal: Tile,
    pub steps: Vec<Tile>,
}

impl PathPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Walkable tiles orthogonally adjacent to `target`, in neighbour order.
pub fn adjacent_walk_tiles(grid: &GridOccupancy, target: Tile) -> Vec<Tile> {
    target
        .neighbors()
        .into_iter()
        .filter(|t| grid.is_walkable(*t))
        .collect()
}

/// Shortest path from `start` to `goal`.
///
/// The start tile itself may be blocked (an object placed under the actor);
/// every other tile on the path must be walkable.
pub fn find_path(grid: &GridOccupancy, start: Tile, goal: Tile) -> Result<Vec<Tile>, PathError> {
    find_path_to_any(grid, start, &[goal]).map(|plan| plan.steps)
}

/// Shortest path from `start` to whichever of `goals` is closest.
pub fn find_path_to_any(
    grid: &GridOccupancy,
    start: Tile,
    goals: &[Tile],
) -> Result<PathPlan, PathError> {
    let walkable_goals: Vec<Tile> = goals
        .iter()
        .copied()
        .filter(|g| *g == start || grid.is_walkable(*g))
        .collect();
    if walkable_goals.is_empty() {
        return Err(PathError::NoWalkableGoal);
    }
    if walkable_goals.contains(&start) {
        return Ok(PathPlan {
            goal: start,
            steps: vec![],
        });
    }

    let start_idx = grid
        .index_of(start)
        .ok_or(PathError::Unreachable { from: start })?;
    let size = (grid.width() * grid.height()) as usize;
    let mut dist: Vec<Option<u32>> = vec![None; size];
    let mut prev: Vec<Option<Tile>> = vec![None; size];
    let mut queue = VecDeque::new();
    dist[start_idx] = Some(0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let Some(cur_idx) = grid.index_of(current) else {
            continue;
        };
        let d = dist[cur_idx].unwrap_or(0);
        for next in current.neighbors() {
            if !grid.is_walkable(next) {
                continue;
            }
            let Some(next_idx) = grid.index_of(next) else {
                continue;
            };
            if dist[next_idx].is_some() {
                continue;
            }
            dist[next_idx] = Some(d + 1);
            prev[next_idx] = Some(current);
            queue.push_back(next);
        }
    }

    let best = walkable_goals
        .iter()
        .filter_map(|g| {
            let idx = grid.index_of(*g)?;
            dist[idx].map(|d| (d, *g))
        })
        .min();

    let Some((_, goal)) = best else {
        return Err(PathError::Unreachable { from: start });
    };

    let mut steps = Vec::new();
    let mut node = goal;
    while node != start {
        steps.push(node);
        match grid.index_of(node).and_then(|i| prev[i]) {
            Some(p) => node = p,
            None => return Err(PathError::Unreachable { from: start }),
        }
    }
    steps.reverse();
    Ok(PathPlan { goal, steps })
}
