#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Route planning across a finished maze grid.
//!
//! Three strategies share a single entry point, [`find_path`]. Every search
//! expands neighbours in the grid's fixed North, East, South, West order, so
//! repeated calls on the same grid with the same endpoints return the same
//! route. Searches keep no state between calls.

mod distance;

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

use torchlight_core::{CellCoord, MazeGrid, Route, Strategy};

pub use distance::{distance_field, DistanceField};

/// Reasons a route could not be produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// An endpoint is a wall or lies outside the grid.
    #[error("{0} is not a walkable cell")]
    NotWalkable(CellCoord),
    /// The target cannot be reached from the source.
    #[error("no route from {from} to {target}")]
    NotFound {
        /// Cell the search started from.
        from: CellCoord,
        /// Cell the search tried to reach.
        target: CellCoord,
    },
}

/// Plans a route from `source` to `target` using `strategy`.
///
/// The returned route includes both endpoints. When `source` equals
/// `target` the route is empty. Unreachable targets yield
/// [`PathError::NotFound`] instead of panicking, even on grids that are not
/// perfect mazes.
pub fn find_path(
    grid: &MazeGrid,
    source: CellCoord,
    target: CellCoord,
    strategy: Strategy,
) -> Result<Route, PathError> {
    for endpoint in [source, target] {
        if !grid.is_walkable(endpoint) {
            return Err(PathError::NotWalkable(endpoint));
        }
    }

    if source == target {
        return Ok(Route::empty());
    }

    let parents = match strategy {
        Strategy::AStar => a_star(grid, source, target),
        Strategy::Bfs => breadth_first(grid, source, target),
        Strategy::Dfs => depth_first(grid, source, target),
    };

    parents
        .and_then(|parents| parents.route(grid, source, target))
        .ok_or(PathError::NotFound {
            from: source,
            target,
        })
}

/// Parent links recorded by a search, indexed by dense grid offset.
#[derive(Debug)]
struct Parents {
    links: Vec<Option<CellCoord>>,
}

impl Parents {
    fn new(grid: &MazeGrid) -> Self {
        Self {
            links: vec![None; grid.cell_count()],
        }
    }

    fn link(&mut self, grid: &MazeGrid, cell: CellCoord, parent: CellCoord) {
        if let Some(slot) = grid.index(cell).and_then(|index| self.links.get_mut(index)) {
            *slot = Some(parent);
        }
    }

    fn parent(&self, grid: &MazeGrid, cell: CellCoord) -> Option<CellCoord> {
        grid.index(cell)
            .and_then(|index| self.links.get(index).copied().flatten())
    }

    fn route(&self, grid: &MazeGrid, source: CellCoord, target: CellCoord) -> Option<Route> {
        let mut cells = vec![target];
        let mut cursor = target;

        while cursor != source {
            if cells.len() > self.links.len() {
                return None;
            }
            cursor = self.parent(grid, cursor)?;
            cells.push(cursor);
        }

        cells.reverse();
        Some(Route::new(cells))
    }
}

/// Dense visited flags sized to the grid.
#[derive(Debug)]
struct Visited {
    flags: Vec<bool>,
}

impl Visited {
    fn new(grid: &MazeGrid) -> Self {
        Self {
            flags: vec![false; grid.cell_count()],
        }
    }

    fn contains(&self, grid: &MazeGrid, cell: CellCoord) -> bool {
        grid.index(cell)
            .and_then(|index| self.flags.get(index).copied())
            .unwrap_or(true)
    }

    /// Marks the cell, returning `false` when it was already marked.
    fn insert(&mut self, grid: &MazeGrid, cell: CellCoord) -> bool {
        match grid.index(cell).and_then(|index| self.flags.get_mut(index)) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }
}

/// Frontier entry ordered by estimated total cost, then discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    estimate: u32,
    sequence: u64,
    cost: u32,
    cell: CellCoord,
}

fn a_star(grid: &MazeGrid, source: CellCoord, target: CellCoord) -> Option<Parents> {
    let mut parents = Parents::new(grid);
    let mut finalized = Visited::new(grid);
    let mut best_cost = vec![u32::MAX; grid.cell_count()];
    let mut frontier = BinaryHeap::new();
    let mut sequence = 0_u64;

    *best_cost.get_mut(grid.index(source)?)? = 0;
    frontier.push(Reverse(FrontierEntry {
        estimate: source.manhattan_distance(target),
        sequence,
        cost: 0,
        cell: source,
    }));

    while let Some(Reverse(entry)) = frontier.pop() {
        if !finalized.insert(grid, entry.cell) {
            continue;
        }
        if entry.cell == target {
            return Some(parents);
        }

        let cost = entry.cost.saturating_add(1);
        for neighbor in grid.walkable_neighbors(entry.cell) {
            if finalized.contains(grid, neighbor) {
                continue;
            }
            let Some(known) = grid.index(neighbor).and_then(|index| best_cost.get_mut(index))
            else {
                continue;
            };
            if cost >= *known {
                continue;
            }

            *known = cost;
            parents.link(grid, neighbor, entry.cell);
            sequence += 1;
            frontier.push(Reverse(FrontierEntry {
                estimate: cost.saturating_add(neighbor.manhattan_distance(target)),
                sequence,
                cost,
                cell: neighbor,
            }));
        }
    }

    None
}

fn breadth_first(grid: &MazeGrid, source: CellCoord, target: CellCoord) -> Option<Parents> {
    let mut parents = Parents::new(grid);
    let mut visited = Visited::new(grid);
    let mut queue = VecDeque::new();

    let _ = visited.insert(grid, source);
    queue.push_back(source);

    while let Some(cell) = queue.pop_front() {
        for neighbor in grid.walkable_neighbors(cell) {
            if !visited.insert(grid, neighbor) {
                continue;
            }
            parents.link(grid, neighbor, cell);
            if neighbor == target {
                return Some(parents);
            }
            queue.push_back(neighbor);
        }
    }

    None
}

fn depth_first(grid: &MazeGrid, source: CellCoord, target: CellCoord) -> Option<Parents> {
    let mut parents = Parents::new(grid);
    let mut visited = Visited::new(grid);
    let mut stack = vec![(source, None)];

    while let Some((cell, parent)) = stack.pop() {
        if !visited.insert(grid, cell) {
            continue;
        }
        if let Some(parent) = parent {
            parents.link(grid, cell, parent);
        }
        if cell == target {
            return Some(parents);
        }

        let neighbors: Vec<CellCoord> = grid
            .walkable_neighbors(cell)
            .filter(|neighbor| !visited.contains(grid, *neighbor))
            .collect();
        // Pushed in reverse so the first direction is explored first.
        for neighbor in neighbors.into_iter().rev() {
            stack.push((neighbor, Some(cell)));
        }
    }

    None
}
