#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic maze generation using iterative recursive backtracking.
//!
//! Corridors are carved on odd coordinates two cells at a time, which yields
//! a spanning tree over the carved cells: every corridor cell is reachable
//! from the start and no loops exist. The finished grid is verified before
//! it is handed out; a grid that fails verification is reported as an error
//! rather than returned.

use std::collections::VecDeque;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torchlight_core::{
    validate_dimensions, CellCoord, ConfigError, Direction, GridBuilder, GridError, MazeGrid,
};

/// Cell every generated maze starts from.
pub const START: CellCoord = CellCoord::new(1, 1);

/// Failures that abort maze setup.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The requested dimensions cannot be generated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The carved grid broke a perfect-maze invariant.
    #[error("generated maze is invalid: {0}")]
    InvariantViolation(#[from] Violation),
}

/// Specific invariant a generated grid failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// No corridor could join the exit to the carved tree.
    #[error("exit {0} could not be joined to the corridors")]
    ExitIsolated(CellCoord),
    /// Some corridor cells cannot be reached from the start.
    #[error("only {reached} of {total} corridor cells are reachable from the start")]
    Disconnected {
        /// Corridor cells reached by a flood fill from the start.
        reached: usize,
        /// Corridor cells present in the grid.
        total: usize,
    },
    /// The corridor graph contains a loop.
    #[error("{edges} corridor connections over {cells} cells form a loop")]
    Cyclic {
        /// Adjacent corridor pairs in the grid.
        edges: usize,
        /// Corridor cells in the grid.
        cells: usize,
    },
    /// The start or exit could not be sealed into the grid.
    #[error(transparent)]
    Endpoints(#[from] GridError),
}

/// Exit cell used for a maze of the provided size.
#[must_use]
pub const fn exit_cell(width: u32, height: u32) -> CellCoord {
    CellCoord::new(width.saturating_sub(2), height.saturating_sub(2))
}

/// Generates a perfect maze seeded with `seed`.
///
/// The same dimensions and seed always produce the same grid.
pub fn generate(width: u32, height: u32, seed: u64) -> Result<MazeGrid, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let grid = generate_with(width, height, &mut rng)?;
    debug!(
        "generated {}x{} maze from seed {seed:#x} with {} corridor cells",
        width,
        height,
        grid.walkable_cells().count()
    );
    Ok(grid)
}

/// Generates a perfect maze drawing randomness from `rng`.
pub fn generate_with<R>(width: u32, height: u32, rng: &mut R) -> Result<MazeGrid, GenerationError>
where
    R: Rng + ?Sized,
{
    validate_dimensions(width, height)?;

    let mut builder = GridBuilder::new(width, height);
    carve_passages(&mut builder, START, rng);

    let exit = exit_cell(width, height);
    connect_exit(&mut builder, exit)?;

    let grid = builder.finish(START, exit).map_err(Violation::from)?;
    verify(&grid)?;
    Ok(grid)
}

/// Checks that every corridor cell is reachable from the start and that the
/// corridor graph has no loops.
pub fn verify(grid: &MazeGrid) -> Result<(), Violation> {
    let total = grid.walkable_cells().count();
    let reached = flood_fill_count(grid, grid.start());
    if reached != total {
        return Err(Violation::Disconnected { reached, total });
    }

    let edges = corridor_edges(grid);
    if edges + 1 != total {
        return Err(Violation::Cyclic {
            edges,
            cells: total,
        });
    }

    Ok(())
}

fn carve_passages<R>(builder: &mut GridBuilder, start: CellCoord, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let _ = builder.carve(start);
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let mut candidates = [Direction::North; 4];
        let mut count = 0_u32;
        for direction in Direction::ALL {
            let Some(next) = current.offset(direction, 2) else {
                continue;
            };
            if builder.is_interior(next) && builder.is_wall(next) {
                if let Some(slot) = candidates.get_mut(count as usize) {
                    *slot = direction;
                    count += 1;
                }
            }
        }

        if count == 0 {
            let _ = stack.pop();
            continue;
        }

        let choice = rng.gen_range(0..count) as usize;
        let Some(&direction) = candidates.get(choice) else {
            continue;
        };
        let (Some(between), Some(next)) = (current.step(direction), current.offset(direction, 2))
        else {
            continue;
        };

        let _ = builder.carve(between);
        let _ = builder.carve(next);
        stack.push(next);
    }
}

/// Joins the exit to the carved tree when backtracking did not reach it.
///
/// Grids with even dimensions leave the exit off the odd carving lattice.
/// The connecting corridor is the shortest run of wall cells that touch no
/// corridor, ending in a cell that touches exactly one, so the tree stays a
/// tree.
fn connect_exit(builder: &mut GridBuilder, exit: CellCoord) -> Result<(), Violation> {
    if builder.is_path(exit) {
        return Ok(());
    }
    if !builder.is_interior(exit) {
        return Err(Violation::ExitIsolated(exit));
    }

    let width = usize::try_from(builder.width()).unwrap_or(0);
    let height = usize::try_from(builder.height()).unwrap_or(0);
    let mut parents: Vec<Option<CellCoord>> = vec![None; width.saturating_mul(height)];
    let mut seen = vec![false; parents.len()];
    let mut queue = VecDeque::new();

    let _ = mark(&mut seen, width, exit);
    queue.push_back(exit);

    while let Some(cell) = queue.pop_front() {
        let touching = builder
            .neighbors4(cell)
            .filter(|neighbor| builder.is_path(*neighbor))
            .count();

        if touching == 1 {
            let mut cursor = Some(cell);
            while let Some(corridor) = cursor {
                let _ = builder.carve(corridor);
                cursor = slot(width, corridor).and_then(|index| parents.get(index).copied().flatten());
            }
            debug!("joined exit {exit} to the corridors at {cell}");
            return Ok(());
        }

        if touching > 1 {
            continue;
        }

        for neighbor in builder.neighbors4(cell) {
            if !builder.is_interior(neighbor) || !builder.is_wall(neighbor) {
                continue;
            }
            if !mark(&mut seen, width, neighbor) {
                continue;
            }
            if let Some(parent) = slot(width, neighbor).and_then(|index| parents.get_mut(index)) {
                *parent = Some(cell);
            }
            queue.push_back(neighbor);
        }
    }

    Err(Violation::ExitIsolated(exit))
}

fn flood_fill_count(grid: &MazeGrid, origin: CellCoord) -> usize {
    let Ok(width) = usize::try_from(grid.width()) else {
        return 0;
    };
    let mut seen = vec![false; grid.cell_count()];
    if !grid.is_walkable(origin) || !mark(&mut seen, width, origin) {
        return 0;
    }

    let mut queue = VecDeque::from([origin]);
    let mut reached = 0;

    while let Some(cell) = queue.pop_front() {
        reached += 1;
        for neighbor in grid.walkable_neighbors(cell) {
            if mark(&mut seen, width, neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    reached
}

fn corridor_edges(grid: &MazeGrid) -> usize {
    grid.walkable_cells()
        .map(|cell| {
            [Direction::East, Direction::South]
                .into_iter()
                .filter_map(|direction| cell.step(direction))
                .filter(|neighbor| grid.is_walkable(*neighbor))
                .count()
        })
        .sum()
}

fn slot(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

/// Marks the cell as seen, returning `false` when it already was.
fn mark(seen: &mut [bool], width: usize, cell: CellCoord) -> bool {
    match slot(width, cell).and_then(|index| seen.get_mut(index)) {
        Some(flag) if !*flag => {
            *flag = true;
            true
        }
        _ => false,
    }
}
