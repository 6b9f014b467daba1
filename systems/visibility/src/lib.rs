#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Torch visibility around the player.
//!
//! The lit area is a Manhattan diamond clipped to the grid. Walls do not
//! block light and nothing is remembered between queries.

use std::collections::{btree_set, BTreeSet};

use torchlight_core::{CellCoord, MazeGrid};

/// Cells lit by the torch for a single query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleTiles {
    center: Option<CellCoord>,
    radius: u32,
    cells: BTreeSet<CellCoord>,
}

impl VisibleTiles {
    /// Cell the torch was centred on, absent when it lies outside the grid.
    #[must_use]
    pub const fn center(&self) -> Option<CellCoord> {
        self.center
    }

    /// Manhattan radius used for the query.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Reports whether `cell` is lit.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Number of lit cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether nothing is lit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lit cells ordered by column, then row.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }
}

impl IntoIterator for VisibleTiles {
    type Item = CellCoord;
    type IntoIter = btree_set::IntoIter<CellCoord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// Computes the cells within Manhattan distance `radius` of `player`.
///
/// Only the `(2R + 1)²` box around the player is scanned, clipped to the
/// grid. A player outside the grid sees nothing.
#[must_use]
pub fn visible_tiles(grid: &MazeGrid, player: CellCoord, radius: u32) -> VisibleTiles {
    if !grid.contains(player) {
        return VisibleTiles {
            center: None,
            radius,
            cells: BTreeSet::new(),
        };
    }

    let last_column = grid.width().saturating_sub(1);
    let last_row = grid.height().saturating_sub(1);
    let columns = player.column().saturating_sub(radius)
        ..=player.column().saturating_add(radius).min(last_column);
    let mut cells = BTreeSet::new();

    for column in columns {
        let spent = column.abs_diff(player.column());
        let reach = radius - spent;
        let rows = player.row().saturating_sub(reach)
            ..=player.row().saturating_add(reach).min(last_row);
        for row in rows {
            let _ = cells.insert(CellCoord::new(column, row));
        }
    }

    VisibleTiles {
        center: Some(player),
        radius,
        cells,
    }
}

/// Number of cells in an unclipped diamond of the provided radius.
///
/// Saturates at `u64::MAX` for radii too large to count.
#[must_use]
pub const fn diamond_area(radius: u32) -> u64 {
    let radius = radius as u64;
    radius
        .saturating_mul(radius)
        .saturating_mul(2)
        .saturating_add(radius.saturating_mul(2))
        .saturating_add(1)
}
