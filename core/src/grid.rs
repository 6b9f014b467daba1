//! Dense maze grid and the builder used while carving it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction};

const WALL_GLYPH: char = '#';
const PATH_GLYPH: char = '.';
const START_GLYPH: char = 'S';
const EXIT_GLYPH: char = 'E';

/// Binary tile state stored for every in-bounds cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Solid rock that blocks movement.
    Wall,
    /// Carved corridor that can be walked on.
    Path,
}

/// Result of querying an arbitrary coordinate against the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    /// The cell is a wall.
    Wall,
    /// The cell is a carved path.
    Path,
    /// The coordinate lies outside the grid.
    OutOfBounds,
}

impl From<TileState> for CellState {
    fn from(tile: TileState) -> Self {
        match tile {
            TileState::Wall => Self::Wall,
            TileState::Path => Self::Path,
        }
    }
}

/// Reasons a grid could not be assembled.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The layout contained no rows.
    #[error("layout is empty")]
    Empty,
    /// A layout row differs in length from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width established by the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A layout character is not one of `#`, `.`, `S` or `E`.
    #[error("unknown glyph {glyph:?} at {cell}")]
    UnknownGlyph {
        /// Character that could not be interpreted.
        glyph: char,
        /// Location of the character.
        cell: CellCoord,
    },
    /// The layout marks no start cell or more than one.
    #[error("layout must mark exactly one start cell, found {0}")]
    StartCount(usize),
    /// The layout marks no exit cell or more than one.
    #[error("layout must mark exactly one exit cell, found {0}")]
    ExitCount(usize),
    /// A start or exit cell lies outside the grid.
    #[error("endpoint {0} lies outside the grid")]
    EndpointOutOfBounds(CellCoord),
    /// A start or exit cell is a wall.
    #[error("endpoint {0} is not a carved path")]
    EndpointNotWalkable(CellCoord),
    /// The grid dimensions do not fit in memory.
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
}

/// Immutable maze grid with a designated start and exit.
///
/// Tiles are stored row-major. The only way to obtain a grid is through
/// [`GridBuilder::finish`] or [`MazeGrid::parse`], both of which check that
/// the start and exit are in-bounds paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileState>,
    start: CellCoord,
    exit: CellCoord,
}

impl MazeGrid {
    /// Parses a textual layout using `#` for walls, `.` for paths, `S` for
    /// the start and `E` for the exit. Leading and trailing blank lines and
    /// surrounding whitespace on each row are ignored.
    pub fn parse(layout: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };

        let width = count_u32(first.chars().count())?;
        let height = count_u32(rows.len())?;
        let mut builder = GridBuilder::new(width, height);
        let mut starts = Vec::new();
        let mut exits = Vec::new();

        for (row_index, line) in rows.iter().enumerate() {
            let row = count_u32(row_index)?;
            let found = count_u32(line.chars().count())?;
            if found != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            for (column_index, glyph) in line.chars().enumerate() {
                let cell = CellCoord::new(count_u32(column_index)?, row);
                match glyph {
                    WALL_GLYPH => {}
                    PATH_GLYPH => {
                        let _ = builder.carve(cell);
                    }
                    START_GLYPH => {
                        let _ = builder.carve(cell);
                        starts.push(cell);
                    }
                    EXIT_GLYPH => {
                        let _ = builder.carve(cell);
                        exits.push(cell);
                    }
                    _ => return Err(GridError::UnknownGlyph { glyph, cell }),
                }
            }
        }

        let [start] = starts.as_slice() else {
            return Err(GridError::StartCount(starts.len()));
        };
        let [exit] = exits.as_slice() else {
            return Err(GridError::ExitCount(exits.len()));
        };

        builder.finish(*start, *exit)
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell where the player begins.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        self.start
    }

    /// Cell the player must reach to leave the maze.
    #[must_use]
    pub const fn exit(&self) -> CellCoord {
        self.exit
    }

    /// Total number of cells, walls included.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// State of the provided coordinate, including out-of-bounds queries.
    #[must_use]
    pub fn cell_state(&self, cell: CellCoord) -> CellState {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
            .map_or(CellState::OutOfBounds, CellState::from)
    }

    /// Reports whether the cell is an in-bounds path.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.cell_state(cell) == CellState::Path
    }

    /// In-bounds orthogonal neighbours in North, East, South, West order.
    #[must_use]
    pub fn neighbors4(&self, cell: CellCoord) -> Neighbors {
        Neighbors::around(cell, self.width, self.height)
    }

    /// Walkable orthogonal neighbours in North, East, South, West order.
    pub fn walkable_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.neighbors4(cell)
            .filter(move |neighbor| self.is_walkable(*neighbor))
    }

    /// Iterator over every walkable cell in row-major order.
    pub fn walkable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == TileState::Path)
            .filter_map(|(index, _)| self.cell_at(index))
    }

    /// Dense row-major offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        dense_index(cell, self.width, self.height)
    }

    /// Coordinate stored at the provided dense offset.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.width).ok()?;
        if width == 0 || index >= self.tiles.len() {
            return None;
        }
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }
}

impl fmt::Display for MazeGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for column in 0..self.width {
                let cell = CellCoord::new(column, row);
                let glyph = if cell == self.start {
                    START_GLYPH
                } else if cell == self.exit {
                    EXIT_GLYPH
                } else if self.is_walkable(cell) {
                    PATH_GLYPH
                } else {
                    WALL_GLYPH
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Mutable carving surface that becomes a [`MazeGrid`] once finished.
///
/// Every cell starts as a wall. Carving is one-way: the builder never turns
/// a path back into a wall.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    width: u32,
    height: u32,
    tiles: Vec<TileState>,
}

impl GridBuilder {
    /// Creates a builder of the provided size filled with walls.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![TileState::Wall; capacity],
        }
    }

    /// Number of columns in the grid under construction.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid under construction.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile stored at the cell, if it lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileState> {
        dense_index(cell, self.width, self.height).and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the cell is an in-bounds path.
    #[must_use]
    pub fn is_path(&self, cell: CellCoord) -> bool {
        self.tile(cell) == Some(TileState::Path)
    }

    /// Reports whether the cell is an in-bounds wall.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.tile(cell) == Some(TileState::Wall)
    }

    /// Reports whether the cell lies strictly inside the outer border.
    #[must_use]
    pub const fn is_interior(&self, cell: CellCoord) -> bool {
        cell.column() > 0
            && cell.row() > 0
            && cell.column() < self.width.saturating_sub(1)
            && cell.row() < self.height.saturating_sub(1)
    }

    /// Turns the cell into a path. Returns `true` when the tile changed.
    pub fn carve(&mut self, cell: CellCoord) -> bool {
        let Some(index) = dense_index(cell, self.width, self.height) else {
            return false;
        };
        match self.tiles.get_mut(index) {
            Some(tile) if *tile == TileState::Wall => {
                *tile = TileState::Path;
                true
            }
            _ => false,
        }
    }

    /// In-bounds orthogonal neighbours in North, East, South, West order.
    #[must_use]
    pub fn neighbors4(&self, cell: CellCoord) -> Neighbors {
        Neighbors::around(cell, self.width, self.height)
    }

    /// Seals the grid, checking that both endpoints are in-bounds paths.
    pub fn finish(self, start: CellCoord, exit: CellCoord) -> Result<MazeGrid, GridError> {
        let expected = u64::from(self.width) * u64::from(self.height);
        if usize::try_from(expected).ok() != Some(self.tiles.len()) {
            return Err(GridError::TooLarge {
                width: self.width,
                height: self.height,
            });
        }

        for endpoint in [start, exit] {
            match self.tile(endpoint) {
                None => return Err(GridError::EndpointOutOfBounds(endpoint)),
                Some(TileState::Wall) => return Err(GridError::EndpointNotWalkable(endpoint)),
                Some(TileState::Path) => {}
            }
        }

        Ok(MazeGrid {
            width: self.width,
            height: self.height,
            tiles: self.tiles,
            start,
            exit,
        })
    }
}

/// Iterator over the in-bounds orthogonal neighbours of a cell.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn around(cell: CellCoord, width: u32, height: u32) -> Self {
        let mut neighbors = Self::default();
        for direction in Direction::ALL {
            if let Some(candidate) = cell.step(direction) {
                if candidate.column() < width && candidate.row() < height {
                    neighbors.push(candidate);
                }
            }
        }
        neighbors
    }

    fn push(&mut self, cell: CellCoord) {
        if let Some(slot) = self.buffer.get_mut(self.len) {
            *slot = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer.get(self.cursor).copied().flatten();
        self.cursor += 1;
        value
    }
}

fn dense_index(cell: CellCoord, width: u32, height: u32) -> Option<usize> {
    if cell.column() >= width || cell.row() >= height {
        return None;
    }
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let width = usize::try_from(width).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

fn count_u32(value: usize) -> Result<u32, GridError> {
    u32::try_from(value).map_err(|_| GridError::TooLarge {
        width: u32::MAX,
        height: u32::MAX,
    })
}
