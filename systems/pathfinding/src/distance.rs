//! Breadth-first graph distances from a single origin.

use std::collections::VecDeque;

use torchlight_core::{CellCoord, MazeGrid};

const UNREACHED: u32 = u32::MAX;

/// Dense corridor distances measured from one origin cell.
///
/// Distances count steps through walkable cells only. Walls and cells cut
/// off from the origin have no distance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceField {
    origin: CellCoord,
    width: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Cell the distances were measured from.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Steps between the origin and `cell`, if it can be reached.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        let offset = self.offset(cell)?;
        self.distances
            .get(offset)
            .copied()
            .filter(|distance| *distance != UNREACHED)
    }

    /// Reachable cells paired with their distance, in row-major order.
    pub fn reachable(&self) -> impl Iterator<Item = (CellCoord, u32)> + '_ {
        let width = self.width.max(1);
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, distance)| **distance != UNREACHED)
            .filter_map(move |(offset, distance)| {
                let offset = u32::try_from(offset).ok()?;
                Some((CellCoord::new(offset % width, offset / width), *distance))
            })
    }

    /// Largest distance found, or `None` when nothing is reachable.
    #[must_use]
    pub fn max_distance(&self) -> Option<u32> {
        self.reachable().map(|(_, distance)| distance).max()
    }

    fn offset(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.width {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Measures the corridor distance from `origin` to every reachable cell.
///
/// A wall or out-of-bounds origin yields a field with no reachable cells.
#[must_use]
pub fn distance_field(grid: &MazeGrid, origin: CellCoord) -> DistanceField {
    let mut field = DistanceField {
        origin,
        width: grid.width(),
        distances: vec![UNREACHED; grid.cell_count()],
    };

    if !grid.is_walkable(origin) {
        return field;
    }

    let mut queue = VecDeque::new();
    if let Some(slot) = grid.index(origin).and_then(|index| field.distances.get_mut(index)) {
        *slot = 0;
        queue.push_back(origin);
    }

    while let Some(cell) = queue.pop_front() {
        let Some(current) = grid
            .index(cell)
            .and_then(|index| field.distances.get(index).copied())
        else {
            continue;
        };
        let next = current.saturating_add(1);

        for neighbor in grid.walkable_neighbors(cell) {
            let Some(slot) = grid
                .index(neighbor)
                .and_then(|index| field.distances.get_mut(index))
            else {
                continue;
            };
            if *slot <= next {
                continue;
            }
            *slot = next;
            queue.push_back(neighbor);
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances_follow_corridors_not_straight_lines() {
        let grid = MazeGrid::parse(
            "
            #####
            #S#E#
            #.#.#
            #...#
            #####
            ",
        )
        .expect("layout parses");

        let field = distance_field(&grid, grid.start());

        assert_eq!(field.origin(), CellCoord::new(1, 1));
        assert_eq!(field.distance(grid.start()), Some(0));
        assert_eq!(field.distance(grid.exit()), Some(6));
        assert_eq!(field.distance(CellCoord::new(2, 1)), None);
        assert_eq!(field.distance(CellCoord::new(9, 9)), None);
        assert_eq!(field.max_distance(), Some(6));
    }

    #[test]
    fn reachable_cells_are_listed_in_row_major_order() {
        let grid = MazeGrid::parse(
            "
            #####
            #S.E#
            #####
            ",
        )
        .expect("layout parses");

        let cells: Vec<_> = distance_field(&grid, grid.exit()).reachable().collect();

        assert_eq!(
            cells,
            vec![
                (CellCoord::new(1, 1), 2),
                (CellCoord::new(2, 1), 1),
                (CellCoord::new(3, 1), 0),
            ]
        );
    }

    #[test]
    fn wall_origin_reaches_nothing() {
        let grid = MazeGrid::parse(
            "
            ####
            #SE#
            ####
            ",
        )
        .expect("layout parses");

        let field = distance_field(&grid, CellCoord::new(0, 0));

        assert_eq!(field.reachable().count(), 0);
        assert_eq!(field.max_distance(), None);
    }
}
