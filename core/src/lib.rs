#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Torchlight maze engine.
//!
//! This crate defines the immutable maze grid, the coordinate and route
//! vocabulary, configuration values, and the message surface that connects
//! adapters with the authoritative session. Adapters submit [`Command`]
//! values, the session executes them via its `apply` entry point, and then
//! reports [`Event`] values describing what changed. Systems read the
//! [`MazeGrid`] through shared references only; nothing mutates a grid once
//! generation has finished.

mod config;
mod grid;

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

pub use config::{
    validate_dimensions, ConfigError, Difficulty, DifficultySettings, GameConfig, MAX_DIMENSION,
    MAX_ENEMIES, MIN_DIMENSION,
};
pub use grid::{CellState, GridBuilder, GridError, MazeGrid, Neighbors, TileState};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Torchlight: find the exit before the dark finds you.";

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player move a single cell in the given direction.
    MovePlayer {
        /// Direction of travel for the attempted move.
        direction: Direction,
    },
    /// Reports that external combat logic registered a hit on an enemy.
    RegisterHit {
        /// Identifier of the enemy that was struck.
        enemy: EnemyId,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that a player move was refused because the destination is not walkable.
    PlayerBlocked {
        /// Direction of the refused move.
        direction: Direction,
    },
    /// Announces that the player stepped onto the exit cell.
    ExitReached {
        /// Location of the exit.
        cell: CellCoord,
    },
    /// Reports that an enemy computed a fresh route toward the player.
    RouteComputed {
        /// Identifier of the enemy that planned the route.
        enemy: EnemyId,
        /// Player cell the route leads to.
        target: CellCoord,
        /// Number of single-cell steps contained in the route.
        steps: usize,
    },
    /// Reports that an enemy could not find a route and holds its position.
    PathNotFound {
        /// Identifier of the enemy that failed to plan.
        enemy: EnemyId,
        /// Player cell the failed request targeted.
        target: CellCoord,
    },
    /// Confirms that an enemy advanced between two adjacent cells.
    EnemyAdvanced {
        /// Identifier of the enemy that advanced.
        enemy: EnemyId,
        /// Cell occupied before moving.
        from: CellCoord,
        /// Cell occupied after moving.
        to: CellCoord,
    },
    /// Reports that an enemy stands on the player's cell.
    EnemyReachedPlayer {
        /// Identifier of the enemy that caught up with the player.
        enemy: EnemyId,
        /// Cell shared by the enemy and the player.
        cell: CellCoord,
    },
    /// Confirms that a registered hit defeated an enemy.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        enemy: EnemyId,
        /// Cell where the enemy was defeated.
        at: CellCoord,
    },
    /// Reports the cell a defeated enemy was relocated to.
    EnemyRespawned {
        /// Identifier of the relocated enemy.
        enemy: EnemyId,
        /// Cell the enemy now occupies.
        cell: CellCoord,
    },
    /// Announces that a respawning enemy resumed its pursuit.
    EnemyRecovered {
        /// Identifier of the enemy that became active again.
        enemy: EnemyId,
    },
    /// Reports that a hit could not be applied.
    HitRejected {
        /// Identifier named by the rejected hit.
        enemy: EnemyId,
        /// Specific reason the hit was refused.
        reason: HitRejection,
    },
}

/// Reasons a registered hit may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitRejection {
    /// No enemy with the provided identifier exists.
    UnknownEnemy,
    /// The enemy is still respawning from a previous defeat.
    NotAlive,
    /// The player has used every hit attempt granted by the difficulty.
    BudgetExhausted,
}

/// Cardinal movement directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the fixed iteration order used by all systems.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction that leads from `from` to the adjacent cell `to`, if they touch.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());

        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if to.row() > from.row() {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }
}

/// Unique identifier assigned to an enemy. Identity survives respawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Cell `distance` steps away in `direction`, or `None` when the
    /// coordinate would leave the representable range.
    #[must_use]
    pub fn offset(self, direction: Direction, distance: u32) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (Some(self.column), self.row.checked_sub(distance)),
            Direction::East => (self.column.checked_add(distance), Some(self.row)),
            Direction::South => (Some(self.column), self.row.checked_add(distance)),
            Direction::West => (self.column.checked_sub(distance), Some(self.row)),
        };
        Some(CellCoord::new(column?, row?))
    }

    /// Adjacent cell in `direction`.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        self.offset(direction, 1)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Search strategy used when planning a route across the maze.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Best-first search ordered by path cost plus Manhattan estimate.
    #[default]
    AStar,
    /// Breadth-first search; shortest routes on the unweighted grid.
    Bfs,
    /// Depth-first search; valid but not necessarily shortest routes.
    Dfs,
}

impl Strategy {
    /// Every strategy in declaration order.
    pub const ALL: [Strategy; 3] = [Strategy::AStar, Strategy::Bfs, Strategy::Dfs];

    /// Short lowercase label used by adapters and configuration files.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AStar => "a_star",
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown strategy label.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown pathfinding strategy `{0}` (expected a_star, bfs or dfs)")]
pub struct UnknownStrategy(String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a_star" | "astar" | "a*" => Ok(Self::AStar),
            "bfs" => Ok(Self::Bfs),
            "dfs" => Ok(Self::Dfs),
            _ => Err(UnknownStrategy(value.to_owned())),
        }
    }
}

/// Ordered sequence of adjacent walkable cells from a source to a target.
///
/// Both endpoints are included. An empty route means the source already
/// equals the target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    cells: Vec<CellCoord>,
}

impl Route {
    /// Creates a route from the provided cells.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Creates an empty route.
    #[must_use]
    pub const fn empty() -> Self {
        Self { cells: Vec::new() }
    }

    /// Cells visited by the route, source first.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells in the route, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the route contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of single-cell moves needed to follow the route.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// First cell of the route.
    #[must_use]
    pub fn source(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Last cell of the route.
    #[must_use]
    pub fn target(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Reports whether every cell is walkable on `grid` and each consecutive
    /// pair is 4-adjacent.
    #[must_use]
    pub fn is_valid_on(&self, grid: &MazeGrid) -> bool {
        self.cells.iter().all(|cell| grid.is_walkable(*cell))
            && self
                .cells
                .windows(2)
                .all(|pair| Direction::between(pair[0], pair[1]).is_some())
    }

    /// Consumes the route, yielding the underlying cells.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Lifecycle status of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyStatus {
    /// The enemy pursues the player.
    Alive,
    /// The enemy was defeated and waits at its respawn cell.
    Respawning {
        /// Time left before the enemy resumes its pursuit.
        remaining: Duration,
    },
}

impl EnemyStatus {
    /// Reports whether the enemy currently pursues the player.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Grid cell currently occupied by the enemy.
    pub cell: CellCoord,
    /// Next waypoint of the held route, if any.
    pub next_hop: Option<CellCoord>,
    /// Fraction of the way toward `next_hop`, in `[0, 1)`.
    pub progress: f32,
    /// Strategy the enemy plans with.
    pub strategy: Strategy,
    /// Movement speed in cells per second.
    pub speed: f32,
    /// Lifecycle status.
    pub status: EnemyStatus,
}
