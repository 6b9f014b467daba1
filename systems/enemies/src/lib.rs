#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy pursuit: route upkeep, movement along the route, and respawning.
//!
//! Each enemy owns its route. Routes are replanned only when the enemy holds
//! none or the player has changed cell since the last plan, and movement
//! budget that does not add up to a whole cell is carried between ticks.

mod respawn;

use std::{collections::VecDeque, time::Duration};

use log::{debug, warn};
use torchlight_core::{
    CellCoord, EnemyId, EnemySnapshot, EnemyStatus, Event, MazeGrid, Route, Strategy,
};
use torchlight_system_pathfinding::find_path;

pub use respawn::{defeat, respawn_cell};

/// Mutable state of a single pursuing enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    id: EnemyId,
    cell: CellCoord,
    strategy: Strategy,
    speed: f32,
    status: EnemyStatus,
    waypoints: VecDeque<CellCoord>,
    route_target: Option<CellCoord>,
    progress: f32,
}

impl Enemy {
    /// Creates an active enemy standing on `cell`.
    #[must_use]
    pub fn new(id: EnemyId, cell: CellCoord, strategy: Strategy, speed: f32) -> Self {
        Self {
            id,
            cell,
            strategy,
            speed,
            status: EnemyStatus::Alive,
            waypoints: VecDeque::new(),
            route_target: None,
            progress: 0.0,
        }
    }

    /// Identifier of the enemy. Survives respawns.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Cell the enemy occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Strategy the enemy plans routes with.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Movement speed in cells per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> EnemyStatus {
        self.status
    }

    /// Fraction of the way toward the next waypoint.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Next cell on the held route.
    #[must_use]
    pub fn next_hop(&self) -> Option<CellCoord> {
        self.waypoints.front().copied()
    }

    /// Player cell the held route was planned toward.
    #[must_use]
    pub const fn route_target(&self) -> Option<CellCoord> {
        self.route_target
    }

    /// Remaining route starting at the enemy's cell. Empty when the enemy
    /// holds no waypoints.
    #[must_use]
    pub fn route(&self) -> Route {
        if self.waypoints.is_empty() {
            return Route::empty();
        }
        let mut cells = Vec::with_capacity(self.waypoints.len() + 1);
        cells.push(self.cell);
        cells.extend(self.waypoints.iter().copied());
        Route::new(cells)
    }

    /// Read-only view used by queries and renderers.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            cell: self.cell,
            next_hop: self.next_hop(),
            progress: self.progress,
            strategy: self.strategy,
            speed: self.speed,
            status: self.status,
        }
    }

    fn forget_route(&mut self) {
        self.waypoints.clear();
        self.route_target = None;
        self.progress = 0.0;
    }

    fn needs_route(&self, player: CellCoord) -> bool {
        self.route_target != Some(player)
    }

    fn replan(&mut self, grid: &MazeGrid, player: CellCoord, out: &mut Vec<Event>) -> bool {
        let previous_hop = self.next_hop();

        match find_path(grid, self.cell, player, self.strategy) {
            Ok(route) => {
                let steps = route.steps();
                self.waypoints = route.into_vec().into_iter().skip(1).collect();
                self.route_target = Some(player);
                if self.next_hop() != previous_hop {
                    self.progress = 0.0;
                }
                debug!(
                    "enemy {} planned {steps} steps toward {player} with {}",
                    self.id.get(),
                    self.strategy
                );
                out.push(Event::RouteComputed {
                    enemy: self.id,
                    target: player,
                    steps,
                });
                true
            }
            Err(error) => {
                warn!("enemy {} holds position: {error}", self.id.get());
                self.forget_route();
                out.push(Event::PathNotFound {
                    enemy: self.id,
                    target: player,
                });
                false
            }
        }
    }
}

/// Advances `enemy` by `dt` toward the player.
///
/// Respawning enemies count down their delay without moving. Active enemies
/// replan when needed, then walk `speed × dt` cells along their route. An
/// enemy that cannot plan holds its position and retries on the next tick.
pub fn tick(
    enemy: &mut Enemy,
    grid: &MazeGrid,
    player: CellCoord,
    dt: Duration,
    out: &mut Vec<Event>,
) {
    if let EnemyStatus::Respawning { remaining } = enemy.status {
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            enemy.status = EnemyStatus::Alive;
            out.push(Event::EnemyRecovered { enemy: enemy.id });
        } else {
            enemy.status = EnemyStatus::Respawning { remaining };
        }
        return;
    }

    if enemy.needs_route(player) && !enemy.replan(grid, player, out) {
        return;
    }

    let mut budget = enemy.progress + enemy.speed * dt.as_secs_f32();
    if !budget.is_finite() || budget < 0.0 {
        budget = 0.0;
    }

    while budget >= 1.0 {
        let Some(next) = enemy.waypoints.pop_front() else {
            break;
        };
        let from = enemy.cell;
        enemy.cell = next;
        budget -= 1.0;
        out.push(Event::EnemyAdvanced {
            enemy: enemy.id,
            from,
            to: next,
        });
    }

    enemy.progress = if enemy.waypoints.is_empty() {
        0.0
    } else {
        budget.min(1.0)
    };

    if enemy.cell == player {
        out.push(Event::EnemyReachedPlayer {
            enemy: enemy.id,
            cell: player,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = "
        #########
        #S.....E#
        #########
    ";

    fn corridor() -> MazeGrid {
        MazeGrid::parse(CORRIDOR).expect("layout parses")
    }

    fn advanced(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, Event::EnemyAdvanced { .. }))
            .count()
    }

    #[test]
    fn first_tick_plans_then_moves_speed_times_dt() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(0), grid.exit(), Strategy::Bfs, 2.0);
        let mut events = Vec::new();

        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);

        assert_eq!(
            events,
            vec![
                Event::RouteComputed {
                    enemy: EnemyId::new(0),
                    target: grid.start(),
                    steps: 6,
                },
                Event::EnemyAdvanced {
                    enemy: EnemyId::new(0),
                    from: CellCoord::new(7, 1),
                    to: CellCoord::new(6, 1),
                },
                Event::EnemyAdvanced {
                    enemy: EnemyId::new(0),
                    from: CellCoord::new(6, 1),
                    to: CellCoord::new(5, 1),
                },
            ]
        );
        assert_eq!(enemy.cell(), CellCoord::new(5, 1));
        assert_eq!(enemy.next_hop(), Some(CellCoord::new(4, 1)));
    }

    #[test]
    fn fractional_budget_carries_between_ticks() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(0), grid.exit(), Strategy::AStar, 1.0);
        let mut events = Vec::new();
        let quarter = Duration::from_millis(250);

        for _ in 0..3 {
            tick(&mut enemy, &grid, grid.start(), quarter, &mut events);
        }
        assert_eq!(advanced(&events), 0);
        assert_eq!(enemy.progress(), 0.75);

        tick(&mut enemy, &grid, grid.start(), quarter, &mut events);
        assert_eq!(advanced(&events), 1);
        assert_eq!(enemy.cell(), CellCoord::new(6, 1));
        assert_eq!(enemy.progress(), 0.0);
    }

    #[test]
    fn route_is_kept_while_player_stays_put() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(1), grid.exit(), Strategy::Dfs, 1.0);
        let mut events = Vec::new();

        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);
        events.clear();
        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);

        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::RouteComputed { .. })));
        assert_eq!(enemy.cell(), CellCoord::new(5, 1));
    }

    #[test]
    fn player_moving_triggers_replan() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(1), grid.exit(), Strategy::AStar, 1.0);
        let mut events = Vec::new();

        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);
        events.clear();
        let player = CellCoord::new(2, 1);
        tick(&mut enemy, &grid, player, Duration::from_secs(1), &mut events);

        assert_eq!(
            events.first(),
            Some(&Event::RouteComputed {
                enemy: EnemyId::new(1),
                target: player,
                steps: 4,
            })
        );
        assert_eq!(enemy.route_target(), Some(player));
        assert_eq!(enemy.route().steps(), 3);
    }

    #[test]
    fn unreachable_player_leaves_enemy_in_place() {
        let grid = MazeGrid::parse(
            "
            #######
            #S.#.E#
            #######
            ",
        )
        .expect("layout parses");
        let mut enemy = Enemy::new(EnemyId::new(2), grid.exit(), Strategy::Bfs, 4.0);
        let mut events = Vec::new();

        for _ in 0..2 {
            tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);
        }

        let not_found = Event::PathNotFound {
            enemy: EnemyId::new(2),
            target: grid.start(),
        };
        assert_eq!(events, vec![not_found.clone(), not_found]);
        assert_eq!(enemy.cell(), grid.exit());
        assert_eq!(enemy.route(), Route::empty());
    }

    #[test]
    fn arrival_is_reported() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(3), CellCoord::new(3, 1), Strategy::Bfs, 5.0);
        let mut events = Vec::new();

        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);

        assert_eq!(enemy.cell(), grid.start());
        assert_eq!(enemy.progress(), 0.0);
        assert_eq!(
            events.last(),
            Some(&Event::EnemyReachedPlayer {
                enemy: EnemyId::new(3),
                cell: grid.start(),
            })
        );
    }

    #[test]
    fn respawning_enemy_waits_out_its_delay() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(4), grid.exit(), Strategy::Bfs, 3.0);
        enemy.status = EnemyStatus::Respawning {
            remaining: Duration::from_millis(500),
        };
        let mut events = Vec::new();

        tick(&mut enemy, &grid, grid.start(), Duration::from_millis(300), &mut events);
        assert!(events.is_empty());
        assert_eq!(
            enemy.status(),
            EnemyStatus::Respawning {
                remaining: Duration::from_millis(200)
            }
        );

        tick(&mut enemy, &grid, grid.start(), Duration::from_millis(200), &mut events);
        assert_eq!(
            events,
            vec![Event::EnemyRecovered {
                enemy: EnemyId::new(4)
            }]
        );
        assert_eq!(enemy.cell(), grid.exit());
        assert!(enemy.status().is_alive());
    }

    #[test]
    fn snapshot_reflects_state() {
        let grid = corridor();
        let mut enemy = Enemy::new(EnemyId::new(5), grid.exit(), Strategy::AStar, 0.5);
        let mut events = Vec::new();
        tick(&mut enemy, &grid, grid.start(), Duration::from_secs(1), &mut events);

        let snapshot = enemy.snapshot();
        assert_eq!(snapshot.id, EnemyId::new(5));
        assert_eq!(snapshot.cell, grid.exit());
        assert_eq!(snapshot.next_hop, Some(CellCoord::new(6, 1)));
        assert_eq!(snapshot.progress, 0.5);
        assert_eq!(snapshot.status, EnemyStatus::Alive);
    }
}
