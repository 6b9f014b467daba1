//! Relocation of defeated enemies away from the player.

use std::time::Duration;

use log::info;
use rand::Rng;
use torchlight_core::{CellCoord, EnemyStatus, MazeGrid};
use torchlight_system_pathfinding::distance_field;

use crate::Enemy;

/// Picks a walkable cell at least `threshold` corridor steps from `player`.
///
/// Qualifying cells are sorted by column, then row, and one is drawn with
/// `rng`. When no cell is far enough the farthest reachable cell is used,
/// preferring the lowest column and then the lowest row among equals; this
/// fallback consumes no randomness. Returns `None` only when the player
/// stands on a cell with no walkable connection at all, a wall included.
pub fn respawn_cell<R>(
    grid: &MazeGrid,
    player: CellCoord,
    threshold: u32,
    rng: &mut R,
) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    let field = distance_field(grid, player);
    let mut qualifying: Vec<CellCoord> = field
        .reachable()
        .filter(|(_, distance)| *distance >= threshold)
        .map(|(cell, _)| cell)
        .collect();

    if !qualifying.is_empty() {
        qualifying.sort_unstable();
        let choice = rng.gen_range(0..qualifying.len());
        return qualifying.get(choice).copied();
    }

    field
        .reachable()
        .min_by(|(left, left_distance), (right, right_distance)| {
            right_distance.cmp(left_distance).then(left.cmp(right))
        })
        .map(|(cell, _)| cell)
}

/// Defeats `enemy`, moving it to a respawn cell and starting its delay.
///
/// The enemy drops its route and stays still until `delay` has elapsed.
/// Returns the cell it now occupies; when no respawn cell exists the enemy
/// stays where it was defeated.
pub fn defeat<R>(
    enemy: &mut Enemy,
    grid: &MazeGrid,
    player: CellCoord,
    threshold: u32,
    delay: Duration,
    rng: &mut R,
) -> CellCoord
where
    R: Rng + ?Sized,
{
    let defeated_at = enemy.cell;
    let cell = respawn_cell(grid, player, threshold, rng).unwrap_or(defeated_at);

    enemy.cell = cell;
    enemy.forget_route();
    enemy.status = if delay.is_zero() {
        EnemyStatus::Alive
    } else {
        EnemyStatus::Respawning { remaining: delay }
    };

    info!(
        "enemy {} defeated at {defeated_at}, respawning at {cell} in {}ms",
        enemy.id.get(),
        delay.as_millis()
    );
    cell
}
