use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use torchlight_core::{CellCoord, EnemyId, EnemyStatus, Event, MazeGrid, Strategy};
use torchlight_system_enemies::{defeat, tick, Enemy};
use torchlight_system_generation::generate;
use torchlight_system_pathfinding::distance_field;

const FRAME: Duration = Duration::from_millis(100);

#[test]
fn every_strategy_catches_a_stationary_player() {
    let grid = generate(21, 15, 5).expect("maze generates");
    let player = grid.start();

    for strategy in Strategy::ALL {
        let mut enemy = Enemy::new(EnemyId::new(0), grid.exit(), strategy, 4.0);
        let mut events = Vec::new();

        for _ in 0..1_000 {
            tick(&mut enemy, &grid, player, FRAME, &mut events);
            if enemy.cell() == player {
                break;
            }
        }

        assert_eq!(enemy.cell(), player, "{strategy} never arrived");
        let plans = events
            .iter()
            .filter(|event| matches!(event, Event::RouteComputed { .. }))
            .count();
        assert_eq!(plans, 1, "{strategy} replanned for a stationary player");
    }
}

#[test]
fn every_step_moves_to_an_adjacent_walkable_cell() {
    let grid = generate(25, 19, 8).expect("maze generates");
    let mut enemy = Enemy::new(EnemyId::new(1), grid.exit(), Strategy::Dfs, 7.5);
    let mut events = Vec::new();

    for _ in 0..50 {
        tick(&mut enemy, &grid, grid.start(), FRAME, &mut events);
    }

    for event in &events {
        if let Event::EnemyAdvanced { from, to, .. } = event {
            assert!(grid.is_walkable(*to));
            assert_eq!(from.manhattan_distance(*to), 1);
        }
    }
}

#[test]
fn defeated_enemy_respawns_far_away_then_resumes() {
    let grid = generate(20, 15, 42).expect("maze generates");
    let player = grid.start();
    let mut enemy = Enemy::new(EnemyId::new(2), grid.exit(), Strategy::AStar, 2.0);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let cell = defeat(
        &mut enemy,
        &grid,
        player,
        10,
        Duration::from_millis(500),
        &mut rng,
    );
    let field = distance_field(&grid, player);
    assert!(field.distance(cell).expect("reachable") >= 10);

    let mut events = Vec::new();
    for _ in 0..5 {
        tick(&mut enemy, &grid, player, FRAME, &mut events);
    }
    assert_eq!(
        events,
        vec![Event::EnemyRecovered {
            enemy: EnemyId::new(2)
        }]
    );
    assert_eq!(enemy.cell(), cell);

    events.clear();
    tick(&mut enemy, &grid, player, FRAME, &mut events);
    assert!(matches!(events.first(), Some(Event::RouteComputed { .. })));
}

#[test]
fn small_room_respawn_falls_back_to_farthest_lowest_corner() {
    let grid = MazeGrid::parse(
        "
        ###########
        #S........#
        #.........#
        #.........#
        #.........#
        #.........#
        #.........#
        #.........#
        #.........#
        #........E#
        ###########
        ",
    )
    .expect("layout parses");
    let player = CellCoord::new(5, 5);
    let mut enemy = Enemy::new(EnemyId::new(3), CellCoord::new(6, 5), Strategy::Bfs, 1.0);

    let cells: Vec<CellCoord> = (0..16)
        .map(|seed| {
            let mut candidate = enemy.clone();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            defeat(&mut candidate, &grid, player, 10, Duration::from_millis(500), &mut rng)
        })
        .collect();
    assert!(cells.iter().all(|cell| *cell == CellCoord::new(1, 1)));

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let _ = defeat(&mut enemy, &grid, player, 10, Duration::from_millis(500), &mut rng);
    assert_eq!(enemy.cell(), CellCoord::new(1, 1));
    assert!(matches!(enemy.status(), EnemyStatus::Respawning { .. }));
}
