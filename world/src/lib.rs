#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for a Torchlight level.
//!
//! A [`Session`] owns the generated maze, the player, the enemies and the
//! random stream used to place them. Adapters mutate it only through
//! [`apply`] and read it through the [`query`] module.

use std::time::Duration;

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use torchlight_core::{
    CellCoord, Command, ConfigError, DifficultySettings, Direction, EnemyId, Event, GameConfig,
    HitRejection, MazeGrid, WELCOME_BANNER,
};
use torchlight_system_enemies::{defeat, respawn_cell, tick, Enemy};
use torchlight_system_generation::{generate, GenerationError};

/// Offset applied to the maze seed for the enemy placement stream.
const ENEMY_STREAM_OFFSET: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Failures that prevent a session from starting.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The configuration holds values the engine cannot use.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Maze generation failed.
    #[error("maze generation failed: {0}")]
    Generation(#[from] GenerationError),
}

#[derive(Clone, Debug)]
struct Player {
    cell: CellCoord,
    facing: Direction,
}

/// Explicit game context for a single level.
#[derive(Clone, Debug)]
pub struct Session {
    banner: &'static str,
    config: GameConfig,
    settings: DifficultySettings,
    grid: MazeGrid,
    player: Player,
    enemies: Vec<Enemy>,
    rng: ChaCha8Rng,
    hits_remaining: u32,
    exit_reached: bool,
    tick_index: u64,
}

impl Session {
    /// Validates `config`, generates the maze and places every actor.
    ///
    /// The player starts on the maze start cell. Enemies are placed with the
    /// respawn policy, so each begins at least the configured respawn
    /// distance away when the maze allows it.
    pub fn new(config: GameConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let grid = generate(config.width, config.height, config.seed)?;
        let settings = config.difficulty_settings();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(ENEMY_STREAM_OFFSET));
        let player = Player {
            cell: grid.start(),
            facing: Direction::East,
        };

        let mut enemies = Vec::new();
        for index in 0..settings.enemy_count {
            let cell = respawn_cell(&grid, player.cell, config.respawn_distance, &mut rng)
                .unwrap_or(grid.exit());
            let strategy = settings.strategy_for(enemies.len());
            enemies.push(Enemy::new(
                EnemyId::new(index),
                cell,
                strategy,
                settings.enemy_speed,
            ));
        }

        info!(
            "session ready: {}x{} maze, seed {:#x}, {:?} difficulty, {} enemies",
            config.width,
            config.height,
            config.seed,
            config.difficulty,
            enemies.len()
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            hits_remaining: settings.hit_attempts,
            settings,
            config,
            grid,
            player,
            enemies,
            rng,
            exit_reached: false,
            tick_index: 0,
        })
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        if self.exit_reached {
            return;
        }

        for enemy in &mut self.enemies {
            tick(enemy, &self.grid, self.player.cell, dt, out_events);
        }
    }

    fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.exit_reached {
            return;
        }

        self.player.facing = direction;
        let from = self.player.cell;
        let Some(to) = from
            .step(direction)
            .filter(|cell| self.grid.is_walkable(*cell))
        else {
            out_events.push(Event::PlayerBlocked { direction });
            return;
        };

        self.player.cell = to;
        out_events.push(Event::PlayerMoved { from, to });

        if to == self.grid.exit() {
            self.exit_reached = true;
            info!("player reached the exit at {to} after {} ticks", self.tick_index);
            out_events.push(Event::ExitReached { cell: to });
        }
    }

    fn register_hit(&mut self, enemy_id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(remaining) = self.hits_remaining.checked_sub(1) else {
            out_events.push(Event::HitRejected {
                enemy: enemy_id,
                reason: HitRejection::BudgetExhausted,
            });
            return;
        };
        self.hits_remaining = remaining;

        let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id() == enemy_id) else {
            out_events.push(Event::HitRejected {
                enemy: enemy_id,
                reason: HitRejection::UnknownEnemy,
            });
            return;
        };
        if !enemy.status().is_alive() {
            out_events.push(Event::HitRejected {
                enemy: enemy_id,
                reason: HitRejection::NotAlive,
            });
            return;
        }

        let at = enemy.cell();
        let cell = defeat(
            enemy,
            &self.grid,
            self.player.cell,
            self.config.respawn_distance,
            self.config.respawn_delay(),
            &mut self.rng,
        );
        out_events.push(Event::EnemyDefeated { enemy: enemy_id, at });
        out_events.push(Event::EnemyRespawned {
            enemy: enemy_id,
            cell,
        });
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => session.advance(dt, out_events),
        Command::MovePlayer { direction } => session.move_player(direction, out_events),
        Command::RegisterHit { enemy } => session.register_hit(enemy, out_events),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use torchlight_core::{
        CellCoord, DifficultySettings, Direction, EnemyId, EnemySnapshot, GameConfig, MazeGrid,
        Route,
    };
    use torchlight_system_visibility::VisibleTiles;

    use super::Session;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(session: &Session) -> &'static str {
        session.banner
    }

    /// Configuration the session was created from.
    #[must_use]
    pub fn config(session: &Session) -> &GameConfig {
        &session.config
    }

    /// Enemy tuning in effect for the session.
    #[must_use]
    pub fn difficulty_settings(session: &Session) -> &DifficultySettings {
        &session.settings
    }

    /// Provides read-only access to the maze.
    #[must_use]
    pub fn grid(session: &Session) -> &MazeGrid {
        &session.grid
    }

    /// Cell the player occupies.
    #[must_use]
    pub fn player_cell(session: &Session) -> CellCoord {
        session.player.cell
    }

    /// Direction of the player's most recent move attempt.
    #[must_use]
    pub fn player_facing(session: &Session) -> Direction {
        session.player.facing
    }

    /// Snapshots of every enemy ordered by identifier.
    #[must_use]
    pub fn enemies(session: &Session) -> Vec<EnemySnapshot> {
        let mut snapshots: Vec<EnemySnapshot> =
            session.enemies.iter().map(|enemy| enemy.snapshot()).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Snapshot of a single enemy.
    #[must_use]
    pub fn enemy(session: &Session, id: EnemyId) -> Option<EnemySnapshot> {
        session
            .enemies
            .iter()
            .find(|enemy| enemy.id() == id)
            .map(|enemy| enemy.snapshot())
    }

    /// Remaining route held by an enemy, starting at its cell.
    #[must_use]
    pub fn enemy_route(session: &Session, id: EnemyId) -> Option<Route> {
        session
            .enemies
            .iter()
            .find(|enemy| enemy.id() == id)
            .map(|enemy| enemy.route())
    }

    /// Cells lit by the player's torch this frame.
    #[must_use]
    pub fn visible_tiles(session: &Session) -> VisibleTiles {
        torchlight_system_visibility::visible_tiles(
            &session.grid,
            session.player.cell,
            session.config.vision_radius,
        )
    }

    /// Hit attempts the player has left.
    #[must_use]
    pub fn hits_remaining(session: &Session) -> u32 {
        session.hits_remaining
    }

    /// Reports whether the player has reached the exit.
    #[must_use]
    pub fn exit_reached(session: &Session) -> bool {
        session.exit_reached
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(session: &Session) -> u64 {
        session.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torchlight_core::{Difficulty, EnemyStatus, Strategy};
    use torchlight_system_pathfinding::distance_field;

    fn session_with(config: GameConfig) -> Session {
        Session::new(config).expect("session starts")
    }

    fn normal_session() -> Session {
        session_with(GameConfig {
            seed: 42,
            ..GameConfig::default()
        })
    }

    #[test]
    fn new_session_places_player_on_start() {
        let session = normal_session();

        assert_eq!(query::player_cell(&session), query::grid(&session).start());
        assert_eq!(query::welcome_banner(&session), WELCOME_BANNER);
        assert_eq!(query::hits_remaining(&session), 7);
        assert_eq!(query::tick_index(&session), 0);
        assert!(!query::exit_reached(&session));
    }

    #[test]
    fn enemies_start_far_from_player_with_round_robin_strategies() {
        let session = session_with(GameConfig {
            seed: 42,
            difficulty: Difficulty::Hard,
            ..GameConfig::default()
        });
        let field = distance_field(query::grid(&session), query::player_cell(&session));
        let enemies = query::enemies(&session);

        assert_eq!(enemies.len(), 3);
        let strategies: Vec<_> = enemies.iter().map(|enemy| enemy.strategy).collect();
        assert_eq!(strategies, vec![Strategy::AStar, Strategy::Bfs, Strategy::Dfs]);
        for enemy in &enemies {
            assert!(field.distance(enemy.cell).expect("reachable") >= 10);
            assert_eq!(enemy.speed, 3.0);
            assert_eq!(enemy.status, EnemyStatus::Alive);
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_generation() {
        let error = Session::new(GameConfig {
            width: 1,
            ..GameConfig::default()
        })
        .expect_err("degenerate width");

        assert_eq!(error, SessionError::Config(ConfigError::InvalidWidth(1)));

        let error = Session::new(GameConfig {
            enemies: Some(DifficultySettings {
                enemy_count: u32::MAX,
                ..DifficultySettings::preset(Difficulty::Hard)
            }),
            ..GameConfig::default()
        })
        .expect_err("enemy count capped");

        assert_eq!(
            error,
            SessionError::Config(ConfigError::TooManyEnemies(u32::MAX))
        );
    }

    #[test]
    fn blocked_moves_are_reported_and_turn_the_player() {
        let mut session = normal_session();
        let mut events = Vec::new();

        apply(
            &mut session,
            Command::MovePlayer {
                direction: Direction::North,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PlayerBlocked {
                direction: Direction::North
            }]
        );
        assert_eq!(query::player_facing(&session), Direction::North);
        assert_eq!(query::player_cell(&session), query::grid(&session).start());
    }

    #[test]
    fn ticks_advance_clock_and_enemies() {
        let mut session = normal_session();
        let mut events = Vec::new();

        apply(
            &mut session,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );

        assert_eq!(
            events.first(),
            Some(&Event::TimeAdvanced {
                dt: Duration::from_millis(500)
            })
        );
        let plans = events
            .iter()
            .filter(|event| matches!(event, Event::RouteComputed { .. }))
            .count();
        assert_eq!(plans, 2);
        assert_eq!(query::tick_index(&session), 1);
        for enemy in query::enemies(&session) {
            let route = query::enemy_route(&session, enemy.id).expect("enemy exists");
            assert_eq!(route.target(), Some(query::player_cell(&session)));
        }
    }

    #[test]
    fn hits_defeat_enemies_and_consume_budget() {
        let mut session = normal_session();
        let mut events = Vec::new();
        let target = EnemyId::new(0);

        apply(&mut session, Command::RegisterHit { enemy: target }, &mut events);

        let [Event::EnemyDefeated { enemy, .. }, Event::EnemyRespawned { cell, .. }] =
            events.as_slice()
        else {
            panic!("unexpected events: {events:?}");
        };
        assert_eq!(*enemy, target);
        assert_eq!(query::hits_remaining(&session), 6);
        let snapshot = query::enemy(&session, target).expect("enemy exists");
        assert_eq!(snapshot.cell, *cell);
        assert_eq!(
            snapshot.status,
            EnemyStatus::Respawning {
                remaining: Duration::from_millis(500)
            }
        );

        events.clear();
        apply(&mut session, Command::RegisterHit { enemy: target }, &mut events);
        assert_eq!(
            events,
            vec![Event::HitRejected {
                enemy: target,
                reason: HitRejection::NotAlive,
            }]
        );
        assert_eq!(query::hits_remaining(&session), 5);
    }

    #[test]
    fn exhausted_budget_rejects_hits() {
        let mut session = session_with(GameConfig {
            seed: 42,
            enemies: Some(DifficultySettings {
                hit_attempts: 1,
                ..DifficultySettings::preset(Difficulty::Normal)
            }),
            ..GameConfig::default()
        });
        let mut events = Vec::new();

        apply(
            &mut session,
            Command::RegisterHit {
                enemy: EnemyId::new(9),
            },
            &mut events,
        );
        apply(
            &mut session,
            Command::RegisterHit {
                enemy: EnemyId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::HitRejected {
                    enemy: EnemyId::new(9),
                    reason: HitRejection::UnknownEnemy,
                },
                Event::HitRejected {
                    enemy: EnemyId::new(1),
                    reason: HitRejection::BudgetExhausted,
                },
            ]
        );
        assert_eq!(query::hits_remaining(&session), 0);
    }

    #[test]
    fn visible_tiles_follow_configured_radius() {
        let session = session_with(GameConfig {
            seed: 42,
            vision_radius: 3,
            ..GameConfig::default()
        });

        let visible = query::visible_tiles(&session);

        assert_eq!(visible.center(), Some(query::player_cell(&session)));
        assert_eq!(visible.radius(), 3);
        assert!(visible.contains(CellCoord::new(0, 0)));
        assert!(!visible.contains(CellCoord::new(5, 1)));
    }
}
