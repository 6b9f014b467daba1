//! Configuration values consumed by the session and its systems.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Strategy;

/// Smallest accepted maze side length.
pub const MIN_DIMENSION: u32 = 5;
/// Largest accepted maze side length.
pub const MAX_DIMENSION: u32 = 1024;
/// Largest number of enemies a session may hold.
pub const MAX_ENEMIES: u32 = 64;

const DEFAULT_WIDTH: u32 = 20;
const DEFAULT_HEIGHT: u32 = 15;
const DEFAULT_SEED: u64 = 0x7f4a_7c15_9e37_79b9;
const DEFAULT_VISION_RADIUS: u32 = 2;
const DEFAULT_RESPAWN_DISTANCE: u32 = 10;
const DEFAULT_RESPAWN_DELAY_MS: u64 = 500;

/// Invalid configuration values, rejected before any maze is generated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The maze width falls outside the supported range.
    #[error("maze width {0} is outside {}..={}", MIN_DIMENSION, MAX_DIMENSION)]
    InvalidWidth(u32),
    /// The maze height falls outside the supported range.
    #[error("maze height {0} is outside {}..={}", MIN_DIMENSION, MAX_DIMENSION)]
    InvalidHeight(u32),
    /// Enemy speed must be a positive, finite number of cells per second.
    #[error("enemy speed {0} must be positive and finite")]
    InvalidEnemySpeed(f32),
    /// More enemies were requested than a session supports.
    #[error("{0} enemies requested, at most {} are supported", MAX_ENEMIES)]
    TooManyEnemies(u32),
    /// Respawned enemies must land at least one step away from the player.
    #[error("respawn distance must be at least 1")]
    ZeroRespawnDistance,
}

/// Checks that a maze of the provided size can be generated.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), ConfigError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&width) {
        return Err(ConfigError::InvalidWidth(width));
    }
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&height) {
        return Err(ConfigError::InvalidHeight(height));
    }
    Ok(())
}

/// Named difficulty levels with preset enemy tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// A single slow pursuer and a generous hit budget.
    Easy,
    /// Two pursuers at the classic pace.
    #[default]
    Normal,
    /// Three fast pursuers and few hit attempts.
    Hard,
}

/// Enemy tuning associated with a difficulty level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// Number of enemies placed at level start.
    pub enemy_count: u32,
    /// Enemy speed in cells per second.
    pub enemy_speed: f32,
    /// Number of hits the player may register during the level.
    pub hit_attempts: u32,
    /// Strategies assigned to enemies in round-robin order.
    pub strategies: Vec<Strategy>,
}

impl DifficultySettings {
    /// Preset tuning for the provided difficulty.
    #[must_use]
    pub fn preset(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                enemy_count: 1,
                enemy_speed: 1.0,
                hit_attempts: 10,
                strategies: vec![Strategy::Dfs],
            },
            Difficulty::Normal => Self {
                enemy_count: 2,
                enemy_speed: 2.0,
                hit_attempts: 7,
                strategies: vec![Strategy::AStar, Strategy::Bfs],
            },
            Difficulty::Hard => Self {
                enemy_count: 3,
                enemy_speed: 3.0,
                hit_attempts: 5,
                strategies: vec![Strategy::AStar, Strategy::Bfs, Strategy::Dfs],
            },
        }
    }

    /// Strategy assigned to the enemy at `index`, cycling through the list.
    #[must_use]
    pub fn strategy_for(&self, index: usize) -> Strategy {
        if self.strategies.is_empty() {
            return Strategy::default();
        }
        self.strategies
            .get(index % self.strategies.len())
            .copied()
            .unwrap_or_default()
    }
}

/// Top-level configuration of a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Maze width in cells, border included.
    pub width: u32,
    /// Maze height in cells, border included.
    pub height: u32,
    /// Seed driving maze generation and enemy placement.
    pub seed: u64,
    /// Manhattan radius of the player's torch.
    pub vision_radius: u32,
    /// Difficulty level selecting the enemy preset.
    pub difficulty: Difficulty,
    /// Minimum graph distance between the player and a respawned enemy.
    pub respawn_distance: u32,
    /// Milliseconds a defeated enemy waits before resuming its pursuit.
    pub respawn_delay_ms: u64,
    /// Replaces the difficulty preset when present.
    pub enemies: Option<DifficultySettings>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: DEFAULT_SEED,
            vision_radius: DEFAULT_VISION_RADIUS,
            difficulty: Difficulty::default(),
            respawn_distance: DEFAULT_RESPAWN_DISTANCE,
            respawn_delay_ms: DEFAULT_RESPAWN_DELAY_MS,
            enemies: None,
        }
    }
}

impl GameConfig {
    /// Checks every value that would otherwise fail later during setup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        if self.respawn_distance == 0 {
            return Err(ConfigError::ZeroRespawnDistance);
        }
        let settings = self.difficulty_settings();
        if settings.enemy_count > MAX_ENEMIES {
            return Err(ConfigError::TooManyEnemies(settings.enemy_count));
        }
        let speed = settings.enemy_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidEnemySpeed(speed));
        }
        Ok(())
    }

    /// Enemy tuning in effect, honouring an explicit override.
    #[must_use]
    pub fn difficulty_settings(&self) -> DifficultySettings {
        self.enemies
            .clone()
            .unwrap_or_else(|| DifficultySettings::preset(self.difficulty))
    }

    /// Delay applied after an enemy is defeated.
    #[must_use]
    pub const fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }
}
