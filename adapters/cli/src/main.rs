#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Torchlight session.

mod logging;
mod render;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use torchlight_core::{Command, Difficulty, Direction, Event, GameConfig, Strategy};
use torchlight_world::{self as world, query, Session};

/// Headless Torchlight simulation
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file holding a game configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Maze width in cells
    #[arg(long)]
    width: Option<u32>,
    /// Maze height in cells
    #[arg(long)]
    height: Option<u32>,
    /// Seed for maze generation and enemy placement
    #[arg(short, long)]
    seed: Option<u64>,
    /// Difficulty preset
    #[arg(short, long, value_enum)]
    difficulty: Option<DifficultyArg>,
    /// Strategy used by every enemy (a_star, bfs or dfs)
    #[arg(long)]
    strategy: Option<Strategy>,
    /// Torch radius in cells
    #[arg(long)]
    vision: Option<u32>,
    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 50)]
    ticks: u32,
    /// Length of a simulated frame in milliseconds
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,
    /// Player moves, one per frame, written as N, E, S or W
    #[arg(short, long, default_value = "")]
    moves: String,
    /// Print the maze without fog
    #[arg(long)]
    reveal: bool,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Entry point for the Torchlight command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = load_config(&args)?;
    let moves = parse_moves(&args.moves)?;
    let mut session = Session::new(config).context("failed to start session")?;

    println!("{}", query::welcome_banner(&session));
    print!("{}", render::render(&session, args.reveal));

    let frame = Duration::from_millis(args.frame_ms);
    let mut events = Vec::new();
    for index in 0..args.ticks {
        if let Some(direction) = usize::try_from(index)
            .ok()
            .and_then(|slot| moves.get(slot))
        {
            world::apply(
                &mut session,
                Command::MovePlayer {
                    direction: *direction,
                },
                &mut events,
            );
        }
        world::apply(&mut session, Command::Tick { dt: frame }, &mut events);

        for event in events.drain(..) {
            log_event(&event);
        }
        if query::exit_reached(&session) {
            break;
        }
    }

    println!();
    print!("{}", render::render(&session, args.reveal));
    println!(
        "ticks: {}  player: {}  hits left: {}  exit reached: {}",
        query::tick_index(&session),
        query::player_cell(&session),
        query::hits_remaining(&session),
        query::exit_reached(&session)
    );
    for enemy in query::enemies(&session) {
        println!(
            "enemy {} [{}] at {} ({:?})",
            enemy.id.get(),
            enemy.strategy,
            enemy.cell,
            enemy.status
        );
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<GameConfig>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty.into();
    }
    if let Some(vision) = args.vision {
        config.vision_radius = vision;
    }
    if let Some(strategy) = args.strategy {
        let mut settings = config.difficulty_settings();
        settings.strategies = vec![strategy];
        config.enemies = Some(settings);
    }

    Ok(config)
}

fn parse_moves(script: &str) -> Result<Vec<Direction>> {
    script
        .chars()
        .filter(|glyph| !glyph.is_whitespace() && *glyph != ',')
        .map(|glyph| match glyph.to_ascii_uppercase() {
            'N' => Ok(Direction::North),
            'E' => Ok(Direction::East),
            'S' => Ok(Direction::South),
            'W' => Ok(Direction::West),
            other => bail!("unknown move `{other}`, expected N, E, S or W"),
        })
        .collect()
}

fn log_event(event: &Event) {
    match event {
        Event::ExitReached { cell } => info!("player escaped through {cell}"),
        Event::EnemyReachedPlayer { enemy, cell } => {
            info!("enemy {} caught the player at {cell}", enemy.get());
        }
        Event::PathNotFound { enemy, target } => {
            warn!("enemy {} found no route to {target}", enemy.get());
        }
        Event::PlayerBlocked { direction } => debug!("player blocked moving {direction:?}"),
        Event::TimeAdvanced { .. } => {}
        other => debug!("{other:?}"),
    }
}
