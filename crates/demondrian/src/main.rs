//! Demondrian - command-line solver and board tools.

#![warn(missing_docs)]

mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{BoardSource, Cli, Command};
use demondrian::SolverConfig;
use demondrian_core::{
    Board, BoardGenerator, Game, LevelRepository, PlayLogic, PuzzleRef, RulesPreset, Solver,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)?,
        None => SolverConfig::load_default()?,
    };

    match cli.command {
        Command::Solve {
            source,
            max_iterations,
            max_moves,
            rules,
            json,
        } => run_solve(config, &source, max_iterations, max_moves, rules, json),
        Command::Moves { source } => run_moves(&config, &source),
        Command::Generate {
            size,
            types,
            seed,
            no_compact,
            json,
        } => run_generate(config, size, types, seed, !no_compact, json),
        Command::Levels { path } => run_levels(path),
    }
}

fn load_repository(path: &Path) -> Result<LevelRepository> {
    let repository = if path.is_dir() {
        LevelRepository::scan(path)?
    } else {
        LevelRepository::from_file(path)?
    };
    Ok(repository)
}

/// Builds the game described by `source`; grid boards use the config's rules
/// and palette, puzzles their own.
#[instrument(skip(config))]
fn load_game(config: &SolverConfig, source: &BoardSource) -> Result<Game> {
    if let Some(text) = &source.board {
        let board: Board = text.parse()?;
        return Ok(Game::new(board, config.game_rules(), config.palette())?);
    }
    let path = source
        .levels
        .as_ref()
        .ok_or_else(|| anyhow!("Pass either --board or --levels"))?;
    let repository = load_repository(path)?;
    let puzzle_ref = PuzzleRef::new(source.level, source.puzzle);
    let puzzle = repository
        .puzzle(puzzle_ref)
        .with_context(|| format!("No puzzle {:?} in {}", puzzle_ref, path.display()))?;
    Ok(puzzle.new_game()?)
}

/// Runs the solver and prints the result
fn run_solve(
    config: SolverConfig,
    source: &BoardSource,
    max_iterations: Option<u64>,
    max_moves: Option<usize>,
    rules: Option<RulesPreset>,
    json: bool,
) -> Result<()> {
    let mut config = config;
    if let Some(max_iterations) = max_iterations {
        config = config.with_max_iterations(max_iterations);
    }
    if let Some(max_moves) = max_moves {
        config = config.with_max_moves(max_moves);
    }
    if let Some(preset) = rules {
        config = config.with_rules(demondrian::RulesSpec::Preset(preset));
    }

    let game = load_game(&config, source)?;
    info!(size = game.board().size(), "Solving board");
    let mut solver = Solver::new(&game);
    let result = solver.solve_with(config.limits())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", game.board().type_grid());
        println!("{}", result);
        println!("iterations: {}", solver.current_iterations());
    }
    Ok(())
}

/// Prints every legal move of the board
fn run_moves(config: &SolverConfig, source: &BoardSource) -> Result<()> {
    let game = load_game(config, source)?;
    let moves = PlayLogic::new(game.board()).available_moves()?;
    println!("{}", game.board().type_grid());
    if moves.is_empty() {
        println!("no moves available");
    }
    for mv in moves {
        println!("{}", mv);
    }
    Ok(())
}

/// Generates a board and prints it
fn run_generate(
    config: SolverConfig,
    size: i32,
    types: Option<u32>,
    seed: Option<u64>,
    compact: bool,
    json: bool,
) -> Result<()> {
    let mut config = config;
    if let Some(types) = types {
        config = config.with_types(types);
    }
    if seed.is_some() {
        config = config.with_seed(seed);
    }

    let mut generator = match config.seed() {
        Some(seed) => BoardGenerator::seeded(*seed),
        None => BoardGenerator::new(),
    };
    let board = generator.generate(size, &config.palette(), compact)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        println!("{}", board.type_grid());
    }
    Ok(())
}

/// Lists levels with their puzzle counts
fn run_levels(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| SolverConfig::default_config_dir().join("levels"));
    let repository = load_repository(&path)?;
    for (index, level) in repository.levels().iter().enumerate() {
        println!("{:>3}  {}  ({} puzzles)", index, level.id(), level.len());
        for (puzzle_index, puzzle) in level.puzzles().iter().enumerate() {
            println!(
                "       {:>3}  {}x{}  {:?}",
                puzzle_index,
                puzzle.board().size(),
                puzzle.board().size(),
                puzzle.rules().next_type_policy
            );
        }
    }
    Ok(())
}
