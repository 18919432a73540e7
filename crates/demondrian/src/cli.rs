//! Command-line interface for demondrian.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use demondrian_core::RulesPreset;

/// Demondrian - rules engine, solver and board tools for the tile-merging puzzle
#[derive(Parser, Debug)]
#[command(name = "demondrian")]
#[command(about = "Solve and inspect demondrian boards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Solver config file (defaults to solver.toml in the config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Where a board comes from.
#[derive(Args, Debug, Clone)]
pub struct BoardSource {
    /// Board as grid text, top row first (e.g. "0011 0011 2222 1212")
    #[arg(long, conflicts_with = "levels")]
    pub board: Option<String>,

    /// Level file or directory of level files
    #[arg(long)]
    pub levels: Option<PathBuf>,

    /// Level index inside the repository
    #[arg(long, default_value = "0")]
    pub level: usize,

    /// Puzzle index inside the level
    #[arg(long, default_value = "0")]
    pub puzzle: usize,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for a solution
    Solve {
        /// Board to solve
        #[command(flatten)]
        source: BoardSource,

        /// Override the node budget
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Override the move limit
        #[arg(long)]
        max_moves: Option<usize>,

        /// Override the rules with a preset (classic, keep_same, arcade)
        #[arg(long)]
        rules: Option<RulesPreset>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the legal moves of a board
    Moves {
        /// Board to inspect
        #[command(flatten)]
        source: BoardSource,
    },

    /// Generate a random stable board
    Generate {
        /// Board side length
        #[arg(short, long, default_value = "4")]
        size: i32,

        /// Palette size (overrides the config)
        #[arg(short, long)]
        types: Option<u32>,

        /// Seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Leave matching blocks unmerged
        #[arg(long)]
        no_compact: bool,

        /// Print the board as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the levels of a level file or directory
    Levels {
        /// Level file or directory (defaults to levels/ in the config directory)
        path: Option<PathBuf>,
    },
}
