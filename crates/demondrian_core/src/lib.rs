//! Rules engine and solver for demondrian, a tile-merging puzzle.
//!
//! A square board holds typed square pieces. Clicking a piece that has no
//! matching neighbour removes it; the pieces above fall into the gap, a new
//! piece enters at the far edge, and any 2x2 block of four matching pieces of
//! equal size merges into one piece of double size. The board can be turned in
//! quarter steps, which changes which way is "down". A puzzle is solved when a
//! single piece covers the whole board.
//!
//! # Architecture
//!
//! - [`Board`] stores pieces in an identity arena plus a cell grid
//! - [`BoardCompactor`] merges matching blocks until the board is stable
//! - [`PlayLogic`] answers legality questions and enumerates moves
//! - [`MoveSimulator`] turns a click into an ordered, reversible [`Move`]
//! - [`Game`] commits moves, journals them for undo, and feeds the
//!   [`IncomingQueue`]
//! - [`Solver`] searches for a solution depth first
//! - [`BoardBuilder`], [`BoardGenerator`] and [`LevelRepository`] create boards
//!
//! # Example
//!
//! ```
//! use demondrian_core::{Board, Game, GameRules, PieceType, Solver};
//!
//! let board: Board = "01 11".parse()?;
//! let game = Game::new(board, GameRules::classic(), PieceType::range(0, 3))?;
//! let result = Solver::new(&game).solve(10_000, 10)?;
//! assert!(result.is_solvable());
//! # Ok::<(), demondrian_core::CoreError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod builder;
mod compactor;
mod coord;
mod error;
mod game;
mod generator;
pub mod invariants;
mod level;
mod piece;
mod play_logic;
mod queue;
mod rules;
mod simulator;
mod solver;

pub use action::{BoardAction, Move, PotentialMove};
pub use board::{Board, BoardDef};
pub use builder::BoardBuilder;
pub use compactor::BoardCompactor;
pub use coord::{Coord, Orientation, RotationDir};
pub use error::{BoardOperationError, CoreError, CoreErrorKind, CoreResult};
pub use game::{Game, GameSnapshot};
pub use generator::BoardGenerator;
pub use level::{Level, LevelRepository, Puzzle, PuzzleRef};
pub use piece::{
    BoardCell, MATCH_ALL_INDEX, MATCH_NONE_INDEX, Occupant, Piece, PieceId, PieceType, PiecesSquare,
};
pub use play_logic::PlayLogic;
pub use queue::{IncomingQueue, WeightedPicker};
pub use rules::{GameRules, NextTypePolicy, RulesPreset};
pub use simulator::{MoveSimulator, SimulationState};
pub use solver::{SolveLimits, SolveResult, Solver};
