//! Error types for the rules engine.
//!
//! Every failure the engine raises is a precondition violation by the caller.
//! Solver outcomes are never errors; see [`crate::SolveResult`].

use derive_more::{Display, Error};
use tracing::instrument;

use crate::{Coord, Piece, PieceId};

/// Specific reason an operation on a board was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum BoardOperationError {
    /// A coordinate, or the footprint of a piece, lies outside the board.
    #[display("coordinate {} out of range", _0)]
    OutOfRange(Coord),

    /// The piece identity is already placed on the board.
    #[display("piece {} is already in the board", _0)]
    AlreadyPresent(PieceId),

    /// The target footprint overlaps another piece.
    #[display("piece {} cannot be set in occupied space {}", _0, _1)]
    Occupied(Piece, Coord),

    /// The piece size is not a positive power of two.
    #[display("piece {} does not have a power-of-two size", _0)]
    InvalidPieceSize(Piece),

    /// The piece identity is not on the board.
    #[display("piece {} is not in the board", _0)]
    NotOnBoard(PieceId),

    /// The cell holds no piece.
    #[display("no piece at {}", _0)]
    EmptyCell(Coord),

    /// A grid definition could not be turned into a board.
    #[display("invalid board definition '{}'", _0)]
    MalformedGrid(String),

    /// The operation needs every cell occupied.
    #[display("board must be full")]
    BoardNotFull,
}

/// Category of an engine error.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum CoreErrorKind {
    /// Invalid operation on a board.
    #[display("Invalid board operation: {}", _0)]
    BoardOperation(BoardOperationError),

    /// Board construction or consistency failure.
    #[display("Invalid board state: {}", _0)]
    BoardState(String),

    /// Game construction failure.
    #[display("Invalid game state: {}", _0)]
    GameState(String),

    /// Game or simulator used out of sequence.
    #[display("Invalid game operation: {}", _0)]
    GameOperation(String),

    /// Malformed serialized input.
    #[display("Parse error: {}", _0)]
    Parse(String),

    /// Level files could not be read.
    #[display("Level file error: {}", _0)]
    LevelFile(String),
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{} at {}:{}", kind, file, line)]
pub struct CoreError {
    /// What went wrong.
    pub kind: CoreErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CoreError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: CoreErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for an invalid board operation.
    #[track_caller]
    pub fn board_op(reason: BoardOperationError) -> Self {
        Self::new(CoreErrorKind::BoardOperation(reason))
    }

    /// Shorthand for an invalid board state.
    #[track_caller]
    pub fn board_state(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::BoardState(message.into()))
    }

    /// Shorthand for an invalid game state.
    #[track_caller]
    pub fn game_state(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::GameState(message.into()))
    }

    /// Shorthand for an invalid game operation.
    #[track_caller]
    pub fn game_op(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::GameOperation(message.into()))
    }

    /// Shorthand for a parse failure.
    #[track_caller]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Parse(message.into()))
    }

    /// Shorthand for a level file failure.
    #[track_caller]
    pub fn level_file(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::LevelFile(message.into()))
    }

    /// Returns the board operation reason, if this is one.
    pub fn board_operation(&self) -> Option<&BoardOperationError> {
        match &self.kind {
            CoreErrorKind::BoardOperation(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", err))
    }
}

/// Result alias used across the engine.
pub type CoreResult<T> = Result<T, CoreError>;
