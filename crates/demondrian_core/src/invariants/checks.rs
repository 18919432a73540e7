//! Before/after guards that raise an invalid board state.

use tracing::warn;

use crate::{Board, CoreError, CoreResult};

/// Guard: the piece count changes by exactly the expected amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceCountCheck {
    expected: isize,
}

impl PieceCountCheck {
    /// Records the count of `board` plus `change`.
    pub fn new(board: &Board, change: isize) -> Self {
        Self {
            expected: board.piece_count() as isize + change,
        }
    }

    /// The count [`PieceCountCheck::verify`] expects.
    pub fn expected(&self) -> isize {
        self.expected
    }

    /// # Errors
    ///
    /// Fails when `board` does not hold the expected number of pieces.
    pub fn verify(&self, board: &Board) -> CoreResult<()> {
        let found = board.piece_count() as isize;
        if found == self.expected {
            Ok(())
        } else {
            warn!(expected = self.expected, found, "Piece count changed unexpectedly");
            Err(CoreError::board_state(format!(
                "Expected {} pieces, found {}",
                self.expected, found
            )))
        }
    }
}

/// Guard: the board is left as it was found.
#[derive(Debug, Clone)]
pub struct BoardUnchanged {
    snapshot: Board,
}

impl BoardUnchanged {
    /// Snapshots `board`.
    pub fn new(board: &Board) -> Self {
        Self {
            snapshot: board.clone(),
        }
    }

    /// # Errors
    ///
    /// Fails when `board` no longer matches the snapshot.
    pub fn verify(&self, board: &Board) -> CoreResult<()> {
        if self.snapshot.matches(board) {
            Ok(())
        } else {
            warn!(
                before = %self.snapshot.type_grid(),
                after = %board.type_grid(),
                "Board changed unexpectedly"
            );
            Err(CoreError::board_state("Board changed unexpectedly"))
        }
    }
}
