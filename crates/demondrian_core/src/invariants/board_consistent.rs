//! Board consistency: the arena and the cell grid describe the same pieces.

use tracing::warn;

use super::Invariant;
use crate::{Board, Game};

/// Invariant: every piece covers exactly its block and nothing else.
///
/// Each arena entry fits on the board, every cell of its footprint points back
/// at it, and no cell points at a piece outside the arena.
pub struct BoardConsistentInvariant;

impl Invariant<Board> for BoardConsistentInvariant {
    fn holds(board: &Board) -> bool {
        match board.check_consistency() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Board consistency violated");
                false
            }
        }
    }

    fn description() -> &'static str {
        "Arena and grid agree on every piece footprint"
    }
}

impl Invariant<Game> for BoardConsistentInvariant {
    fn holds(game: &Game) -> bool {
        <Self as Invariant<Board>>::holds(game.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}
