//! Board stability: no merge is pending between moves.

use super::Invariant;
use crate::{Board, BoardCompactor, Game};

/// Invariant: no 2x2 block of matching equal pieces is left unmerged.
pub struct BoardStableInvariant;

impl Invariant<Board> for BoardStableInvariant {
    fn holds(board: &Board) -> bool {
        !BoardCompactor::can_compact(board)
    }

    fn description() -> &'static str {
        "No merge is pending"
    }
}

impl Invariant<Game> for BoardStableInvariant {
    fn holds(game: &Game) -> bool {
        <Self as Invariant<Board>>::holds(game.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coord, Piece, PieceType};

    #[test]
    fn test_compacted_board_is_stable() {
        let board: Board = "0000 0000 0000 0000".parse().expect("board");
        assert!(<BoardStableInvariant as Invariant<Board>>::holds(&board));
    }

    #[test]
    fn test_matching_square_is_unstable() {
        let mut board = Board::new(2).expect("board");
        for coord in Coord::ORIGIN.square_coords(1) {
            board
                .set(coord, Piece::unit(PieceType::Normal(1)))
                .expect("set");
        }
        assert!(!<BoardStableInvariant as Invariant<Board>>::holds(&board));
    }
}
