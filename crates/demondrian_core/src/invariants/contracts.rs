//! Contract-based validation for executing moves.
//!
//! Contracts define correctness through preconditions and postconditions:
//! {P} action {Q}.

use tracing::{instrument, warn};

use super::{BoardInvariants, InvariantSet, describe};
use crate::{Board, BoardOperationError, CoreError, CoreResult, PlayLogic, PotentialMove};

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> CoreResult<()>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> CoreResult<()>;
}

/// Contract for executing a potential move on a board.
///
/// Preconditions:
/// - the clicked cell holds a piece
/// - the piece is alone and nothing blocks it from above, in the move's
///   orientation
///
/// Postconditions:
/// - arena and grid stay consistent and no merge is pending
/// - a full board stays full
pub struct ExecuteContract;

impl Contract<Board, PotentialMove> for ExecuteContract {
    #[instrument(skip(board))]
    fn pre(board: &Board, action: &PotentialMove) -> CoreResult<()> {
        let mut rotated = board.clone();
        rotated.rotate_to(action.orientation);
        if rotated.occupant_at(action.coord).is_none() {
            return Err(CoreError::board_op(BoardOperationError::EmptyCell(
                action.coord,
            )));
        }
        if PlayLogic::new(&rotated).is_valid_move(action.coord) {
            Ok(())
        } else {
            warn!(%action, "Rejected blocked move");
            Err(CoreError::game_op("Move is not possible"))
        }
    }

    fn post(before: &Board, after: &Board) -> CoreResult<()> {
        BoardInvariants::check_all(after).map_err(|violations| {
            CoreError::board_state(format!("Postcondition failed: {}", describe(&violations)))
        })?;
        if before.is_full() && !after.is_full() {
            return Err(CoreError::board_state(
                "Postcondition failed: full board lost a cell",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coord, CoreErrorKind, Orientation, PieceType};

    #[test]
    fn test_precondition_accepts_lonely_piece() {
        let board: Board = "01 10".parse().expect("board");
        let mv = PotentialMove::new(Coord::ORIGIN, Orientation::Left);
        assert!(ExecuteContract::pre(&board, &mv).is_ok());
    }

    #[test]
    fn test_precondition_rejects_matching_neighbour() {
        let board: Board = "01 01".parse().expect("board");
        let mv = PotentialMove::new(Coord::ORIGIN, Orientation::Top);
        let err = ExecuteContract::pre(&board, &mv).expect_err("blocked");
        assert!(matches!(err.kind, CoreErrorKind::GameOperation(_)));
    }

    #[test]
    fn test_precondition_rejects_empty_cell() {
        let board = Board::new(2).expect("board");
        let mv = PotentialMove::new(Coord::ORIGIN, Orientation::Top);
        assert!(ExecuteContract::pre(&board, &mv).is_err());
    }

    #[test]
    fn test_postcondition_detects_hole() {
        let before: Board = "01 10".parse().expect("board");
        let mut after = before.clone();
        assert!(ExecuteContract::post(&before, &after).is_ok());
        after.remove_at(Coord::ORIGIN).expect("remove");
        assert!(ExecuteContract::post(&before, &after).is_err());
    }

    #[test]
    fn test_postcondition_detects_pending_merge() {
        let before: Board = "01 10".parse().expect("board");
        let mut after = Board::new(2).expect("board");
        after.fill(PieceType::Normal(0)).expect("fill");
        assert!(ExecuteContract::post(&before, &after).is_err());
    }
}
