//! Detection and execution of 2×2 merges.
//!
//! A board is stable when [`BoardCompactor::can_compact`] is false. Anything
//! that mutates a board outside of the journal must compact it afterwards.

use tracing::{debug, instrument, trace};

use crate::{Board, Coord, CoreResult, Occupant, PieceId, PiecesSquare};

/// Merges aligned blocks of four matching pieces into one double-size piece.
pub struct BoardCompactor;

impl BoardCompactor {
    /// Whether the block anchored at `coord` can merge.
    ///
    /// All four sub-squares (sized like the piece at `coord`) must be on the
    /// grid, each must be occupied by a piece anchored exactly there, and all
    /// four must match the lower-left piece.
    pub fn can_compact_at(board: &Board, coord: Coord) -> bool {
        let Some(piece00) = board.occupant_at(coord) else {
            return false;
        };
        coord
            .square_coords(piece00.piece.size)
            .into_iter()
            .all(|c| match board.occupant_at(c) {
                Some(other) => {
                    board.anchor_of(other.id).ok() == Some(c) && other.matches(&piece00)
                }
                None => false,
            })
    }

    /// First compactable anchor in row-major order, if any.
    pub fn next_compactable(board: &Board) -> Option<Coord> {
        board
            .all_coords()
            .find(|c| Self::can_compact_at(board, *c))
    }

    /// Whether any merge is pending. `false` means the board is stable.
    pub fn can_compact(board: &Board) -> bool {
        Self::next_compactable(board).is_some()
    }

    /// Merges the block anchored at `coord`, returning the created identity
    /// and the four removed occupants.
    ///
    /// # Errors
    ///
    /// Fails when the block cannot be read or the merged piece cannot be set.
    #[instrument(skip(board))]
    pub fn compact_coord(board: &mut Board, coord: Coord) -> CoreResult<(PieceId, PiecesSquare)> {
        let removed = board.pieces_square(coord)?;
        let big_piece = removed.p00.piece.double_size();
        for occupant in removed.occupants() {
            board.remove(occupant.id)?;
        }
        let id = board.set(coord, big_piece)?;
        trace!(%coord, big = %Occupant::new(id, big_piece), "Merged square");
        Ok((id, removed))
    }

    /// Performs the next pending merge, if any, and returns its anchor.
    ///
    /// # Errors
    ///
    /// Propagates board failures.
    pub fn compact_next(board: &mut Board) -> CoreResult<Option<Coord>> {
        match Self::next_compactable(board) {
            Some(coord) => {
                Self::compact_coord(board, coord)?;
                Ok(Some(coord))
            }
            None => Ok(None),
        }
    }

    /// Merges until the board is stable and returns the number of merges.
    ///
    /// # Errors
    ///
    /// Propagates board failures.
    #[instrument(skip(board), fields(size = board.size()))]
    pub fn compact(board: &mut Board) -> CoreResult<usize> {
        let mut merges = 0;
        while Self::compact_next(board)?.is_some() {
            merges += 1;
        }
        if merges > 0 {
            debug!(merges, "Board compacted");
        }
        Ok(merges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, PieceType};

    fn unit_board(size: i32, kinds: &[(i32, i32, u32)]) -> Board {
        let mut board = Board::new(size).expect("board");
        for (col, row, kind) in kinds {
            board
                .set(Coord::new(*col, *row), Piece::unit(PieceType::Normal(*kind)))
                .expect("set");
        }
        board
    }

    #[test]
    fn test_matching_square_compacts_in_place() {
        let mut board = unit_board(2, &[(0, 0, 1), (1, 0, 1), (0, 1, 1), (1, 1, 1)]);
        assert!(BoardCompactor::can_compact_at(&board, Coord::ORIGIN));
        assert_eq!(BoardCompactor::next_compactable(&board), Some(Coord::ORIGIN));

        let (id, removed) = BoardCompactor::compact_coord(&mut board, Coord::ORIGIN).expect("compact");
        assert!(removed.all_match());
        assert_eq!(board.piece_count(), 1);
        assert_eq!(board.piece(id), Some(Piece::new(PieceType::Normal(1), 2)));
        assert!(board.is_full());
        assert!(!BoardCompactor::can_compact(&board));
    }

    #[test]
    fn test_empty_or_mismatched_square_does_not_compact() {
        let board = unit_board(2, &[(0, 0, 1), (1, 0, 1), (0, 1, 1)]);
        assert!(!BoardCompactor::can_compact_at(&board, Coord::ORIGIN));
        assert!(!BoardCompactor::can_compact_at(&board, Coord::new(1, 1)));

        let board = unit_board(2, &[(0, 0, 1), (1, 0, 1), (0, 1, 1), (1, 1, 2)]);
        assert!(!BoardCompactor::can_compact(&board));
    }

    #[test]
    fn test_square_must_be_anchored_exactly() {
        let mut board = Board::new(4).expect("board");
        let big = Piece::new(PieceType::Normal(0), 2);
        board.set(Coord::new(1, 0), big).expect("set");
        board.set(Coord::new(0, 0), Piece::unit(PieceType::Normal(0))).expect("set");
        board.set(Coord::new(0, 1), Piece::unit(PieceType::Normal(0))).expect("set");
        assert!(!BoardCompactor::can_compact_at(&board, Coord::ORIGIN));
    }

    #[test]
    fn test_compact_cascades_to_full_size() {
        let mut board = Board::new(4).expect("board");
        board.fill(PieceType::Normal(3)).expect("fill");
        let merges = BoardCompactor::compact(&mut board).expect("compact");
        assert_eq!(merges, 5);
        assert_eq!(board.piece_count(), 1);
        assert_eq!(board.occupant_at(Coord::new(3, 3)).map(|o| o.piece.size), Some(4));
    }

    #[test]
    fn test_wildcards_in_squares() {
        let mut board = unit_board(2, &[(1, 0, 1), (0, 1, 1), (1, 1, 1)]);
        board.set(Coord::ORIGIN, Piece::unit(PieceType::MatchAll)).expect("set");
        assert!(BoardCompactor::can_compact(&board));

        let mut board = unit_board(2, &[(1, 0, 1), (0, 1, 1), (1, 1, 1)]);
        board.set(Coord::ORIGIN, Piece::unit(PieceType::MatchNone)).expect("set");
        assert!(!BoardCompactor::can_compact(&board));
    }
}
