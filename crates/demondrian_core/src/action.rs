//! First-class move and board action types.
//!
//! A [`Move`] is the ordered list of primitive [`BoardAction`]s one click
//! caused. Every action carries what it needs to revert itself, so a move can
//! be replayed forwards for animation and backwards for undo.

use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::{Board, Coord, CoreResult, Occupant, Orientation, PiecesSquare, RotationDir};

/// An unexecuted candidate move: the piece anchored at `coord` when the board
/// faces `orientation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct PotentialMove {
    /// Anchor of the clicked piece, in the frame of `orientation`.
    pub coord: Coord,
    /// Orientation the move is played in.
    pub orientation: Orientation,
}

impl std::fmt::Display for PotentialMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[PotentialMove @ {}, rot: {}]", self.coord, self.orientation)
    }
}

/// A reversible primitive change to a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BoardAction {
    /// Turn the board to face `orientation`. Reverting turns it there too.
    Orientate {
        /// Target orientation.
        #[serde(rename = "o")]
        orientation: Orientation,
    },
    /// One quarter turn.
    Rotate {
        /// Turn direction.
        #[serde(rename = "right", with = "right_flag")]
        dir: RotationDir,
    },
    /// Take the clicked piece off the board.
    Remove {
        /// Anchor of the removed piece.
        coord: Coord,
        /// The removed piece.
        removed: Occupant,
    },
    /// Drop a piece down by `rows`.
    Fall {
        /// Rows fallen.
        rows: i32,
        /// Anchor before falling.
        coord: Coord,
        /// The falling piece.
        piece: Occupant,
    },
    /// Insert the incoming piece at the far edge.
    #[serde(rename = "new")]
    NewPiece {
        /// Anchor of the inserted piece.
        coord: Coord,
        /// The inserted piece.
        #[serde(rename = "newPiece")]
        new_piece: Occupant,
    },
    /// Merge four pieces into one of double size.
    Compact {
        /// Anchor of the merged block.
        coord: Coord,
        /// The created piece.
        #[serde(rename = "bigPiece")]
        big_piece: Occupant,
        /// The four merged pieces.
        removed: PiecesSquare,
    },
}

mod right_flag {
    use crate::RotationDir;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dir: &RotationDir, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*dir == RotationDir::Right)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RotationDir, D::Error> {
        Ok(if bool::deserialize(deserializer)? {
            RotationDir::Right
        } else {
            RotationDir::Left
        })
    }
}

impl BoardAction {
    /// Applies the action to `board`.
    ///
    /// # Errors
    ///
    /// Fails when the board does not hold what the action expects.
    pub fn apply(&self, board: &mut Board) -> CoreResult<()> {
        trace!(action = %self, "Applying action");
        match self {
            BoardAction::Orientate { orientation } => board.rotate_to(*orientation),
            BoardAction::Rotate { dir } => board.rotate(*dir),
            BoardAction::Remove { coord, .. } => {
                board.remove_at(*coord)?;
            }
            BoardAction::Fall { rows, coord, piece } => {
                board.remove_at(*coord)?;
                board.place(coord.offset(0, -rows), *piece)?;
            }
            BoardAction::NewPiece { coord, new_piece } => board.place(*coord, *new_piece)?,
            BoardAction::Compact {
                coord, big_piece, ..
            } => {
                let small = big_piece.piece.size / 2;
                for c in coord.square_coords(small) {
                    board.remove_at(c)?;
                }
                board.place(*coord, *big_piece)?;
            }
        }
        Ok(())
    }

    /// Reverts the action on `board`.
    ///
    /// # Errors
    ///
    /// Fails when the board does not hold what the action left behind.
    pub fn revert(&self, board: &mut Board) -> CoreResult<()> {
        trace!(action = %self, "Reverting action");
        match self {
            BoardAction::Orientate { orientation } => board.rotate_to(*orientation),
            BoardAction::Rotate { dir } => board.rotate(dir.inverse()),
            BoardAction::Remove { coord, removed } => board.place(*coord, *removed)?,
            BoardAction::Fall { rows, piece, .. } => {
                let fallen = board.anchor_of(piece.id)?;
                board.remove(piece.id)?;
                board.place(fallen.offset(0, *rows), *piece)?;
            }
            BoardAction::NewPiece { coord, .. } => {
                board.remove_at(*coord)?;
            }
            BoardAction::Compact {
                coord,
                big_piece,
                removed,
            } => {
                board.remove(big_piece.id)?;
                let small = big_piece.piece.size / 2;
                for (c, occupant) in coord.square_coords(small).into_iter().zip(removed.occupants()) {
                    board.place(c, occupant)?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for BoardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardAction::Orientate { orientation } => write!(f, "orientate {}", orientation),
            BoardAction::Rotate { dir } => write!(f, "rotate {}", dir),
            BoardAction::Remove { coord, removed } => write!(f, "remove {} at {}", removed, coord),
            BoardAction::Fall { rows, coord, piece } => {
                write!(f, "fall {} from {} by {}", piece, coord, rows)
            }
            BoardAction::NewPiece { coord, new_piece } => write!(f, "new {} at {}", new_piece, coord),
            BoardAction::Compact {
                coord, big_piece, ..
            } => write!(f, "compact {} at {}", big_piece, coord),
        }
    }
}

/// A committed turn: the actions it caused, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, new)]
pub struct Move {
    /// Actions in execution order.
    #[serde(rename = "actions")]
    pub consequences: Vec<BoardAction>,
}

impl Move {
    /// Replays every action in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing action.
    #[instrument(skip_all, fields(actions = self.consequences.len()))]
    pub fn apply(&self, board: &mut Board) -> CoreResult<()> {
        self.consequences
            .iter()
            .try_for_each(|action| action.apply(board))
    }

    /// Reverts every action in reverse order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing action.
    #[instrument(skip_all, fields(actions = self.consequences.len()))]
    pub fn revert(&self, board: &mut Board) -> CoreResult<()> {
        self.consequences
            .iter()
            .rev()
            .try_for_each(|action| action.revert(board))
    }

    /// Number of merges in this move.
    pub fn merges(&self) -> usize {
        self.consequences
            .iter()
            .filter(|a| matches!(a, BoardAction::Compact { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, PieceId, PieceType};

    #[test]
    fn test_action_json_discriminators() {
        let occupant = Occupant::new(PieceId(3), Piece::unit(PieceType::Normal(1)));
        let cases = [
            (
                BoardAction::Orientate {
                    orientation: Orientation::Left,
                },
                "orientate",
            ),
            (
                BoardAction::Rotate {
                    dir: RotationDir::Right,
                },
                "rotate",
            ),
            (
                BoardAction::Remove {
                    coord: Coord::ORIGIN,
                    removed: occupant,
                },
                "remove",
            ),
            (
                BoardAction::Fall {
                    rows: 1,
                    coord: Coord::new(0, 1),
                    piece: occupant,
                },
                "fall",
            ),
            (
                BoardAction::NewPiece {
                    coord: Coord::new(0, 1),
                    new_piece: occupant,
                },
                "new",
            ),
        ];
        for (action, tag) in cases {
            let value = serde_json::to_value(&action).expect("serialize");
            assert_eq!(value["type"], tag);
            let back: BoardAction = serde_json::from_value(value).expect("deserialize");
            assert_eq!(back, action);
        }
    }

    #[test]
    fn test_rotate_json_uses_right_flag() {
        let value = serde_json::to_value(BoardAction::Rotate {
            dir: RotationDir::Left,
        })
        .expect("serialize");
        assert_eq!(value["right"], false);
        let fall = serde_json::to_value(BoardAction::Fall {
            rows: 2,
            coord: Coord::new(1, 3),
            piece: Occupant::new(PieceId(0), Piece::unit(PieceType::Normal(0))),
        })
        .expect("serialize");
        assert_eq!(fall["rows"], 2);
        assert_eq!(fall["coord"]["col"], 1);
        assert_eq!(fall["piece"]["size"], 1);
    }

    #[test]
    fn test_fall_round_trip_on_board() {
        let mut board = Board::new(2).expect("board");
        let id = board
            .set(Coord::new(0, 1), Piece::unit(PieceType::Normal(0)))
            .expect("set");
        let piece = board.occupant(id).expect("occupant");
        let fall = BoardAction::Fall {
            rows: 1,
            coord: Coord::new(0, 1),
            piece,
        };
        fall.apply(&mut board).expect("apply");
        assert_eq!(board.anchor_of(id).expect("anchor"), Coord::ORIGIN);
        fall.revert(&mut board).expect("revert");
        assert_eq!(board.anchor_of(id).expect("anchor"), Coord::new(0, 1));
    }

    #[test]
    fn test_rotate_revert_is_inverse() {
        let mut board: Board = "01 23".parse().expect("board");
        let before = board.clone();
        let rotate = BoardAction::Rotate {
            dir: RotationDir::Left,
        };
        rotate.apply(&mut board).expect("apply");
        assert_eq!(board.orientation(), Orientation::Left);
        rotate.revert(&mut board).expect("revert");
        assert!(board.matches(&before));
        assert_eq!(board.orientation(), Orientation::Top);
    }

    #[test]
    fn test_potential_move_display() {
        let mv = PotentialMove::new(Coord::new(1, 2), Orientation::Right);
        assert_eq!(mv.to_string(), "[PotentialMove @ [C1,2], rot: Right]");
    }
}
