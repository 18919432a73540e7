//! Move legality: obstacles, droppable pieces, and available moves.

use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::{
    Board, BoardOperationError, Coord, CoreError, CoreResult, Occupant, PieceId, PotentialMove,
};

/// Read-only rules queries over a board in its current orientation.
#[derive(Debug, Clone, Copy)]
pub struct PlayLogic<'a> {
    board: &'a Board,
}

impl<'a> PlayLogic<'a> {
    /// Creates a view over `board`.
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    /// The board being queried.
    pub fn board(&self) -> &'a Board {
        self.board
    }

    fn occupied(&self, coord: Coord) -> CoreResult<Occupant> {
        self.board
            .get(coord)?
            .ok_or_else(|| CoreError::board_op(BoardOperationError::EmptyCell(coord)))
    }

    /// Whether a piece sits at `coord` with no matching neighbour.
    pub fn is_alone(&self, coord: Coord) -> bool {
        match self.board.occupant_at(coord) {
            Some(occupant) => self
                .board
                .matching_neighbours(occupant.id)
                .map(|neighbours| neighbours.is_empty())
                .unwrap_or(false),
            None => false,
        }
    }

    /// Whether `coord` holds a piece that can be played now.
    pub fn is_valid_move(&self, coord: Coord) -> bool {
        if !self.is_alone(coord) {
            return false;
        }
        match self.board.occupant_at(coord) {
            Some(occupant) => self
                .obstacles_above(occupant.id)
                .map(|obstacles| obstacles.is_empty())
                .unwrap_or(false),
            None => false,
        }
    }

    fn crosses_column(anchor: Coord, size: i32, column: i32) -> bool {
        anchor.col < column && anchor.col + size > column
    }

    /// Pieces of size ≥ 2 strictly above the piece whose span crosses one of
    /// its column boundaries. They cannot fall through the gap.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn obstacles_above(&self, id: PieceId) -> CoreResult<Vec<Occupant>> {
        let anchor = self.board.anchor_of(id)?;
        let size = self.board.piece(id).map(|p| p.size).unwrap_or(1);
        Ok(self
            .board
            .occupants()
            .into_iter()
            .filter(|(other_anchor, other)| {
                other.piece.size >= 2
                    && other_anchor.row > anchor.row
                    && (Self::crosses_column(*other_anchor, other.piece.size, anchor.col)
                        || Self::crosses_column(*other_anchor, other.piece.size, anchor.col + size))
            })
            .map(|(_, other)| other)
            .collect())
    }

    /// Adjacent pieces matching the piece `id`; they would merge instead.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn blocking_neighbours(&self, id: PieceId) -> CoreResult<Vec<Occupant>> {
        self.board.matching_neighbours(id)
    }

    /// Everything preventing the piece at `coord` from being played, ordered
    /// by identity and without duplicates.
    ///
    /// # Errors
    ///
    /// Fails when `coord` is out of range or empty.
    #[instrument(skip(self))]
    pub fn all_obstacles(&self, coord: Coord) -> CoreResult<Vec<Occupant>> {
        let occupant = self.occupied(coord)?;
        let mut obstacles = BTreeMap::new();
        for other in self
            .obstacles_above(occupant.id)?
            .into_iter()
            .chain(self.blocking_neighbours(occupant.id)?)
        {
            obstacles.insert(other.id, other);
        }
        Ok(obstacles.into_values().collect())
    }

    /// Pieces strictly above the piece whose span lies within its columns,
    /// lowest first. These fall when the piece is removed.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn droppables_above(&self, id: PieceId) -> CoreResult<Vec<Occupant>> {
        let anchor = self.board.anchor_of(id)?;
        let size = self.board.piece(id).map(|p| p.size).unwrap_or(1);
        Ok(self
            .board
            .occupants()
            .into_iter()
            .filter(|(other_anchor, other)| {
                other_anchor.row > anchor.row
                    && other_anchor.col >= anchor.col
                    && other_anchor.col + other.piece.size <= anchor.col + size
            })
            .map(|(_, other)| other)
            .collect())
    }

    /// Every legal move in every orientation.
    ///
    /// Orientations are tried Top, Right, Bottom, Left; within one
    /// orientation pieces are tried in row-major anchor order. The board is
    /// not modified.
    ///
    /// # Errors
    ///
    /// Fails unless the board is full.
    #[instrument(skip(self), fields(size = self.board.size()))]
    pub fn available_moves(&self) -> CoreResult<Vec<PotentialMove>> {
        if !self.board.is_full() {
            return Err(CoreError::board_op(BoardOperationError::BoardNotFull));
        }
        let mut working = self.board.clone();
        working.rotate_to(crate::Orientation::Top);
        let mut moves = Vec::new();
        for _ in 0..4 {
            let logic = PlayLogic::new(&working);
            moves.extend(
                working
                    .occupants()
                    .into_iter()
                    .filter(|(anchor, _)| logic.is_valid_move(*anchor))
                    .map(|(anchor, _)| PotentialMove::new(anchor, working.orientation())),
            );
            working.rotate_right();
        }
        debug!(count = moves.len(), "Enumerated available moves");
        Ok(moves)
    }

    /// Whether at least one legal move exists.
    ///
    /// # Errors
    ///
    /// Fails unless the board is full.
    pub fn has_available_moves(&self) -> CoreResult<bool> {
        Ok(!self.available_moves()?.is_empty())
    }
}
