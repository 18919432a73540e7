//! The square board: piece placement, rotation, and value comparison.
//!
//! Pieces live in an arena keyed by [`PieceId`]; a parallel grid stores the
//! occupying id of every cell. Both views are updated together by every
//! mutation, so "same occupant" is always an id comparison and "matches" is
//! always a value comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, instrument, trace};

use crate::{
    BoardBuilder, BoardCell, BoardOperationError, Coord, CoreError, CoreResult, Occupant,
    Orientation, Piece, PieceId, PieceType, PiecesSquare, RotationDir,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    piece: Piece,
    anchor: Coord,
}

/// An N×N grid of pieces with an orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "BoardDef", try_from = "BoardDef")]
pub struct Board {
    size: i32,
    orientation: Orientation,
    pieces: BTreeMap<PieceId, Placement>,
    cells: Vec<Option<PieceId>>,
    next_id: u64,
}

impl Board {
    /// Largest accepted side length.
    pub const MAX_SIZE: i32 = 1024;

    /// Creates an empty board facing [`Orientation::Top`].
    ///
    /// # Errors
    ///
    /// Returns an invalid-board-state error when `size <= 0` or
    /// `size > MAX_SIZE`.
    #[instrument]
    pub fn new(size: i32) -> CoreResult<Self> {
        if size <= 0 {
            return Err(CoreError::board_state(format!(
                "Board size must be > 0, got {}",
                size
            )));
        }
        let cell_count = size
            .checked_mul(size)
            .filter(|_| size <= Self::MAX_SIZE)
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| {
                CoreError::board_state(format!(
                    "Board size must be <= {}, got {}",
                    Self::MAX_SIZE,
                    size
                ))
            })?;
        Ok(Self {
            size,
            orientation: Orientation::Top,
            pieces: BTreeMap::new(),
            cells: vec![None; cell_count],
            next_id: 0,
        })
    }

    /// Side length in cells.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Current orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Identity the next call to [`Board::set`] will hand out.
    pub fn next_piece_id(&self) -> PieceId {
        PieceId(self.next_id)
    }

    fn index(&self, coord: Coord) -> usize {
        (coord.row * self.size + coord.col) as usize
    }

    /// Whether `coord` lies outside the grid.
    pub fn out_of_range(&self, coord: Coord) -> bool {
        coord.col < 0 || coord.row < 0 || coord.col >= self.size || coord.row >= self.size
    }

    /// Every cell, row by row starting at the origin.
    pub fn all_coords(&self) -> impl Iterator<Item = Coord> + use<> {
        Coord::square_range(Coord::ORIGIN, self.size)
    }

    /// The occupant covering `coord`.
    ///
    /// # Errors
    ///
    /// Fails when `coord` is out of range.
    pub fn get(&self, coord: Coord) -> CoreResult<Option<Occupant>> {
        if self.out_of_range(coord) {
            return Err(CoreError::board_op(BoardOperationError::OutOfRange(coord)));
        }
        Ok(self.occupant_at(coord))
    }

    /// The occupant covering `coord`, or `None` for empty or out-of-range cells.
    pub fn occupant_at(&self, coord: Coord) -> Option<Occupant> {
        if self.out_of_range(coord) {
            return None;
        }
        self.cells[self.index(coord)].and_then(|id| self.occupant(id))
    }

    /// The occupant with identity `id`, if placed.
    pub fn occupant(&self, id: PieceId) -> Option<Occupant> {
        self.pieces
            .get(&id)
            .map(|placement| Occupant::new(id, placement.piece))
    }

    /// The piece value with identity `id`, if placed.
    pub fn piece(&self, id: PieceId) -> Option<Piece> {
        self.pieces.get(&id).map(|placement| placement.piece)
    }

    /// Whether `id` is on the board.
    pub fn contains(&self, id: PieceId) -> bool {
        self.pieces.contains_key(&id)
    }

    /// Anchor (lower-left cell) of the piece with identity `id`.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn anchor_of(&self, id: PieceId) -> CoreResult<Coord> {
        self.pieces
            .get(&id)
            .map(|placement| placement.anchor)
            .ok_or_else(|| CoreError::board_op(BoardOperationError::NotOnBoard(id)))
    }

    /// Whether the cell holds no piece. Out-of-range cells count as empty.
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.occupant_at(coord).is_none()
    }

    /// Whether the board holds no pieces.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Whether every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn last_coord(anchor: Coord, piece: &Piece) -> Coord {
        anchor.offset(piece.size - 1, piece.size - 1)
    }

    fn check_placement(&self, coord: Coord, occupant: &Occupant) -> CoreResult<()> {
        if !occupant.piece.has_valid_size() {
            return Err(CoreError::board_op(BoardOperationError::InvalidPieceSize(
                occupant.piece,
            )));
        }
        if self.out_of_range(coord) || self.out_of_range(Self::last_coord(coord, &occupant.piece))
        {
            return Err(CoreError::board_op(BoardOperationError::OutOfRange(coord)));
        }
        if self.contains(occupant.id) {
            return Err(CoreError::board_op(BoardOperationError::AlreadyPresent(
                occupant.id,
            )));
        }
        if Coord::square_range(coord, occupant.piece.size).any(|c| !self.is_empty_at(c)) {
            return Err(CoreError::board_op(BoardOperationError::Occupied(
                occupant.piece,
                coord,
            )));
        }
        Ok(())
    }

    /// Whether `piece` could be set with its anchor at `coord`.
    pub fn can_set(&self, coord: Coord, piece: Piece) -> bool {
        let probe = Occupant::new(self.next_piece_id(), piece);
        self.check_placement(coord, &probe).is_ok()
    }

    /// Places a new piece anchored at `coord` and returns its fresh identity.
    ///
    /// # Errors
    ///
    /// Fails when the footprint leaves the grid or overlaps another piece.
    pub fn set(&mut self, coord: Coord, piece: Piece) -> CoreResult<PieceId> {
        let occupant = Occupant::new(self.next_piece_id(), piece);
        self.place(coord, occupant)?;
        Ok(occupant.id)
    }

    /// Places an existing occupant anchored at `coord`, keeping its identity.
    ///
    /// # Errors
    ///
    /// Fails, in this order, when the footprint leaves the grid, the identity
    /// is already on the board, or a footprint cell is occupied.
    pub fn place(&mut self, coord: Coord, occupant: Occupant) -> CoreResult<()> {
        self.check_placement(coord, &occupant)?;
        trace!(%coord, %occupant, "Placing piece");
        for cell in Coord::square_range(coord, occupant.piece.size) {
            let index = self.index(cell);
            self.cells[index] = Some(occupant.id);
        }
        self.pieces.insert(
            occupant.id,
            Placement {
                piece: occupant.piece,
                anchor: coord,
            },
        );
        self.next_id = self.next_id.max(occupant.id.0 + 1);
        Ok(())
    }

    /// Removes the piece with identity `id`, clearing its footprint.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn remove(&mut self, id: PieceId) -> CoreResult<Occupant> {
        let placement = self
            .pieces
            .remove(&id)
            .ok_or_else(|| CoreError::board_op(BoardOperationError::NotOnBoard(id)))?;
        for cell in Coord::square_range(placement.anchor, placement.piece.size) {
            let index = self.index(cell);
            self.cells[index] = None;
        }
        trace!(anchor = %placement.anchor, %id, "Removed piece");
        Ok(Occupant::new(id, placement.piece))
    }

    /// Removes whichever piece covers `coord`.
    ///
    /// # Errors
    ///
    /// Fails when `coord` is out of range or empty.
    pub fn remove_at(&mut self, coord: Coord) -> CoreResult<Occupant> {
        let occupant = self
            .get(coord)?
            .ok_or_else(|| CoreError::board_op(BoardOperationError::EmptyCell(coord)))?;
        self.remove(occupant.id)
    }

    /// Removes every piece.
    pub fn clear(&mut self) {
        self.pieces.clear();
        self.cells.iter_mut().for_each(|cell| *cell = None);
    }

    /// Removes every piece and faces the board [`Orientation::Top`] again.
    pub fn reset(&mut self) {
        self.clear();
        self.orientation = Orientation::Top;
    }

    /// Fills every empty cell with a unit piece of `kind`.
    ///
    /// # Errors
    ///
    /// Propagates placement failures.
    pub fn fill(&mut self, kind: PieceType) -> CoreResult<()> {
        for coord in self.all_coords() {
            if self.is_empty_at(coord) {
                self.set(coord, Piece::unit(kind))?;
            }
        }
        Ok(())
    }

    /// Every occupant with its anchor, in row-major anchor order.
    pub fn occupants(&self) -> Vec<(Coord, Occupant)> {
        let mut all: Vec<_> = self
            .pieces
            .iter()
            .map(|(id, placement)| (placement.anchor, Occupant::new(*id, placement.piece)))
            .collect();
        all.sort_by_key(|(anchor, _)| *anchor);
        all
    }

    // ─────────────────────────────────────────────────────────────
    //  Rotation
    // ─────────────────────────────────────────────────────────────

    /// Rotates a cell coordinate a quarter turn counter-clockwise.
    pub fn rotate_coord_left(&self, c: Coord) -> Coord {
        Coord::new(self.size - c.row - 1, c.col)
    }

    /// Rotates a cell coordinate a quarter turn clockwise.
    pub fn rotate_coord_right(&self, c: Coord) -> Coord {
        Coord::new(c.row, self.size - c.col - 1)
    }

    /// Rotates a cell coordinate half a turn.
    pub fn flip_coord(&self, c: Coord) -> Coord {
        Coord::new(self.size - c.col - 1, self.size - c.row - 1)
    }

    /// Maps a coordinate expressed in `original` orientation into the current one.
    pub fn transport_coord(&self, coord: Coord, original: Orientation) -> Coord {
        match self.orientation.steps_from(original) {
            0 => coord,
            1 => self.rotate_coord_right(coord),
            2 => self.flip_coord(coord),
            _ => self.rotate_coord_left(coord),
        }
    }

    fn transform(&mut self, anchor_of: impl Fn(&Self, Coord, &Piece) -> Coord) {
        let moved: Vec<(PieceId, Placement)> = self
            .pieces
            .iter()
            .map(|(id, placement)| {
                let anchor = anchor_of(self, placement.anchor, &placement.piece);
                (
                    *id,
                    Placement {
                        piece: placement.piece,
                        anchor,
                    },
                )
            })
            .collect();
        self.cells.iter_mut().for_each(|cell| *cell = None);
        for (id, placement) in &moved {
            for cell in Coord::square_range(placement.anchor, placement.piece.size) {
                let index = self.index(cell);
                self.cells[index] = Some(*id);
            }
        }
        self.pieces = moved.into_iter().collect();
    }

    /// Rotates the whole board a quarter turn counter-clockwise.
    pub fn rotate_left(&mut self) {
        self.transform(|board, anchor, piece| {
            board.rotate_coord_left(anchor).offset(1 - piece.size, 0)
        });
        self.orientation = self.orientation.left_of();
        debug!(orientation = %self.orientation, "Rotated left");
    }

    /// Rotates the whole board a quarter turn clockwise.
    pub fn rotate_right(&mut self) {
        self.transform(|board, anchor, piece| {
            board.rotate_coord_right(anchor).offset(0, 1 - piece.size)
        });
        self.orientation = self.orientation.right_of();
        debug!(orientation = %self.orientation, "Rotated right");
    }

    /// Rotates a quarter turn in `dir`.
    pub fn rotate(&mut self, dir: RotationDir) {
        match dir {
            RotationDir::Left => self.rotate_left(),
            RotationDir::Right => self.rotate_right(),
        }
    }

    /// Rotates with the fewest quarter turns until facing `dest`.
    pub fn rotate_to(&mut self, dest: Orientation) {
        for dir in RotationDir::steps(self.orientation, dest) {
            self.rotate(*dir);
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Comparison and neighbourhood
    // ─────────────────────────────────────────────────────────────

    /// Value equality: same size and every cell empty in both or holding
    /// matching pieces in both. Identities are ignored.
    pub fn matches(&self, other: &Board) -> bool {
        self.size == other.size
            && self
                .all_coords()
                .all(|c| match (self.occupant_at(c), other.occupant_at(c)) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.matches(&b),
                    _ => false,
                })
    }

    /// Whether `a` and `b` match and touch edge to edge at distance `a.size`.
    pub fn is_matching_neighbour(&self, a: PieceId, b: PieceId) -> bool {
        let (Some(pa), Some(pb)) = (self.pieces.get(&a), self.pieces.get(&b)) else {
            return false;
        };
        if !pa.piece.matches(&pb.piece) {
            return false;
        }
        let (ca, cb) = (pa.anchor, pb.anchor);
        let size = pa.piece.size;
        ((ca.col - cb.col).abs() == size && ca.row == cb.row)
            || ((ca.row - cb.row).abs() == size && ca.col == cb.col)
    }

    /// Anchor-distance neighbours of a piece that lie on the grid.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn neighbouring_coords(&self, id: PieceId) -> CoreResult<Vec<Coord>> {
        let anchor = self.anchor_of(id)?;
        let size = self.piece(id).map(|p| p.size).unwrap_or(1);
        Ok([
            anchor.offset(0, -size),
            anchor.offset(0, size),
            anchor.offset(-size, 0),
            anchor.offset(size, 0),
        ]
        .into_iter()
        .filter(|c| !self.out_of_range(*c))
        .collect())
    }

    /// Adjacent pieces that match the piece `id`.
    ///
    /// # Errors
    ///
    /// Fails when the piece is not on the board.
    pub fn matching_neighbours(&self, id: PieceId) -> CoreResult<Vec<Occupant>> {
        Ok(self
            .neighbouring_coords(id)?
            .into_iter()
            .filter_map(|c| self.occupant_at(c))
            .filter(|neighbour| self.is_matching_neighbour(neighbour.id, id))
            .collect())
    }

    /// The 2×2 block of pieces sized like the one at `coord`.
    ///
    /// # Errors
    ///
    /// Fails when any of the four cells is out of range or empty.
    pub fn pieces_square(&self, coord: Coord) -> CoreResult<PiecesSquare> {
        let at = |c: Coord| -> CoreResult<Occupant> {
            self.get(c)?
                .ok_or_else(|| CoreError::board_op(BoardOperationError::EmptyCell(c)))
        };
        let p00 = at(coord)?;
        let size = p00.piece.size;
        Ok(PiecesSquare {
            p00,
            p10: at(coord.offset(size, 0))?,
            p01: at(coord.offset(0, size))?,
            p11: at(coord.offset(size, size))?,
        })
    }

    /// Verifies that the arena and the grid describe the same placement.
    ///
    /// # Errors
    ///
    /// Returns an invalid-board-state error describing the first mismatch.
    pub fn check_consistency(&self) -> CoreResult<()> {
        let mut covered = 0usize;
        for (id, placement) in &self.pieces {
            for cell in Coord::square_range(placement.anchor, placement.piece.size) {
                if self.out_of_range(cell) {
                    return Err(CoreError::board_state(format!(
                        "piece {} extends outside the board at {}",
                        id, cell
                    )));
                }
                if self.cells[self.index(cell)] != Some(*id) {
                    return Err(CoreError::board_state(format!(
                        "cell {} does not point at piece {}",
                        cell, id
                    )));
                }
                covered += 1;
            }
        }
        let occupied = self.cells.iter().filter(|c| c.is_some()).count();
        if occupied != covered {
            return Err(CoreError::board_state(format!(
                "{} cells occupied but pieces cover {}",
                occupied, covered
            )));
        }
        Ok(())
    }

    /// Type glyphs, top row first, `.` for empty cells.
    pub fn type_grid(&self) -> String {
        let mut grid = String::new();
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                match self.occupant_at(Coord::new(col, row)) {
                    Some(occupant) => grid.push_str(&occupant.piece.kind.glyph()),
                    None => grid.push('.'),
                }
            }
            grid.push('\n');
        }
        grid
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                match self.occupant_at(Coord::new(col, row)) {
                    Some(occupant) => write!(f, "{} ", occupant.piece)?,
                    None => write!(f, "[.] ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "orientation: {}", self.orientation)
    }
}

impl FromStr for Board {
    type Err = CoreError;

    /// Parses compact grid text such as `"01 11"`.
    fn from_str(s: &str) -> CoreResult<Self> {
        BoardBuilder::from_grid_text(s)
    }
}

/// Serialized board, in any of the three accepted forms.
///
/// Serialization always writes `size`, `rows` (with piece identities),
/// `orientation` and `next_id`. Deserialization reads the first of `rows`,
/// `pointers` (which needs `size`), or `compact` present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardDef {
    /// Side length; required by the pointer form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i32>,
    /// Cell pieces, top row first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<Option<BoardCell>>>>,
    /// `"type/size->col:row"` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointers: Option<Vec<String>>,
    /// Compact grid text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact: Option<String>,
    /// Orientation the cells are expressed in; top when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Lowest identity the board may hand out next.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u64>,
}

impl From<Board> for BoardDef {
    fn from(board: Board) -> Self {
        let rows = (0..board.size)
            .rev()
            .map(|row| {
                (0..board.size)
                    .map(|col| board.occupant_at(Coord::new(col, row)).map(BoardCell::from))
                    .collect()
            })
            .collect();
        Self {
            size: Some(board.size),
            rows: Some(rows),
            pointers: None,
            compact: None,
            orientation: Some(board.orientation),
            next_id: Some(board.next_id),
        }
    }
}

impl TryFrom<BoardDef> for Board {
    type Error = CoreError;

    #[instrument(skip(def))]
    fn try_from(def: BoardDef) -> CoreResult<Self> {
        let mut board = if let Some(rows) = &def.rows {
            BoardBuilder::from_cells(rows)?
        } else if let Some(pointers) = &def.pointers {
            let size = def
                .size
                .ok_or_else(|| CoreError::parse("pointer board definition needs a size"))?;
            BoardBuilder::from_pointers(pointers, size)?
        } else if let Some(compact) = &def.compact {
            BoardBuilder::from_grid_text(compact)?
        } else {
            return Err(CoreError::parse(
                "board definition needs one of rows, pointers or compact",
            ));
        };
        board.orientation = def.orientation.unwrap_or_default();
        if let Some(next_id) = def.next_id {
            board.next_id = board.next_id.max(next_id);
        }
        Ok(board)
    }
}
