//! Board construction from textual, grid and JSON representations.

use tracing::{debug, instrument, warn};

use crate::{
    Board, BoardCell, BoardCompactor, BoardOperationError, Coord, CoreError, CoreResult, Occupant,
    Piece, PieceType,
};

/// Builds boards from their external representations.
pub struct BoardBuilder;

impl BoardBuilder {
    /// Parses whitespace-insensitive digit text into rows of type indices,
    /// top row first.
    ///
    /// # Errors
    ///
    /// Fails when the digit count is not a perfect square or a character is
    /// not a digit.
    #[instrument]
    pub fn string_to_type_grid(text: &str) -> CoreResult<Vec<Vec<u32>>> {
        let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let size = (digits.len() as f64).sqrt() as usize;
        if size * size != digits.len() {
            return Err(CoreError::board_op(BoardOperationError::MalformedGrid(
                text.to_string(),
            )));
        }
        let indices = digits
            .iter()
            .map(|c| {
                c.to_digit(10).ok_or_else(|| {
                    CoreError::board_op(BoardOperationError::MalformedGrid(text.to_string()))
                })
            })
            .collect::<CoreResult<Vec<u32>>>()?;
        Ok(indices.chunks(size.max(1)).map(<[u32]>::to_vec).collect())
    }

    /// Builds and compacts a board from grid text such as `"0011 0011 2222 1212"`.
    ///
    /// # Errors
    ///
    /// Fails on malformed text or an empty grid.
    #[instrument]
    pub fn from_grid_text(text: &str) -> CoreResult<Board> {
        let grid = Self::string_to_type_grid(text)?;
        Self::from_type_grid(&grid)
    }

    /// Builds and compacts a board of unit pieces. `grid[0]` is the top row.
    ///
    /// # Errors
    ///
    /// Fails when the grid is empty or not square.
    #[instrument(skip(grid), fields(rows = grid.len()))]
    pub fn from_type_grid(grid: &[Vec<u32>]) -> CoreResult<Board> {
        let size = grid.len() as i32;
        let mut board = Board::new(size)?;
        if grid.iter().any(|row| row.len() != grid.len()) {
            return Err(CoreError::board_op(BoardOperationError::MalformedGrid(
                format!("{:?}", grid),
            )));
        }
        for coord in board.all_coords() {
            let index = grid[(size - coord.row - 1) as usize][coord.col as usize];
            board.set(coord, Piece::unit(PieceType::Normal(index)))?;
        }
        let merges = BoardCompactor::compact(&mut board)?;
        debug!(size, merges, "Built board from type grid");
        Ok(board)
    }

    /// Builds a board from `"type/size->col:row"` entries.
    ///
    /// Entries that do not follow the pattern are skipped. No compaction is
    /// performed.
    ///
    /// # Errors
    ///
    /// Fails on a bad size or when a piece cannot be placed.
    #[instrument(skip(pointers), fields(count = pointers.len()))]
    pub fn from_pointers(pointers: &[String], size: i32) -> CoreResult<Board> {
        let mut board = Board::new(size)?;
        for pointer in pointers {
            match Self::parse_pointer(pointer) {
                Some((piece, coord)) => {
                    board.set(coord, piece)?;
                }
                None => warn!(%pointer, "Skipping malformed board pointer"),
            }
        }
        Ok(board)
    }

    fn parse_pointer(pointer: &str) -> Option<(Piece, Coord)> {
        let (piece, coord) = pointer.trim().split_once("->")?;
        let (kind, size) = piece.split_once('/')?;
        let (col, row) = coord.split_once(':')?;
        let number = |s: &str| s.trim().parse::<u32>().ok();
        Some((
            Piece::new(PieceType::Normal(number(kind)?), number(size)? as i32),
            Coord::new(number(col)? as i32, number(row)? as i32),
        ))
    }

    /// Builds a board from per-cell pieces, top row first.
    ///
    /// Every piece gets a fresh identity. See [`BoardBuilder::from_cells`].
    ///
    /// # Errors
    ///
    /// Fails when the rows are not square or a covered cell disagrees with the
    /// piece covering it.
    pub fn from_rows(rows: &[Vec<Option<Piece>>]) -> CoreResult<Board> {
        let cells: Vec<Vec<Option<BoardCell>>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.map(BoardCell::from)).collect())
            .collect();
        Self::from_cells(&cells)
    }

    /// Builds a board from per-cell pieces with optional identities, top row
    /// first.
    ///
    /// Cells are visited from the origin rightwards and upwards, so the first
    /// cell of a larger piece met is its anchor; the remaining cells it covers
    /// are skipped. Cells naming an identity are placed first and keep it, then
    /// the anonymous ones get fresh identities. `None` cells stay empty.
    ///
    /// # Errors
    ///
    /// Fails when the rows are not square, a covered cell disagrees with the
    /// piece covering it, or one identity names two pieces.
    #[instrument(skip(rows), fields(rows = rows.len()))]
    pub fn from_cells(rows: &[Vec<Option<BoardCell>>]) -> CoreResult<Board> {
        let size = i32::try_from(rows.len())
            .map_err(|_| CoreError::board_state(format!("{} rows is too many", rows.len())))?;
        let mut board = Board::new(size)?;
        if rows.iter().any(|r| r.len() != rows.len()) {
            return Err(CoreError::board_op(BoardOperationError::MalformedGrid(
                "rows are not square".to_string(),
            )));
        }
        for named in [true, false] {
            for coord in board.all_coords() {
                let Some(cell) = rows[(size - coord.row - 1) as usize][coord.col as usize] else {
                    continue;
                };
                if cell.id.is_some() != named {
                    continue;
                }
                match board.occupant_at(coord) {
                    Some(covering)
                        if covering.piece == cell.piece
                            && cell.id.is_none_or(|id| id == covering.id) =>
                    {
                        continue;
                    }
                    Some(covering) => {
                        return Err(CoreError::board_op(BoardOperationError::MalformedGrid(
                            format!("{} found inside {} at {}", cell.piece, covering, coord),
                        )));
                    }
                    None => match cell.id {
                        Some(id) => board.place(coord, Occupant::new(id, cell.piece))?,
                        None => {
                            board.set(coord, cell.piece)?;
                        }
                    },
                }
            }
        }
        Ok(board)
    }

    /// A copy of `board` with every anchor and piece size multiplied by `scale`.
    ///
    /// # Errors
    ///
    /// Fails when `scale < 1`, or when a scaled piece size is not a power of
    /// two.
    #[instrument(skip(board), fields(size = board.size()))]
    pub fn clone_scaled(board: &Board, scale: i32) -> CoreResult<Board> {
        if scale < 1 {
            return Err(CoreError::board_state(format!(
                "scale must be >= 1, got {}",
                scale
            )));
        }
        let mut clone = Board::new(board.size() * scale)?;
        for (anchor, occupant) in board.occupants() {
            let scaled = Piece::new(occupant.piece.kind, occupant.piece.size * scale);
            clone.set(Coord::new(anchor.col * scale, anchor.row * scale), scaled)?;
        }
        Ok(clone)
    }
}
