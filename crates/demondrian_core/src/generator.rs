//! Random board generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::{Board, BoardCompactor, CoreError, CoreResult, Piece, PieceType};

/// Fills boards with uniformly random unit pieces.
#[derive(Debug, Clone)]
pub struct BoardGenerator {
    rng: StdRng,
}

impl BoardGenerator {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A `size` board with every cell drawn uniformly from `types`, merged
    /// until stable when `compact` is set.
    ///
    /// # Errors
    ///
    /// Fails when `size` is not positive or `types` is empty.
    #[instrument(skip(self, types), fields(types = types.len()))]
    pub fn generate(&mut self, size: i32, types: &[PieceType], compact: bool) -> CoreResult<Board> {
        if types.is_empty() {
            return Err(CoreError::game_state("Empty or null types"));
        }
        let mut board = Board::new(size)?;
        for coord in board.all_coords() {
            let kind = types[self.rng.random_range(0..types.len())];
            board.set(coord, Piece::unit(kind))?;
        }
        if compact {
            let merges = BoardCompactor::compact(&mut board)?;
            debug!(merges, pieces = board.piece_count(), "Generated board");
        }
        Ok(board)
    }

    /// Like [`BoardGenerator::generate`] over the palette `0..type_count`,
    /// compacted.
    ///
    /// # Errors
    ///
    /// Fails when `size` is not positive or `type_count` is zero.
    pub fn generate_with_type_count(&mut self, size: i32, type_count: u32) -> CoreResult<Board> {
        self.generate(size, &PieceType::range(0, type_count), true)
    }
}

impl Default for BoardGenerator {
    fn default() -> Self {
        Self::new()
    }
}
