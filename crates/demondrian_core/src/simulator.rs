//! Turns a candidate click into the ordered actions it causes.
//!
//! The simulator works on its own clone of the board, so simulating never
//! touches the caller's board. It moves from pending to either blocked (with
//! the obstacles that prevent the move) or ready (with the resulting move).

use tracing::{debug, instrument};

use crate::{
    Board, BoardAction, BoardCompactor, BoardOperationError, Coord, CoreError, CoreResult, Move,
    Occupant, Piece, PlayLogic, PotentialMove,
};

/// Progress of a [`MoveSimulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationState {
    /// Not simulated yet.
    Pending,
    /// The move cannot be played because of these pieces.
    Blocked(Vec<Occupant>),
    /// The move can be played and causes these actions.
    Ready(Move),
}

/// Simulates one click on a private copy of a board.
#[derive(Debug, Clone)]
pub struct MoveSimulator {
    board: Board,
    next_piece: Piece,
    old_piece: Occupant,
    move_coord: Coord,
    state: SimulationState,
}

impl MoveSimulator {
    /// Simulator for a click at `coord` in the board's current orientation.
    ///
    /// # Errors
    ///
    /// Fails when `coord` is out of range or empty.
    #[instrument(skip(board), fields(orientation = %board.orientation()))]
    pub fn from_coord(board: &Board, coord: Coord, next_piece: Piece) -> CoreResult<Self> {
        Self::with_board(board.clone(), coord, next_piece)
    }

    /// Simulator for `potential_move`; the private board is first turned to
    /// the move's orientation.
    ///
    /// # Errors
    ///
    /// Fails when the move's coordinate is out of range or empty.
    #[instrument(skip(board), fields(orientation = %board.orientation()))]
    pub fn from_potential_move(
        board: &Board,
        potential_move: PotentialMove,
        next_piece: Piece,
    ) -> CoreResult<Self> {
        let mut rotated = board.clone();
        rotated.rotate_to(potential_move.orientation);
        Self::with_board(rotated, potential_move.coord, next_piece)
    }

    fn with_board(board: Board, coord: Coord, next_piece: Piece) -> CoreResult<Self> {
        let old_piece = board
            .get(coord)?
            .ok_or_else(|| CoreError::board_op(BoardOperationError::EmptyCell(coord)))?;
        let move_coord = board.anchor_of(old_piece.id)?;
        Ok(Self {
            board,
            next_piece,
            old_piece,
            move_coord,
            state: SimulationState::Pending,
        })
    }

    /// The clicked piece.
    pub fn old_piece(&self) -> Occupant {
        self.old_piece
    }

    /// Anchor of the clicked piece in the simulated orientation.
    pub fn move_coord(&self) -> Coord {
        self.move_coord
    }

    /// The piece that will be inserted.
    pub fn next_piece(&self) -> Piece {
        self.next_piece
    }

    /// The private board, showing the outcome once simulated.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current progress.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Whether [`MoveSimulator::simulate`] has run.
    pub fn is_simulated(&self) -> bool {
        !matches!(self.state, SimulationState::Pending)
    }

    /// Runs the simulation. Does nothing when already simulated.
    ///
    /// # Errors
    ///
    /// Propagates board failures while generating actions.
    #[instrument(skip(self), fields(coord = %self.move_coord, piece = %self.old_piece))]
    pub fn simulate(&mut self) -> CoreResult<()> {
        if self.is_simulated() {
            return Ok(());
        }
        let obstacles = PlayLogic::new(&self.board).all_obstacles(self.move_coord)?;
        if !obstacles.is_empty() {
            debug!(count = obstacles.len(), "Move blocked");
            self.state = SimulationState::Blocked(obstacles);
            return Ok(());
        }
        let actions = self.generate_actions()?;
        debug!(actions = actions.len(), "Move simulated");
        self.state = SimulationState::Ready(Move::new(actions));
        Ok(())
    }

    fn execute(&mut self, actions: &mut Vec<BoardAction>, action: BoardAction) -> CoreResult<()> {
        action.apply(&mut self.board)?;
        actions.push(action);
        Ok(())
    }

    fn generate_actions(&mut self) -> CoreResult<Vec<BoardAction>> {
        let mut actions = Vec::new();
        let orientation = self.board.orientation();
        self.execute(&mut actions, BoardAction::Orientate { orientation })?;

        let droppables = PlayLogic::new(&self.board).droppables_above(self.old_piece.id)?;
        self.execute(
            &mut actions,
            BoardAction::Remove {
                coord: self.move_coord,
                removed: self.old_piece,
            },
        )?;

        let rows = self.old_piece.piece.size;
        for piece in droppables {
            let coord = self.board.anchor_of(piece.id)?;
            self.execute(&mut actions, BoardAction::Fall { rows, coord, piece })?;
        }

        let new_piece = Occupant::new(self.board.next_piece_id(), self.next_piece);
        let coord = Coord::new(self.move_coord.col, self.board.size() - rows);
        self.execute(&mut actions, BoardAction::NewPiece { coord, new_piece })?;

        while let Some(coord) = BoardCompactor::next_compactable(&self.board) {
            let removed = self.board.pieces_square(coord)?;
            let big_piece = Occupant::new(self.board.next_piece_id(), removed.p00.piece.double_size());
            self.execute(
                &mut actions,
                BoardAction::Compact {
                    coord,
                    big_piece,
                    removed,
                },
            )?;
        }

        let orientation = self.board.orientation();
        self.execute(&mut actions, BoardAction::Orientate { orientation })?;
        Ok(actions)
    }

    fn not_simulated() -> CoreError {
        CoreError::game_op("Move has not been simulated yet")
    }

    /// Pieces preventing the move; empty when the move is possible.
    ///
    /// # Errors
    ///
    /// Fails before simulation.
    pub fn obstacles(&self) -> CoreResult<&[Occupant]> {
        match &self.state {
            SimulationState::Pending => Err(Self::not_simulated()),
            SimulationState::Blocked(obstacles) => Ok(obstacles),
            SimulationState::Ready(_) => Ok(&[]),
        }
    }

    /// Whether the simulated move can be played.
    ///
    /// # Errors
    ///
    /// Fails before simulation.
    pub fn is_move_possible(&self) -> CoreResult<bool> {
        match &self.state {
            SimulationState::Pending => Err(Self::not_simulated()),
            SimulationState::Blocked(_) => Ok(false),
            SimulationState::Ready(_) => Ok(true),
        }
    }

    /// The simulated move.
    ///
    /// # Errors
    ///
    /// Fails before simulation or when the move is blocked.
    pub fn get_move(&self) -> CoreResult<&Move> {
        match &self.state {
            SimulationState::Pending => Err(Self::not_simulated()),
            SimulationState::Blocked(_) => Err(CoreError::game_op("Move is not possible")),
            SimulationState::Ready(mv) => Ok(mv),
        }
    }

    /// Consumes the simulator and returns the simulated move.
    ///
    /// # Errors
    ///
    /// Fails before simulation or when the move is blocked.
    pub fn into_move(self) -> CoreResult<Move> {
        match self.state {
            SimulationState::Pending => Err(Self::not_simulated()),
            SimulationState::Blocked(_) => Err(CoreError::game_op("Move is not possible")),
            SimulationState::Ready(mv) => Ok(mv),
        }
    }
}
