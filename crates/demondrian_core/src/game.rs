//! A running game: board, rules, palette, incoming queue and move journal.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::invariants::{Contract, ExecuteContract, PieceCountCheck, check_game};
use crate::{
    Board, BoardAction, BoardOperationError, Coord, CoreError, CoreResult, GameRules,
    IncomingQueue, Move, MoveSimulator, NextTypePolicy, Orientation, Piece, PieceType,
    PotentialMove, RotationDir,
};

#[derive(Debug, Clone)]
struct JournalEntry {
    played: Move,
    orientation: Orientation,
}

/// Game state with undo.
///
/// Every committed move is journaled together with the orientation the board
/// had before it, so [`Game::undo`] returns the board to exactly where the
/// player left it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GameSnapshot", try_from = "GameSnapshot")]
pub struct Game {
    board: Board,
    rules: GameRules,
    types: Vec<PieceType>,
    incoming: IncomingQueue,
    journal: Vec<JournalEntry>,
}

impl Game {
    /// Starts a game on `board`.
    ///
    /// # Errors
    ///
    /// Fails with an invalid game state when `types` is empty.
    #[instrument(skip(board, types), fields(size = board.size(), types = types.len()))]
    pub fn new(board: Board, rules: GameRules, types: Vec<PieceType>) -> CoreResult<Self> {
        if types.is_empty() {
            return Err(CoreError::game_state("Empty or null types"));
        }
        let incoming = IncomingQueue::new(&rules, &types);
        Ok(Self {
            board,
            rules,
            types,
            incoming,
            journal: Vec::new(),
        })
    }

    /// Starts a game on an empty board of `size`.
    ///
    /// # Errors
    ///
    /// Fails when `size` is not positive or `types` is empty.
    pub fn with_size(size: i32, rules: GameRules, types: Vec<PieceType>) -> CoreResult<Self> {
        Self::new(Board::new(size)?, rules, types)
    }

    /// Replaces the incoming queue, e.g. with a seeded one.
    pub fn with_incoming(mut self, incoming: IncomingQueue) -> Self {
        self.incoming = incoming;
        self
    }

    /// The live board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The rules in force.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// The palette.
    pub fn types(&self) -> &[PieceType] {
        &self.types
    }

    /// The incoming queue.
    pub fn incoming(&self) -> &IncomingQueue {
        &self.incoming
    }

    /// Mutable access to the incoming queue, for lookahead queries.
    pub fn incoming_mut(&mut self) -> &mut IncomingQueue {
        &mut self.incoming
    }

    /// Current board orientation.
    pub fn orientation(&self) -> Orientation {
        self.board.orientation()
    }

    /// Whether a single piece covers the whole board.
    pub fn is_solved(&self) -> bool {
        self.board
            .occupant_at(Coord::ORIGIN)
            .is_some_and(|occupant| occupant.piece.size == self.board.size())
    }

    /// Committed moves, oldest first.
    pub fn history(&self) -> Vec<&Move> {
        self.journal.iter().map(|entry| &entry.played).collect()
    }

    /// Number of committed moves.
    pub fn num_moves(&self) -> usize {
        self.journal.len()
    }

    /// The most recent move.
    pub fn last_move(&self) -> Option<&Move> {
        self.journal.last().map(|entry| &entry.played)
    }

    /// The piece that playing `potential_move` would insert.
    ///
    /// Under [`NextTypePolicy::RemovedType`] it is the clicked piece itself;
    /// otherwise the next queued type at the clicked piece's size.
    ///
    /// # Errors
    ///
    /// Fails when the move's cell is out of range or empty, or the queue has
    /// nothing to offer.
    pub fn next_piece_if_playing(&mut self, potential_move: PotentialMove) -> CoreResult<Piece> {
        let coord = self
            .board
            .transport_coord(potential_move.coord, potential_move.orientation);
        let clicked = self.board.get(coord)?.ok_or_else(|| {
            CoreError::board_op(BoardOperationError::EmptyCell(coord))
        })?;
        if self.rules.next_type_policy == NextTypePolicy::RemovedType {
            return Ok(clicked.piece);
        }
        let kind = self
            .incoming
            .peek_next()
            .ok_or_else(|| CoreError::game_state("Incoming queue is empty"))?;
        Ok(Piece::new(kind, clicked.piece.size))
    }

    /// Simulates and commits `potential_move`, then advances the queue.
    ///
    /// # Errors
    ///
    /// Fails when the move is blocked or its cell is empty. In debug builds
    /// the move contract's postcondition and the game invariants are also
    /// checked.
    #[instrument(skip(self), fields(moves = self.journal.len()))]
    pub fn execute(&mut self, potential_move: PotentialMove) -> CoreResult<&Move> {
        ExecuteContract::pre(&self.board, &potential_move)?;
        let next_piece = self.next_piece_if_playing(potential_move)?;
        let mut simulator =
            MoveSimulator::from_potential_move(&self.board, potential_move, next_piece)?;
        simulator.simulate()?;
        let played = simulator.into_move()?;

        #[cfg(debug_assertions)]
        let before = self.board.clone();
        let count_check = PieceCountCheck::new(&self.board, -3 * played.merges() as isize);
        let orientation = self.board.orientation();
        played.apply(&mut self.board)?;
        count_check.verify(&self.board)?;

        self.journal.push(JournalEntry {
            played,
            orientation,
        });
        self.incoming.next();

        #[cfg(debug_assertions)]
        {
            ExecuteContract::post(&before, &self.board)?;
            check_game(self)?;
        }
        debug!(moves = self.journal.len(), solved = self.is_solved(), "Move committed");

        let index = self.journal.len() - 1;
        Ok(&self.journal[index].played)
    }

    /// Whether the rules allow undo and a move has been played.
    pub fn can_undo(&self) -> bool {
        self.rules.allow_undo && !self.journal.is_empty()
    }

    /// Reverts the most recent move and restores the orientation the board
    /// had before it.
    ///
    /// The rules' `allow_undo` flag is only reported by [`Game::can_undo`];
    /// it does not stop this call. On failure the board and the journal are
    /// left as they were.
    ///
    /// # Errors
    ///
    /// Fails when there is nothing to undo or the move does not revert
    /// cleanly on the current board.
    #[instrument(skip(self), fields(moves = self.journal.len()))]
    pub fn undo(&mut self) -> CoreResult<Move> {
        let before = self.board.clone();
        match self.revert_last() {
            Ok(played) => Ok(played),
            Err(e) => {
                warn!(error = %e, "Undo failed, board restored");
                self.board = before;
                Err(e)
            }
        }
    }

    /// Reverts the most recent move in place. The solver backtracks with this.
    ///
    /// The journal entry stays when its revert fails.
    pub(crate) fn revert_last(&mut self) -> CoreResult<Move> {
        let entry = self
            .journal
            .pop()
            .ok_or_else(|| CoreError::game_op("No move to undo"))?;
        if let Err(e) = entry.played.revert(&mut self.board) {
            self.journal.push(entry);
            return Err(e);
        }
        self.board.rotate_to(entry.orientation);
        self.incoming.undo();
        Ok(entry.played)
    }

    /// One quarter turn.
    pub fn rotate(&mut self, dir: RotationDir) {
        self.board.rotate(dir);
    }

    /// Turns the board to face `dest`.
    pub fn rotate_to(&mut self, dest: Orientation) {
        self.board.rotate_to(dest);
    }

    /// New game on a copy of this board with a fresh queue and no history.
    pub fn clone_fresh(&self) -> Self {
        Self {
            board: self.board.clone(),
            rules: self.rules,
            types: self.types.clone(),
            incoming: IncomingQueue::new(&self.rules, &self.types),
            journal: Vec::new(),
        }
    }

    /// Clears the board and history and restarts the queue.
    pub fn reset(&mut self) {
        self.journal.clear();
        self.board.reset();
        self.incoming.reset();
    }

    /// Same board contents and the same number of moves.
    pub fn matches(&self, other: &Game) -> bool {
        self.board.matches(&other.board) && self.journal.len() == other.journal.len()
    }
}

/// Serialized form of a [`Game`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The palette.
    pub types: Vec<PieceType>,
    /// The live board.
    pub board: Board,
    /// Rules in force; classic when absent.
    #[serde(default)]
    pub rules: GameRules,
    /// Committed moves, oldest first.
    #[serde(default)]
    pub moves: Vec<Move>,
    /// Orientation the board had before each move; when missing, a move is
    /// undone into its own orientation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orientations: Vec<Orientation>,
}

impl From<Game> for GameSnapshot {
    fn from(game: Game) -> Self {
        Self {
            types: game.types,
            board: game.board,
            rules: game.rules,
            orientations: game.journal.iter().map(|entry| entry.orientation).collect(),
            moves: game.journal.into_iter().map(|entry| entry.played).collect(),
        }
    }
}

impl TryFrom<GameSnapshot> for Game {
    type Error = CoreError;

    fn try_from(snapshot: GameSnapshot) -> Result<Self, Self::Error> {
        let mut game = Game::new(snapshot.board, snapshot.rules, snapshot.types)?;
        for (index, played) in snapshot.moves.into_iter().enumerate() {
            let orientation = match snapshot.orientations.get(index) {
                Some(orientation) => *orientation,
                None => played
                    .consequences
                    .iter()
                    .find_map(|action| match action {
                        BoardAction::Orientate { orientation } => Some(*orientation),
                        _ => None,
                    })
                    .unwrap_or_default(),
            };
            game.journal.push(JournalEntry {
                played,
                orientation,
            });
        }
        Ok(game)
    }
}
