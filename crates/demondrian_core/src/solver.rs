//! Depth-first backtracking solver.
//!
//! The search walks an explicit stack of frames instead of recursing, so
//! deep puzzles cannot overflow the call stack. Branch order and budget checks
//! follow the recursive definition exactly:
//!
//! 1. a solved node yields [`SolveResult::Solvable`] with the path to it;
//! 2. otherwise the iteration counter is bumped and, past the budget, the
//!    search stops with [`SolveResult::Cancelled`];
//! 3. a node at the move limit backtracks;
//! 4. otherwise each available move is played and explored in turn.

use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::invariants::{BoardUnchanged, Contract, ExecuteContract};
use crate::{CoreResult, Game, PlayLogic, PotentialMove};

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "moves")]
pub enum SolveResult {
    /// A solution, as the moves leading to it.
    Solvable(Vec<PotentialMove>),
    /// Every branch was exhausted without a solution.
    BackTracked,
    /// The iteration budget ran out; carries the path being explored.
    Cancelled(Vec<PotentialMove>),
}

impl SolveResult {
    /// Moves carried by the result; empty when backtracked.
    pub fn moves(&self) -> &[PotentialMove] {
        match self {
            SolveResult::Solvable(moves) | SolveResult::Cancelled(moves) => moves,
            SolveResult::BackTracked => &[],
        }
    }

    /// Whether a solution was found.
    pub fn is_solvable(&self) -> bool {
        matches!(self, SolveResult::Solvable(_))
    }

    /// Whether the search proved there is no solution within the move limit.
    pub fn is_unsolvable(&self) -> bool {
        matches!(self, SolveResult::BackTracked)
    }

    /// Whether the iteration budget ran out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SolveResult::Cancelled(_))
    }

    /// Solvable or cancelled: the search should stop.
    pub fn is_finished(&self) -> bool {
        !self.is_unsolvable()
    }

    fn state_name(&self) -> &'static str {
        match self {
            SolveResult::Solvable(_) => "Solvable",
            SolveResult::BackTracked => "BackTracked",
            SolveResult::Cancelled(_) => "Cancelled",
        }
    }
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let moves = self
            .moves()
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "state: {}, moves: {}", self.state_name(), moves)
    }
}

/// Search budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct SolveLimits {
    /// Maximum number of visited nodes.
    pub max_iterations: u64,
    /// Maximum path length.
    pub max_moves: usize,
}

impl Default for SolveLimits {
    fn default() -> Self {
        Self {
            max_iterations: u64::MAX,
            max_moves: 100,
        }
    }
}

/// Stack frame for the iterative search.
struct Frame {
    /// Moves available at this node, in enumeration order
    moves: Vec<PotentialMove>,
    /// Index of the next move to try
    next: usize,
    /// Board snapshot checked after each backtrack, debug builds only
    guard: Option<BoardUnchanged>,
}

enum Visit {
    Finished(SolveResult),
    Dead,
    Expand(Frame),
}

/// Finds a sequence of moves that solves a game.
#[derive(Debug, Clone)]
pub struct Solver {
    game: Game,
    current_iterations: u64,
    max_iterations: u64,
    max_moves: usize,
}

impl Solver {
    /// Solver over a fresh copy of `game`: same board, new queue, no history.
    pub fn new(game: &Game) -> Self {
        let limits = SolveLimits::default();
        Self {
            game: game.clone_fresh(),
            current_iterations: 0,
            max_iterations: limits.max_iterations,
            max_moves: limits.max_moves,
        }
    }

    /// Nodes visited so far.
    pub fn current_iterations(&self) -> u64 {
        self.current_iterations
    }

    /// Budget of the last search.
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Path limit of the last search.
    pub fn max_moves(&self) -> usize {
        self.max_moves
    }

    /// The solver's game. After a solvable result it shows the solved board.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Searches with [`SolveLimits`].
    ///
    /// # Errors
    ///
    /// Fails when the board is not full or the game rejects a move.
    pub fn solve_with(&mut self, limits: SolveLimits) -> CoreResult<SolveResult> {
        self.solve(limits.max_iterations, limits.max_moves)
    }

    /// Searches depth first for a solution.
    ///
    /// # Errors
    ///
    /// Fails when the board is not full or the game rejects a move.
    #[instrument(skip(self), fields(size = self.game.board().size()))]
    pub fn solve(&mut self, max_iterations: u64, max_moves: usize) -> CoreResult<SolveResult> {
        self.max_iterations = max_iterations;
        self.max_moves = max_moves;
        self.current_iterations = 0;
        let result = self.search()?;
        info!(
            state = result.state_name(),
            moves = result.moves().len(),
            iterations = self.current_iterations,
            "Search finished"
        );
        Ok(result)
    }

    fn visit(&mut self, path: &[PotentialMove]) -> CoreResult<Visit> {
        if self.game.is_solved() {
            return Ok(Visit::Finished(SolveResult::Solvable(path.to_vec())));
        }
        self.current_iterations += 1;
        if self.current_iterations > self.max_iterations {
            return Ok(Visit::Finished(SolveResult::Cancelled(path.to_vec())));
        }
        if path.len() >= self.max_moves {
            return Ok(Visit::Dead);
        }
        let moves = PlayLogic::new(self.game.board()).available_moves()?;
        trace!(depth = path.len(), moves = moves.len(), "Expanding node");
        let guard = cfg!(debug_assertions).then(|| BoardUnchanged::new(self.game.board()));
        Ok(Visit::Expand(Frame {
            moves,
            next: 0,
            guard,
        }))
    }

    fn backtrack(
        &mut self,
        path: &mut Vec<PotentialMove>,
        guard: Option<&BoardUnchanged>,
    ) -> CoreResult<()> {
        self.game.revert_last()?;
        path.pop();
        if let Some(guard) = guard {
            guard.verify(self.game.board())?;
        }
        Ok(())
    }

    fn search(&mut self) -> CoreResult<SolveResult> {
        let mut path = Vec::new();
        let mut stack = match self.visit(&path)? {
            Visit::Finished(result) => return Ok(result),
            Visit::Dead => return Ok(SolveResult::BackTracked),
            Visit::Expand(frame) => vec![frame],
        };

        while let Some(frame) = stack.last_mut() {
            let Some(&mv) = frame.moves.get(frame.next) else {
                stack.pop();
                if stack.is_empty() {
                    break;
                }
                debug!(depth = path.len(), "Branch exhausted");
                let guard = stack.last().and_then(|parent| parent.guard.as_ref());
                self.backtrack(&mut path, guard)?;
                continue;
            };
            frame.next += 1;
            debug_assert!(ExecuteContract::pre(self.game.board(), &mv).is_ok());

            self.game.execute(mv)?;
            path.push(mv);
            match self.visit(&path)? {
                Visit::Finished(result) => return Ok(result),
                Visit::Dead => {
                    let guard = stack.last().and_then(|parent| parent.guard.as_ref());
                    self.backtrack(&mut path, guard)?;
                }
                Visit::Expand(child) => stack.push(child),
            }
        }
        Ok(SolveResult::BackTracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, GameRules, PieceType};

    fn solver(text: &str) -> Solver {
        let board: Board = text.parse().expect("board");
        let game = Game::new(board, GameRules::classic(), PieceType::range(0, 3)).expect("game");
        Solver::new(&game)
    }

    #[test]
    fn test_already_solved_needs_no_moves() {
        let mut solver = solver("00 00");
        let result = solver.solve(10, 10).expect("solve");
        assert_eq!(result, SolveResult::Solvable(Vec::new()));
        assert_eq!(solver.current_iterations(), 0);
    }

    #[test]
    fn test_blocked_board_backtracks() {
        let result = solver("01 01").solve(10_000, 100).expect("solve");
        assert_eq!(result, SolveResult::BackTracked);
        assert!(result.moves().is_empty());
        assert!(!result.is_finished());
    }

    #[test]
    fn test_budget_cancels() {
        let mut solver = solver("0101 1010 0101 1010");
        let result = solver.solve(10, 100).expect("solve");
        assert!(result.is_cancelled());
        assert_eq!(solver.current_iterations(), 11);
        assert_eq!(solver.max_iterations(), 10);
    }

    #[test]
    fn test_zero_move_limit_backtracks() {
        let result = solver("01 11").solve(10_000, 0).expect("solve");
        assert_eq!(result, SolveResult::BackTracked);
    }

    #[test]
    fn test_display() {
        assert_eq!(SolveResult::BackTracked.to_string(), "state: BackTracked, moves: ");
        let json = serde_json::to_value(SolveResult::Solvable(Vec::new())).expect("serialize");
        assert_eq!(json["state"], "Solvable");
    }

    #[test]
    fn test_default_limits() {
        let limits = SolveLimits::default();
        assert_eq!(limits.max_iterations, u64::MAX);
        assert_eq!(limits.max_moves, 100);
    }
}
