//! First-class invariants for boards and games.
//!
//! Invariants are logical properties that must hold after every committed
//! move. They are checked in debug builds and can be tested independently.

use tracing::warn;

use crate::{CoreError, CoreResult, Game};

mod board_consistent;
mod board_stable;
mod checks;
mod contracts;
mod journal_framed;

pub use board_consistent::BoardConsistentInvariant;
pub use board_stable::BoardStableInvariant;
pub use checks::{BoardUnchanged, PieceCountCheck};
pub use contracts::{Contract, ExecuteContract};
pub use journal_framed::JournalFramedInvariant;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implementations are provided for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariants of a board between moves.
pub type BoardInvariants = (BoardConsistentInvariant, BoardStableInvariant);

/// All game invariants as a composable set.
pub type GameInvariants = (
    BoardConsistentInvariant,
    BoardStableInvariant,
    JournalFramedInvariant,
);

pub(crate) fn describe(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(|v| v.description.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks [`GameInvariants`], reporting violations as an invalid board state.
///
/// # Errors
///
/// Fails when any invariant is violated.
pub fn check_game(game: &Game) -> CoreResult<()> {
    GameInvariants::check_all(game).map_err(|violations| {
        let descriptions = describe(&violations);
        warn!(%descriptions, "Game invariants violated");
        CoreError::board_state(format!("Invariant violated: {}", descriptions))
    })
}
