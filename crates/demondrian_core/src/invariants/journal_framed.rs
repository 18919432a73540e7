//! Journal framing: every committed move has the shape a click produces.

use super::Invariant;
use crate::{BoardAction, Game, Move};

/// Invariant: each journaled move starts and ends with an orientation action
/// and removes exactly one piece and inserts exactly one.
pub struct JournalFramedInvariant;

impl JournalFramedInvariant {
    fn is_framed(played: &Move) -> bool {
        let actions = &played.consequences;
        let orientates = |action: Option<&BoardAction>| {
            matches!(action, Some(BoardAction::Orientate { .. }))
        };
        let removes = actions
            .iter()
            .filter(|a| matches!(a, BoardAction::Remove { .. }))
            .count();
        let inserts = actions
            .iter()
            .filter(|a| matches!(a, BoardAction::NewPiece { .. }))
            .count();
        orientates(actions.first()) && orientates(actions.last()) && removes == 1 && inserts == 1
    }
}

impl Invariant<Game> for JournalFramedInvariant {
    fn holds(game: &Game) -> bool {
        game.history().into_iter().all(Self::is_framed)
    }

    fn description() -> &'static str {
        "Every move is framed by orientations with one removal and one insertion"
    }
}
