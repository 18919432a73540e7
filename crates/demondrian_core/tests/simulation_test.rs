//! Tests for move simulation: removal, falls, insertion and merges.

use demondrian_core::{
    Board, BoardAction, Coord, MoveSimulator, Orientation, Piece, PieceType, PotentialMove,
    SimulationState,
};

fn unit(index: u32) -> Piece {
    Piece::unit(PieceType::Normal(index))
}

fn simulated(board: &Board, coord: Coord, next: Piece) -> MoveSimulator {
    let mut sim = MoveSimulator::from_coord(board, coord, next).expect("occupied cell");
    sim.simulate().expect("simulation runs");
    sim
}

#[test]
fn test_insert_triggers_merge() {
    let board: Board = "01 00".parse().expect("valid grid");
    let sim = simulated(&board, Coord::new(1, 1), unit(0));

    assert!(sim.is_move_possible().expect("simulated"));
    let played = sim.get_move().expect("ready");
    assert_eq!(played.merges(), 1);

    let compact = played
        .consequences
        .iter()
        .find_map(|action| match action {
            BoardAction::Compact {
                coord, big_piece, ..
            } => Some((*coord, big_piece.piece)),
            _ => None,
        })
        .expect("compact action");
    assert_eq!(compact.0, Coord::ORIGIN);
    assert_eq!(compact.1, Piece::new(PieceType::Normal(0), 2));

    assert!(sim.board().is_full());
    assert_eq!(sim.board().piece_count(), 1);
}

#[test]
fn test_column_falls_one_row() {
    let board: Board = "0100 0200 1212 2021".parse().expect("valid grid");
    let sim = simulated(&board, Coord::new(1, 0), unit(3));
    let played = sim.get_move().expect("ready");

    let mut falls: Vec<(Coord, i32)> = played
        .consequences
        .iter()
        .filter_map(|action| match action {
            BoardAction::Fall { rows, coord, .. } => Some((*coord, *rows)),
            _ => None,
        })
        .collect();
    falls.sort();
    assert_eq!(
        falls,
        vec![
            (Coord::new(1, 1), 1),
            (Coord::new(1, 2), 1),
            (Coord::new(1, 3), 1),
        ]
    );

    let inserted = played
        .consequences
        .iter()
        .find_map(|action| match action {
            BoardAction::NewPiece { coord, new_piece } => Some((*coord, new_piece.piece)),
            _ => None,
        })
        .expect("new piece action");
    assert_eq!(inserted, (Coord::new(1, 3), unit(3)));
}

#[test]
fn test_blocked_by_matching_neighbour() {
    let board: Board = "10 20".parse().expect("valid grid");
    for coord in [Coord::new(1, 0), Coord::new(1, 1)] {
        let sim = simulated(&board, coord, unit(0));
        assert!(!sim.is_move_possible().expect("simulated"));
        assert!(matches!(sim.state(), SimulationState::Blocked(_)));
        assert!(!sim.obstacles().expect("simulated").is_empty());
    }
}

#[test]
fn test_simulation_leaves_source_board_untouched() {
    let board: Board = "0110 0212 2012 2222".parse().expect("valid grid");
    let before = board.clone();
    for (anchor, _) in board.occupants() {
        let _ = simulated(&board, anchor, unit(1));
    }
    assert!(board.matches(&before));
}

#[test]
fn test_click_inside_big_piece_uses_anchor() {
    let board: Board = "0012 0021 1212 2121".parse().expect("valid grid");
    let sim = MoveSimulator::from_coord(&board, Coord::new(1, 3), unit(0)).expect("occupied");
    assert_eq!(sim.move_coord(), Coord::new(0, 2));
    assert_eq!(sim.old_piece().piece.size, 2);
}

#[test]
fn test_potential_move_is_played_in_its_orientation() {
    let board: Board = "01 10".parse().expect("valid grid");
    let mv = PotentialMove::new(Coord::ORIGIN, Orientation::Right);
    let mut sim = MoveSimulator::from_potential_move(&board, mv, unit(2)).expect("occupied");
    sim.simulate().expect("simulation runs");

    assert_eq!(sim.board().orientation(), Orientation::Right);
    let played = sim.get_move().expect("ready");
    assert_eq!(
        played.consequences.first(),
        Some(&BoardAction::Orientate {
            orientation: Orientation::Right
        })
    );
    assert_eq!(board.orientation(), Orientation::Top);
}

#[test]
fn test_replaying_a_move_reproduces_the_simulation() {
    let board: Board = "0110 0212 2012 2222".parse().expect("valid grid");
    let anchors: Vec<Coord> = board.occupants().into_iter().map(|(a, _)| a).collect();
    for anchor in anchors {
        let sim = simulated(&board, anchor, unit(0));
        let Ok(played) = sim.get_move() else {
            continue;
        };
        let mut replayed = board.clone();
        played.apply(&mut replayed).expect("apply");
        assert!(replayed.matches(sim.board()));
        replayed.check_consistency().expect("consistent");

        played.revert(&mut replayed).expect("revert");
        assert!(replayed.matches(&board));
    }
}
