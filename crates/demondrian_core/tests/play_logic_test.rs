//! Tests for move legality and move enumeration.

use demondrian_core::{Board, Coord, Orientation, Piece, PieceType, PlayLogic};

#[test]
fn test_big_piece_above_is_an_obstacle() {
    let board: Board = "0012 0011 1211 0120".parse().expect("valid grid");
    let logic = PlayLogic::new(&board);
    let clicked = board.occupant_at(Coord::new(1, 1)).expect("occupied");
    assert_eq!(clicked.piece, Piece::unit(PieceType::Normal(2)));

    let obstacles = logic.obstacles_above(clicked.id).expect("on board");
    assert_eq!(obstacles.len(), 1);
    assert_eq!(obstacles[0].piece, Piece::new(PieceType::Normal(0), 2));
    assert_eq!(
        board.anchor_of(obstacles[0].id).expect("anchor"),
        Coord::new(0, 2)
    );
    assert!(logic.is_alone(Coord::new(1, 1)));
    assert!(!logic.is_valid_move(Coord::new(1, 1)));
}

#[test]
fn test_all_obstacles_reports_both_kinds() {
    let board: Board = "0012 0011 1211 0120".parse().expect("valid grid");
    let logic = PlayLogic::new(&board);
    let big = board.occupant_at(Coord::new(0, 2)).expect("occupied");
    assert_eq!(logic.all_obstacles(Coord::new(0, 1)).expect("occupied"), vec![big]);

    let board: Board = "10 20".parse().expect("valid grid");
    let logic = PlayLogic::new(&board);
    let above = board.occupant_at(Coord::new(1, 1)).expect("occupied");
    assert_eq!(logic.all_obstacles(Coord::new(1, 0)).expect("occupied"), vec![above]);
}

#[test]
fn test_board_with_moves() {
    let board: Board = "0110 0212 2012 2222".parse().expect("valid grid");
    let logic = PlayLogic::new(&board);
    assert!(logic.has_available_moves().expect("full board"));

    let moves = logic.available_moves().expect("full board");
    let mut working = board.clone();
    for mv in &moves {
        working.rotate_to(mv.orientation);
        assert!(
            PlayLogic::new(&working).is_valid_move(mv.coord),
            "{} should be playable",
            mv
        );
    }
}

#[test]
fn test_move_order_is_orientation_then_row_major() {
    let board: Board = "01 10".parse().expect("valid grid");
    let moves = PlayLogic::new(&board).available_moves().expect("full board");
    assert_eq!(moves.len(), 16);

    let orientations = [
        Orientation::Top,
        Orientation::Right,
        Orientation::Bottom,
        Orientation::Left,
    ];
    for (chunk, orientation) in moves.chunks(4).zip(orientations) {
        let coords: Vec<Coord> = chunk.iter().map(|m| m.coord).collect();
        assert!(chunk.iter().all(|m| m.orientation == orientation));
        assert_eq!(
            coords,
            vec![
                Coord::new(0, 0),
                Coord::new(1, 0),
                Coord::new(0, 1),
                Coord::new(1, 1),
            ]
        );
    }
}

#[test]
fn test_enumeration_does_not_touch_board() {
    let mut board: Board = "0110 0212 2012 2222".parse().expect("valid grid");
    board.rotate_right();
    let before = board.clone();
    PlayLogic::new(&board).available_moves().expect("full board");
    assert_eq!(board.orientation(), Orientation::Right);
    assert!(board.matches(&before));
}

#[test]
fn test_checkerboard_pairs_have_no_moves() {
    let board: Board = "0101 0101 1010 1010".parse().expect("valid grid");
    assert!(!PlayLogic::new(&board).has_available_moves().expect("full board"));
}

#[test]
fn test_partial_board_cannot_enumerate() {
    let mut board = Board::new(2).expect("board");
    board
        .set(Coord::ORIGIN, Piece::unit(PieceType::Normal(0)))
        .expect("set");
    assert!(PlayLogic::new(&board).available_moves().is_err());
}
