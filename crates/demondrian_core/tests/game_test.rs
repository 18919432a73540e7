//! Tests for committing and undoing moves on a game.

use demondrian_core::{
    BoardAction, BoardGenerator, Coord, Game, GameRules, IncomingQueue, NextTypePolicy,
    Orientation, PieceType, PlayLogic, PotentialMove, RotationDir,
};

fn classic(text: &str) -> Game {
    Game::new(
        text.parse().expect("valid grid"),
        GameRules::classic(),
        PieceType::range(0, 3),
    )
    .expect("game")
}

#[test]
fn test_single_move_solves_board() {
    let mut game = classic("10 00");
    let played = game
        .execute(PotentialMove::new(Coord::new(0, 1), Orientation::Top))
        .expect("legal move")
        .clone();

    assert!(game.is_solved());
    assert_eq!(played.merges(), 1);
    assert_eq!(game.last_move(), Some(&played));
    assert_eq!(game.history().len(), 1);
}

#[test]
fn test_two_moves_solve_corner_board() {
    let mut game = classic("01 11");
    let moves = PlayLogic::new(game.board())
        .available_moves()
        .expect("full board");
    assert!(!moves.is_empty());

    let mut solved = false;
    for first in moves {
        let mut attempt = game.clone();
        attempt.execute(first).expect("legal move");
        if attempt.is_solved() {
            solved = true;
            break;
        }
        let follow_ups = PlayLogic::new(attempt.board())
            .available_moves()
            .expect("full board");
        for second in follow_ups {
            let mut deeper = attempt.clone();
            deeper.execute(second).expect("legal move");
            if deeper.is_solved() {
                solved = true;
                break;
            }
        }
        if solved {
            break;
        }
    }
    assert!(solved);
    assert_eq!(game.num_moves(), 0);
    game.rotate(RotationDir::Right);
    assert_eq!(game.orientation(), Orientation::Right);
}

#[test]
fn test_execute_then_undo_restores_generated_boards() {
    let mut generator = BoardGenerator::seeded(2024);
    for _ in 0..40 {
        let board = generator.generate_with_type_count(4, 3).expect("board");
        let mut game =
            Game::new(board.clone(), GameRules::classic(), PieceType::range(0, 3)).expect("game");
        let moves = PlayLogic::new(game.board())
            .available_moves()
            .expect("full board");

        for mv in moves {
            let orientation = game.orientation();
            game.execute(mv).expect("enumerated move is legal");
            assert_eq!(game.orientation(), mv.orientation);
            assert!(game.board().is_full());

            game.undo().expect("undo allowed");
            assert_eq!(game.orientation(), orientation);
            assert!(game.board().matches(&board));
            assert_eq!(game.num_moves(), 0);
        }
    }
}

#[test]
fn test_blocked_move_is_rejected_without_side_effects() {
    let mut game = classic("10 20");
    let before = game.board().clone();
    let err = game
        .execute(PotentialMove::new(Coord::new(1, 0), Orientation::Top))
        .expect_err("blocked");
    assert!(err.to_string().contains("not possible"));
    assert!(game.board().matches(&before));
    assert_eq!(game.num_moves(), 0);
    assert!(game.incoming().history().is_empty());
}

#[test]
fn test_moves_are_framed_by_orientation() {
    let mut game = classic("0110 0212 2012 2222");
    let mv = PlayLogic::new(game.board())
        .available_moves()
        .expect("full board")[0];
    let played = game.execute(mv).expect("legal move").clone();

    let actions = &played.consequences;
    assert!(matches!(actions.first(), Some(BoardAction::Orientate { .. })));
    assert!(matches!(actions.last(), Some(BoardAction::Orientate { .. })));
    let removes = actions
        .iter()
        .filter(|a| matches!(a, BoardAction::Remove { .. }))
        .count();
    let inserts = actions
        .iter()
        .filter(|a| matches!(a, BoardAction::NewPiece { .. }))
        .count();
    assert_eq!((removes, inserts), (1, 1));
}

#[test]
fn test_deterministic_queue_feeds_palette_in_order() {
    let mut game = classic("01 10");
    let first = game.incoming_mut().peek_next().expect("queued");
    assert_eq!(first, PieceType::Normal(0));

    game.execute(PotentialMove::new(Coord::ORIGIN, Orientation::Top))
        .expect("legal move");
    assert_eq!(game.incoming().history(), &[PieceType::Normal(0)]);
    assert_eq!(game.incoming_mut().peek_next(), Some(PieceType::Normal(1)));

    game.undo().expect("undo");
    assert!(game.incoming().history().is_empty());
    assert_eq!(game.incoming_mut().peek_next(), Some(PieceType::Normal(0)));
}

#[test]
fn test_keep_same_reinserts_clicked_type() {
    let mut game = Game::new(
        "01 10".parse().expect("valid grid"),
        GameRules::keep_same(),
        PieceType::range(0, 2),
    )
    .expect("game");
    assert_eq!(game.incoming().policy(), NextTypePolicy::RemovedType);

    let played = game
        .execute(PotentialMove::new(Coord::new(1, 0), Orientation::Top))
        .expect("legal move")
        .clone();
    let inserted = played
        .consequences
        .iter()
        .find_map(|action| match action {
            BoardAction::NewPiece { new_piece, .. } => Some(new_piece.piece.kind),
            _ => None,
        })
        .expect("new piece action");
    assert_eq!(inserted, PieceType::Normal(0));
}

#[test]
fn test_seeded_random_games_agree() {
    let rules = GameRules::arcade();
    let types = PieceType::range(0, 3);
    let board = BoardGenerator::seeded(11)
        .generate_with_type_count(4, 3)
        .expect("board");

    let play = || {
        let mut game = Game::new(board.clone(), rules, types.clone())
            .expect("game")
            .with_incoming(IncomingQueue::with_seed(&rules, &types, 77));
        let moves = PlayLogic::new(game.board())
            .available_moves()
            .expect("full board");
        if let Some(mv) = moves.first() {
            game.execute(*mv).expect("legal move");
        }
        game
    };
    let a = play();
    let b = play();
    assert!(a.board().matches(b.board()));
    assert_eq!(a.incoming().history(), b.incoming().history());
}

#[test]
fn test_reset_empties_board_and_history() {
    let mut game = classic("01 10");
    game.execute(PotentialMove::new(Coord::ORIGIN, Orientation::Right))
        .expect("legal move");
    game.reset();
    assert_eq!(game.num_moves(), 0);
    assert!(game.board().is_empty());
    assert_eq!(game.orientation(), Orientation::Top);
    assert!(!game.can_undo());
}
