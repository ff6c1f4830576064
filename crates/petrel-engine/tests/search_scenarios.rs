//! End-to-end search scenarios driven through the public engine API.

use petrel_engine::types::{is_mate, VALUE_MATE};
use petrel_engine::{Board, Engine, Limits};

fn fixed_depth(engine: &mut Engine, depth: i32) -> petrel_engine::SearchOutcome {
    engine.set_limits(Limits {
        depth,
        ..Limits::default()
    });
    engine.get_bestmove(|_| {})
}

#[test]
fn opening_move_from_the_starting_position() {
    let mut engine = Engine::new();
    let outcome = fixed_depth(&mut engine, 1);
    let mv = outcome.best_move.expect("twenty moves to choose from");
    assert!(engine.board().legal_moves().contains(&mv));
    assert!(outcome.nodes >= 20);
}

#[test]
fn back_rank_mate_in_one() {
    let mut engine = Engine::new();
    engine.set_position(
        Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap(),
        Vec::new(),
    );
    let outcome = fixed_depth(&mut engine, 2);
    assert_eq!(Board::move_to_uci(&outcome.best_move.unwrap()), "a1a8");
    assert!(is_mate(outcome.score) && outcome.score > 0);
    assert_eq!((VALUE_MATE - outcome.score + 1) / 2, 1);
}

#[test]
fn forced_mate_keeps_its_sign_at_depth_four() {
    // Scholar's mate is on the board for White; the deeper search with all
    // pruning layers active must still report the mate for the mating side.
    let mut engine = Engine::new();
    engine.set_position(
        Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .unwrap(),
        Vec::new(),
    );
    let outcome = fixed_depth(&mut engine, 4);
    assert_eq!(Board::move_to_uci(&outcome.best_move.unwrap()), "h5f7");
    assert!(is_mate(outcome.score) && outcome.score > 0);
}

#[test]
fn stalemate_has_no_best_move_and_scores_zero() {
    let mut engine = Engine::new();
    engine.set_position(
        Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap(),
        Vec::new(),
    );
    let outcome = fixed_depth(&mut engine, 2);
    assert!(outcome.best_move.is_none());
    assert_eq!(outcome.score, 0);
}

#[test]
fn played_out_repetition_is_seen_by_the_search() {
    // A queenless side shuffles its knight; the third occurrence of the
    // repeated position is one retreat away, and every alternative loses.
    let mut board =
        Board::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let mut keys = Vec::new();
    for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
        let mv = board.move_from_uci(uci).unwrap();
        keys.push(board.hash());
        board = board.make_move(&mv);
    }
    let mut engine = Engine::new();
    engine.set_position(board, keys);
    let outcome = fixed_depth(&mut engine, 3);
    assert_eq!(outcome.score, 0);
}

#[test]
fn deeper_searches_remain_stable_across_a_game() {
    // Play the engine against itself for a few moves; every returned move
    // must be legal in the position it was produced for.
    let mut engine = Engine::new();
    let mut board = Board::starting_position();
    let mut keys = Vec::new();

    for _ in 0..6 {
        engine.set_position(board.clone(), keys.clone());
        let outcome = fixed_depth(&mut engine, 4);
        let mv = outcome.best_move.expect("the game is far from over");
        assert!(board.legal_moves().contains(&mv), "illegal move returned");
        keys.push(board.hash());
        board = board.make_move(&mv);
    }
}

#[test]
fn node_counts_grow_with_depth() {
    let mut engine = Engine::new();
    let shallow = fixed_depth(&mut engine, 2).nodes;

    let mut engine = Engine::new();
    let deeper = fixed_depth(&mut engine, 5).nodes;
    assert!(deeper > shallow, "deeper search must visit more nodes");
}
