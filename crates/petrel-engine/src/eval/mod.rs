//! Static evaluation: tapered material + piece-square, bishop pair,
//! mobility, tempo, and half-move-clock damping.

pub mod mobility;
pub mod phase;
pub mod pst;

use crate::board::{role_index, Board, Color, Role};
use crate::eval::phase::MAX_PHASE;

const ROLES: [Role; 6] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
    Role::King,
];

/// Score the position in centipawns from the side to move's perspective.
///
/// Middlegame and endgame terms are accumulated White-positive, blended by
/// the game phase, damped as the half-move counter approaches the fifty-move
/// rule, and finally negated for Black to move.
pub fn evaluate(board: &Board) -> i32 {
    let bb = board.bitboards();
    let white_to_move = board.side_to_move().is_white();
    let mut mg = 0;
    let mut eg = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color.is_white() { 1 } else { -1 };
        let friendly = bb.by_color(color);

        for role in ROLES {
            let pieces = bb.by_role(role) & friendly;

            if role == Role::Bishop && pieces.count() >= 2 {
                mg += sign * pst::BISHOP_PAIR_MG;
                eg += sign * pst::BISHOP_PAIR_EG;
            }

            for sq in pieces {
                // Black reads the White-oriented tables mirrored vertically.
                let idx = if color.is_white() {
                    sq as usize
                } else {
                    sq as usize ^ 56
                };
                mg += sign * pst::MG_TABLE[role_index(role)][idx];
                eg += sign * pst::EG_TABLE[role_index(role)][idx];
            }
        }
    }

    let (mob_mg, mob_eg) = mobility::mobility(board);
    mg += mob_mg;
    eg += mob_eg;

    mg += if white_to_move {
        pst::TEMPO_MG
    } else {
        -pst::TEMPO_MG
    };

    let game_phase = phase::game_phase(board);
    let mut eval = (mg * game_phase + eg * (MAX_PHASE - game_phase)) / MAX_PHASE;

    // Drift toward zero as the fifty-move counter runs down.
    let halfmoves = board.halfmove_clock() as i32;
    if halfmoves > 40 {
        eval = eval * (100 - halfmoves) / 100;
    }

    if white_to_move { eval } else { -eval }
}
