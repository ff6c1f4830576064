//! Piece mobility evaluation.
//!
//! Each knight, bishop, rook, and queen is scored by how many squares of
//! the *mobility area* it attacks: squares not occupied by friendly pieces
//! and not covered by an enemy pawn. The count maps through a per-piece
//! tapered curve. Curves are from Stockfish.

use shakmaty::attacks;

use crate::board::{Bitboard, Board, Color, Role};

#[rustfmt::skip]
const KNIGHT_MG: [i32; 9] = [-62, -53, -12, -4, 3, 13, 22, 28, 33];
#[rustfmt::skip]
const KNIGHT_EG: [i32; 9] = [-81, -56, -31, -16, 5, 11, 17, 20, 25];

#[rustfmt::skip]
const BISHOP_MG: [i32; 14] = [-48, -20, 16, 26, 38, 51, 55, 63, 63, 68, 81, 81, 91, 98];
#[rustfmt::skip]
const BISHOP_EG: [i32; 14] = [-59, -23, -3, 13, 24, 42, 54, 57, 65, 73, 78, 86, 88, 97];

#[rustfmt::skip]
const ROOK_MG: [i32; 15] = [-60, -20, 2, 3, 3, 11, 22, 31, 40, 40, 41, 48, 57, 57, 62];
#[rustfmt::skip]
const ROOK_EG: [i32; 15] = [-78, -17, 23, 39, 70, 99, 103, 121, 134, 139, 158, 164, 168, 169, 172];

#[rustfmt::skip]
const QUEEN_MG: [i32; 28] = [
    -30, -12, -8, -9, 20, 23, 23, 35, 38, 53, 64, 65, 65, 66,
     67,  67, 72, 72, 77, 79, 93, 108, 108, 108, 110, 114, 114, 116,
];
#[rustfmt::skip]
const QUEEN_EG: [i32; 28] = [
    -48, -30, -7, 19, 40, 55, 59, 75, 78, 96, 96, 100, 121, 127,
    131, 133, 136, 141, 147, 150, 151, 168, 168, 171, 182, 182, 192, 219,
];

/// Squares attacked by any pawn of `color` in `pawns`.
fn pawn_attack_span(pawns: Bitboard, color: Color) -> Bitboard {
    let mut attacked = Bitboard(0);
    for sq in pawns {
        attacked |= attacks::pawn_attacks(color, sq);
    }
    attacked
}

/// Mobility of both sides, returned as White-positive `(mg, eg)` terms.
pub fn mobility(board: &Board) -> (i32, i32) {
    let bb = board.bitboards();
    let occupied = bb.occupied();
    let mut mg = 0;
    let mut eg = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color.is_white() { 1 } else { -1 };
        let friendly = bb.by_color(color);
        let enemy_pawns = bb.by_role(Role::Pawn) & bb.by_color(!color);
        let area = !friendly & !pawn_attack_span(enemy_pawns, !color);

        for sq in bb.by_role(Role::Knight) & friendly {
            let reach = (attacks::knight_attacks(sq) & area).count();
            mg += sign * KNIGHT_MG[reach.min(8)];
            eg += sign * KNIGHT_EG[reach.min(8)];
        }
        for sq in bb.by_role(Role::Bishop) & friendly {
            let reach = (attacks::bishop_attacks(sq, occupied) & area).count();
            mg += sign * BISHOP_MG[reach.min(13)];
            eg += sign * BISHOP_EG[reach.min(13)];
        }
        for sq in bb.by_role(Role::Rook) & friendly {
            let reach = (attacks::rook_attacks(sq, occupied) & area).count();
            mg += sign * ROOK_MG[reach.min(14)];
            eg += sign * ROOK_EG[reach.min(14)];
        }
        for sq in bb.by_role(Role::Queen) & friendly {
            let reach = (attacks::queen_attacks(sq, occupied) & area).count();
            mg += sign * QUEEN_MG[reach.min(27)];
            eg += sign * QUEEN_EG[reach.min(27)];
        }
    }

    (mg, eg)
}
