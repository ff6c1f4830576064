//! Static exchange evaluation.
//!
//! Predicts whether a move wins at least `threshold` centipawns once the
//! forced capture sequence on its destination square plays out, both sides
//! always recapturing with their least valuable attacker.

use shakmaty::attacks;

use crate::board::{role_index, Bitboard, Board, Color, Move, Role, Square};

/// Exchange values, indexed Pawn = 0 .. King = 5. Distinct from the
/// evaluator's material values; the king is never actually traded.
pub const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 0];

const CANDIDATES: [Role; 6] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
    Role::King,
];

#[inline]
fn value_of(role: Role) -> i32 {
    SEE_VALUES[role_index(role)]
}

/// Whether the side to move gains at least `threshold` from `mv`.
pub fn see_ge(board: &Board, mv: &Move, threshold: i32) -> bool {
    let bb = board.bitboards();
    let Some(from) = mv.from() else {
        return threshold <= 0;
    };
    let to = mv.to();
    let us = board.side_to_move();

    // Credit the victim. En passant removes a pawn from a different square.
    let victim_value = if mv.is_en_passant() {
        value_of(Role::Pawn)
    } else {
        bb.role_at(to).map_or(0, value_of)
    };

    let mut swap = victim_value - threshold;
    if swap < 0 {
        return false;
    }

    // Account for our own piece ending up on the square.
    swap -= bb.role_at(from).map_or(0, value_of);
    if swap >= 0 {
        return true;
    }

    let mut occupied = bb.occupied() & !Bitboard::from(from);
    if mv.is_en_passant() {
        if let Some(captured) = en_passant_victim(to, us) {
            occupied &= !Bitboard::from(captured);
        }
    }

    let queens = bb.by_role(Role::Queen);
    let diagonal_sliders = bb.by_role(Role::Bishop) | queens;
    let orthogonal_sliders = bb.by_role(Role::Rook) | queens;

    // All attackers of the destination square, x-rays through the vacated
    // source square included.
    let mut attackers =
        bb.attacks_to(to, Color::White, occupied) | bb.attacks_to(to, Color::Black, occupied);

    let mut side = !us;

    loop {
        attackers &= occupied;

        let my_attackers = attackers & bb.by_color(side);
        if my_attackers.is_empty() {
            break;
        }

        // Least valuable attacker still on the board.
        let mut picked = (Square::A1, Role::Pawn);
        for role in CANDIDATES {
            if let Some(sq) = (my_attackers & bb.by_role(role)).first() {
                picked = (sq, role);
                break;
            }
        }
        let (attacker_sq, attacker_role) = picked;

        side = !side;

        // Negamax the running tally.
        swap = -swap - 1 - value_of(attacker_role);

        if swap >= 0 {
            // A winning king "recapture" into a defended square is illegal;
            // hand the exchange back.
            if attacker_role == Role::King && !(attackers & bb.by_color(side)).is_empty() {
                side = !side;
            }
            break;
        }

        occupied &= !Bitboard::from(attacker_sq);

        // The vacated square may reveal x-ray attackers behind it.
        if matches!(attacker_role, Role::Pawn | Role::Bishop | Role::Queen) {
            attackers |= attacks::bishop_attacks(to, occupied) & diagonal_sliders;
        }
        if matches!(attacker_role, Role::Rook | Role::Queen) {
            attackers |= attacks::rook_attacks(to, occupied) & orthogonal_sliders;
        }
    }

    // The side left to move at the end is the side that ran out of
    // profitable recaptures.
    side != us
}

/// Square of the pawn removed by an en passant capture to `to`.
fn en_passant_victim(to: Square, us: Color) -> Option<Square> {
    let idx = to as i32 + if us.is_white() { -8 } else { 8 };
    (0..64).contains(&idx).then(|| Square::new(idx as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_move(board: &Board, uci: &str) -> Move {
        board.move_from_uci(uci).expect("move must be legal")
    }

    #[test]
    fn pawn_takes_undefended_knight() {
        let board = Board::from_fen("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e4d5");
        assert!(see_ge(&board, &mv, 0));
        assert!(see_ge(&board, &mv, 320));
        assert!(!see_ge(&board, &mv, 321));
    }

    #[test]
    fn pawn_takes_defended_knight_nets_the_difference() {
        // PxN, pxP: 320 - 100 = 220.
        let board = Board::from_fen("4k3/8/4p3/3n4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e4d5");
        assert!(see_ge(&board, &mv, 220));
        assert!(!see_ge(&board, &mv, 221));
    }

    #[test]
    fn queen_takes_defended_pawn_loses() {
        let board = Board::from_fen("4k3/8/3p4/2p5/8/4Q3/8/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e3c5");
        assert!(!see_ge(&board, &mv, 0));
        // QxP nets 100 - 900 = -800 once the pawn recaptures.
        assert!(see_ge(&board, &mv, -800));
    }

    #[test]
    fn xray_stacked_rooks_win_the_exchange() {
        // Rooks doubled on the e-file take a defended pawn. The back rook
        // only enters through the x-ray: RxP pxR Rxp = 100 - 500 + 100.
        let board = Board::from_fen("4k3/3p4/4p3/8/8/4R3/4R3/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e3e6");
        assert!(!see_ge(&board, &mv, 0));
        assert!(see_ge(&board, &mv, -300));
    }

    #[test]
    fn king_cannot_recapture_into_defended_square() {
        // White queen takes the pawn next to the black king; the pawn is
        // "defended" only by the king, but the queen is protected, so the
        // king recapture is illegal and the pawn is simply lost.
        let board = Board::from_fen("4k3/3p4/3QB3/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "d6d7");
        assert!(see_ge(&board, &mv, 100));
    }

    #[test]
    fn quiet_move_to_attacked_square_loses_the_piece() {
        // Rook steps onto a square covered by a pawn.
        let board = Board::from_fen("4k3/8/3p4/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e2e5");
        assert!(!see_ge(&board, &mv, 0));
        assert!(see_ge(&board, &mv, -500));
    }

    #[test]
    fn en_passant_counts_the_removed_pawn() {
        let board =
            Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let mv = find_move(&board, "e5d6");
        assert!(mv.is_en_passant());
        assert!(see_ge(&board, &mv, 100));
    }

    #[test]
    fn threshold_one_filters_even_trades() {
        // NxN with a recapture is dead even: fails the +1 threshold used by
        // quiescence, passes zero.
        let board = Board::from_fen("4k3/8/2p5/3n4/8/4N3/8/4K3 w - - 0 1").unwrap();
        let mv = find_move(&board, "e3d5");
        assert!(see_ge(&board, &mv, 0));
        assert!(!see_ge(&board, &mv, 1));
    }
}
