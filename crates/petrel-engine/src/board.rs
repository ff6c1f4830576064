//! Board adapter over the `shakmaty` rules library.
//!
//! The search never talks to `shakmaty` directly; this module narrows the
//! rules library down to the operations the engine consumes: copy-make with
//! a cached Zobrist key, null moves, legal/capture generation, check
//! queries, half-move-clock termination, and UCI move conversion. It also
//! provides the 16-bit move codec used by the transposition table.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

pub use shakmaty::{Bitboard, Color, Move, MoveList, Role, Square};

/// Errors from setting up a position.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The FEN string could not be parsed into a legal position.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The offending FEN string.
        fen: String,
    },
}

/// How a half-move-counter termination ends the game for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfMoveOutcome {
    /// Fifty-move rule: the game is drawn.
    Draw,
    /// The side to move is checkmated on the move that reached the counter.
    Loss,
}

/// A chess position with its Zobrist key computed once at construction.
#[derive(Debug, Clone)]
pub struct Board {
    pos: Chess,
    hash: u64,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Self {
        Self::from_position(Chess::default())
    }

    /// Parse a FEN string into a board.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen.parse().map_err(|_| BoardError::InvalidFen {
            fen: fen.to_string(),
        })?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|_| BoardError::InvalidFen {
                fen: fen.to_string(),
            })?;
        Ok(Self::from_position(pos))
    }

    fn from_position(pos: Chess) -> Self {
        let hash = pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;
        Self { pos, hash }
    }

    /// 64-bit Zobrist key of the position.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.pos.is_check()
    }

    /// Plies since the last capture or pawn move.
    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.pos.halfmoves()
    }

    /// All legal moves.
    pub fn legal_moves(&self) -> MoveList {
        self.pos.legal_moves()
    }

    /// Legal captures only (including en passant).
    pub fn capture_moves(&self) -> MoveList {
        self.pos.capture_moves()
    }

    /// Whether `mv` captures a piece (en passant included).
    #[inline]
    pub fn is_capture(&self, mv: &Move) -> bool {
        mv.is_capture()
    }

    /// Play a legal move, returning the resulting position.
    pub fn make_move(&self, mv: &Move) -> Board {
        let mut pos = self.pos.clone();
        pos.play_unchecked(*mv);
        Self::from_position(pos)
    }

    /// Pass the turn without moving. `None` when the position does not
    /// admit a null move (the opponent would already be in check).
    pub fn make_null_move(&self) -> Option<Board> {
        self.pos.clone().swap_turn().ok().map(Self::from_position)
    }

    /// Whether playing `mv` leaves the opponent in check.
    pub fn gives_check(&self, mv: &Move) -> bool {
        let mut pos = self.pos.clone();
        pos.play_unchecked(*mv);
        pos.is_check()
    }

    /// Half-move-counter termination, if the counter has reached 100.
    ///
    /// Checkmate on the move that fills the counter takes precedence over
    /// the draw, so a mated side still loses.
    pub fn halfmove_outcome(&self) -> Option<HalfMoveOutcome> {
        if self.pos.halfmoves() < 100 {
            return None;
        }
        if self.pos.is_check() && self.pos.legal_moves().is_empty() {
            Some(HalfMoveOutcome::Loss)
        } else {
            Some(HalfMoveOutcome::Draw)
        }
    }

    /// Piece and occupancy bitboards.
    #[inline]
    pub fn bitboards(&self) -> &shakmaty::Board {
        self.pos.board()
    }

    /// Parse a UCI move string against this position.
    pub fn move_from_uci(&self, uci: &str) -> Option<Move> {
        let parsed: UciMove = uci.parse().ok()?;
        parsed.to_move(&self.pos).ok()
    }

    /// Format a move as a UCI string.
    pub fn move_to_uci(mv: &Move) -> String {
        mv.to_uci(CastlingMode::Standard).to_string()
    }
}

/// Zero-based index of a piece kind (Pawn = 0 .. King = 5).
#[inline]
pub fn role_index(role: Role) -> usize {
    role as usize - 1
}

/// Zero-based index of a color (White = 0, Black = 1).
#[inline]
pub fn color_index(color: Color) -> usize {
    if color.is_white() { 0 } else { 1 }
}

/// Pack a move into 16 bits: `from | to << 6 | promotion << 12`.
///
/// Zero doubles as the "no move" sentinel; no legal move encodes to zero
/// because a move never has `from == to == A1`.
pub fn encode_move(mv: &Move) -> u16 {
    let from = mv.from().map_or(0, |sq| sq as u16);
    let to = mv.to() as u16;
    let promo: u16 = match mv.promotion() {
        Some(Role::Knight) => 1,
        Some(Role::Bishop) => 2,
        Some(Role::Rook) => 3,
        Some(Role::Queen) => 4,
        _ => 0,
    };
    from | (to << 6) | (promo << 12)
}

/// Destination square of a packed move.
#[inline]
pub fn decode_to(code: u16) -> Square {
    Square::new(u32::from((code >> 6) & 63))
}

/// Find the legal move matching a packed code, if any.
///
/// A code from a colliding transposition table entry simply fails to match
/// here, so a stored move can never smuggle an illegal move into the search.
pub fn find_encoded(code: u16, moves: &MoveList) -> Option<Move> {
    if code == 0 {
        return None;
    }
    moves.iter().find(|m| encode_move(m) == code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_moves() {
        let board = Board::starting_position();
        assert_eq!(board.legal_moves().len(), 20);
        assert!(!board.in_check());
        assert!(board.side_to_move().is_white());
    }

    #[test]
    fn invalid_fen_is_rejected() {
        assert!(Board::from_fen("not a fen").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn make_move_changes_hash_and_side() {
        let board = Board::starting_position();
        let mv = board.move_from_uci("e2e4").expect("e2e4 is legal");
        let child = board.make_move(&mv);
        assert_ne!(board.hash(), child.hash());
        assert!(child.side_to_move().is_black());
    }

    #[test]
    fn null_move_swaps_turn() {
        let board = Board::starting_position();
        let null = board.make_null_move().expect("startpos admits a null move");
        assert!(null.side_to_move().is_black());
        assert_ne!(board.hash(), null.hash());
    }

    #[test]
    fn gives_check_detects_check() {
        // 1. f3 e5 2. g4: Qh4 is mate, so it certainly gives check.
        let board = Board::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
        )
        .unwrap();
        let mv = board.move_from_uci("d8h4").expect("Qh4 is legal");
        assert!(board.gives_check(&mv));
        let quiet = board.move_from_uci("a7a6").unwrap();
        assert!(!board.gives_check(&quiet));
    }

    #[test]
    fn halfmove_counter_draw() {
        let board = Board::from_fen("7k/8/8/8/8/8/8/K7 w - - 100 1").unwrap();
        assert_eq!(board.halfmove_outcome(), Some(HalfMoveOutcome::Draw));

        let fresh = Board::starting_position();
        assert_eq!(fresh.halfmove_outcome(), None);
    }

    #[test]
    fn move_codec_roundtrips_all_legal_moves() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let moves = board.legal_moves();
        for mv in &moves {
            let code = encode_move(mv);
            assert_ne!(code, 0);
            assert_eq!(find_encoded(code, &moves), Some(*mv));
        }
    }

    #[test]
    fn find_encoded_none_for_sentinel() {
        let board = Board::starting_position();
        assert_eq!(find_encoded(0, &board.legal_moves()), None);
    }

    #[test]
    fn promotion_codec_distinguishes_pieces() {
        let board = Board::from_fen("7k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = board.legal_moves();
        let codes: Vec<u16> = moves.iter().map(encode_move).collect();
        // Four promotion choices, four distinct codes.
        assert_eq!(moves.iter().filter(|m| m.is_promotion()).count(), 4);
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }
}
