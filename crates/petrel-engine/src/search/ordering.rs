//! Staged move picker.
//!
//! Yields moves in an order tuned to produce early beta cutoffs: the
//! transposition table move, then captures by MVV-LVA, then the two killer
//! moves, then the remaining quiets by history score. Within the capture
//! and quiet bands a selection sort surfaces the best remaining move one
//! pick at a time, so a node that cuts off early never pays for a full sort.

use crate::board::{role_index, Board, Move, MoveList, Role};
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::types::MAX_MOVES;

/// Base score for captures; above every killer and history value.
pub const SCORE_CAPTURE: i32 = 7_000_000;

/// Score of the first killer move.
pub const SCORE_KILLER1: i32 = 6_000_000;

/// Score of the second killer move.
pub const SCORE_KILLER2: i32 = 5_000_000;

/// Most-valuable-victim / least-valuable-attacker score.
///
/// `None` stands in for the empty destination of an en passant capture and
/// contributes zero, as does a missing attacker.
fn mvv_lva(victim: Option<Role>, attacker: Option<Role>) -> i32 {
    match (victim, attacker) {
        (Some(v), Some(a)) => 6 * (role_index(v) as i32 + 1) - role_index(a) as i32,
        _ => 0,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    TtMove,
    Captures,
    Killer1,
    Killer2,
    Quiet,
}

/// Iterator over one node's moves in cutoff-friendly order.
pub struct MovePicker {
    moves: MoveList,
    scores: [i32; MAX_MOVES],
    cursor: usize,
    stage: Stage,
    tt_move: Option<Move>,
    killer1: Option<Move>,
    killer2: Option<Move>,
}

impl MovePicker {
    /// Build a picker over an already-generated move list.
    ///
    /// Every move is scored here, against the tables as they stand on node
    /// entry. The TT move and the killers are only remembered when they
    /// actually appear in the list, so the picker can never emit a move the
    /// position does not admit.
    pub fn new(
        board: &Board,
        moves: MoveList,
        tt_move: Option<Move>,
        ply: usize,
        killers: &KillerTable,
        history: &HistoryTable,
    ) -> Self {
        let bb = board.bitboards();
        let side = board.side_to_move();
        let mut scores = [0; MAX_MOVES];
        let mut killer1 = None;
        let mut killer2 = None;

        for (i, mv) in moves.iter().enumerate() {
            scores[i] = if board.is_capture(mv) {
                let victim = if mv.is_en_passant() {
                    None
                } else {
                    bb.role_at(mv.to())
                };
                let attacker = mv.from().and_then(|sq| bb.role_at(sq));
                SCORE_CAPTURE + mvv_lva(victim, attacker)
            } else if killers.first(ply) == Some(*mv) {
                killer1 = Some(*mv);
                SCORE_KILLER1
            } else if killers.second(ply) == Some(*mv) {
                killer2 = Some(*mv);
                SCORE_KILLER2
            } else if let Some(from) = mv.from() {
                history.score(side, from, mv.to())
            } else {
                0
            };
        }

        let tt_move = tt_move.filter(|mv| moves.contains(mv));

        Self {
            moves,
            scores,
            cursor: 0,
            stage: Stage::TtMove,
            tt_move,
            killer1,
            killer2,
        }
    }

    /// Swap the best-scored remaining move to the cursor.
    fn select_best(&mut self) {
        let mut best = self.cursor;
        for i in (self.cursor + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
    }

    /// The next move, or `None` when the list is exhausted.
    ///
    /// No move is ever yielded twice: the TT move and the killers are
    /// skipped when the selection sort reaches their list entries.
    pub fn next_move(&mut self) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::Captures;
                    if let Some(mv) = self.tt_move {
                        return Some(mv);
                    }
                }
                Stage::Captures => {
                    while self.cursor < self.moves.len() {
                        self.select_best();
                        if self.scores[self.cursor] < SCORE_CAPTURE {
                            break;
                        }
                        let mv = self.moves[self.cursor];
                        self.cursor += 1;
                        if Some(mv) != self.tt_move {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Killer1;
                }
                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    if let Some(mv) = self.killer1
                        && Some(mv) != self.tt_move
                    {
                        return Some(mv);
                    }
                }
                Stage::Killer2 => {
                    self.stage = Stage::Quiet;
                    if let Some(mv) = self.killer2
                        && Some(mv) != self.tt_move
                        && self.killer2 != self.killer1
                    {
                        return Some(mv);
                    }
                }
                Stage::Quiet => {
                    while self.cursor < self.moves.len() {
                        self.select_best();
                        let mv = self.moves[self.cursor];
                        self.cursor += 1;
                        if Some(mv) == self.tt_move
                            || Some(mv) == self.killer1
                            || Some(mv) == self.killer2
                        {
                            continue;
                        }
                        return Some(mv);
                    }
                    return None;
                }
            }
        }
    }
}
