//! Negamax alpha-beta search with aspiration windows, transposition table,
//! null-move pruning, late-move reductions, and a capture-only quiescence
//! search.
//!
//! Node kinds (root / PV / non-PV) are compile-time `const` parameters, so
//! each specialization is monomorphized exactly like the call sites demand
//! and no dispatch happens at runtime.

use crate::board::{decode_to, encode_move, find_encoded, Board, HalfMoveOutcome, Move};
use crate::eval::evaluate;
use crate::search::control::SearchControl;
use crate::search::heuristics::{
    HistoryTable, KillerTable, PvTable, ReductionTable, SearchStack,
};
use crate::search::ordering::MovePicker;
use crate::search::see::see_ge;
use crate::search::tt::{Bound, TranspositionTable};
use crate::types::{
    mate_in, mated_in, DEPTH_QS, MAX_PLY, VALUE_INF, VALUE_MATED_IN_PLY, VALUE_MATE_IN_PLY,
    VALUE_NONE,
};

/// Mutable state threaded through the recursion.
///
/// The heuristic tables are rebuilt for every search request; the
/// transposition table and the position history before the root persist
/// across requests within a game.
pub(crate) struct SearchContext<'a> {
    /// Nodes visited so far (incremented per move made).
    pub nodes: u64,
    /// Transposition table, owned by the engine.
    pub tt: &'a mut TranspositionTable,
    /// Stop flag, clock, and node budget.
    pub control: &'a SearchControl,
    /// Precomputed late-move-reduction amounts.
    pub reductions: &'a ReductionTable,
    /// Triangular principal variation.
    pub pv: PvTable,
    /// Killer moves per ply.
    pub killers: KillerTable,
    /// Butterfly history.
    pub history: HistoryTable,
    /// Per-ply scratch.
    pub stack: SearchStack,
    /// Zobrist keys of every position from the game start down to the
    /// current node, for repetition detection.
    pub position_keys: Vec<u64>,
}

/// Count this position against `history` as a repetition.
///
/// Only positions within the reversible-move window can repeat. `count`
/// occurrences suffice: one for regular nodes, two when a PV node wants an
/// extra confirmation before calling the line a draw.
fn is_repetition(board: &Board, keys: &[u64], count: usize) -> bool {
    let lookback = (board.halfmove_clock() as usize).min(keys.len());
    let key = board.hash();
    let mut seen = 0;
    for past in keys.iter().rev().take(lookback) {
        if *past == key {
            seen += 1;
            if seen >= count {
                return true;
            }
        }
    }
    false
}

/// Search `depth` with a window centered on the previous iteration's score.
///
/// Depths below 9 run with a full window. On a fail the window widens by
/// half its delta each retry, opening fully beyond ±3500.
pub(crate) fn aspiration_window(
    board: &Board,
    depth: i32,
    prev_score: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    let mut delta = 50;
    let mut alpha = -VALUE_INF;
    let mut beta = VALUE_INF;

    if depth >= 9 {
        alpha = prev_score - delta;
        beta = prev_score + delta;
    }

    loop {
        if alpha < -3500 {
            alpha = -VALUE_INF;
        }
        if beta > 3500 {
            beta = VALUE_INF;
        }

        let score = negamax::<true, true>(board, alpha, beta, depth, 0, ctx);

        if ctx.control.time_is_up(ctx.nodes) {
            return VALUE_NONE;
        }

        if score <= alpha {
            beta = (alpha + beta) / 2;
            alpha = (alpha - delta).max(-VALUE_INF);
            delta += delta / 2;
        } else if score >= beta {
            beta = (beta + delta).min(VALUE_INF);
            delta += delta / 2;
        } else {
            return score;
        }
    }
}

/// The recursive alpha-beta search.
///
/// `PV` marks principal-variation nodes (the root included); everything
/// else runs on a null window. Returns `VALUE_NONE` when the search was
/// stopped; callers must discard such scores.
pub(crate) fn negamax<const PV: bool, const ROOT: bool>(
    board: &Board,
    mut alpha: i32,
    mut beta: i32,
    mut depth: i32,
    ply: usize,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    if ctx.control.time_is_up(ctx.nodes) {
        return VALUE_NONE;
    }

    if ply >= MAX_PLY {
        return evaluate(board);
    }

    let in_check = board.in_check();
    ctx.pv.init_ply(ply);

    if !ROOT {
        // Draw detection. A PV node wants one extra repeat before
        // conceding the draw.
        if is_repetition(board, &ctx.position_keys, 1 + PV as usize) {
            return 0;
        }
        match board.halfmove_outcome() {
            Some(HalfMoveOutcome::Draw) => return 0,
            Some(HalfMoveOutcome::Loss) => return mated_in(ply),
            None => {}
        }

        // Mate distance pruning: scores outside these bounds cannot be
        // reached from here, so the window can close early.
        alpha = alpha.max(mated_in(ply));
        beta = beta.min(mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }
    }

    if in_check {
        depth += 1;
    }

    if depth <= 0 {
        return quiescence::<PV>(board, alpha, beta, ply, ctx);
    }

    let (tte, tt_hit) = ctx.tt.probe(board.hash());
    let tt_score = if tt_hit { tte.score as i32 } else { VALUE_NONE };
    let tt_code = if tt_hit { tte.mv } else { 0 };

    if !ROOT {
        // Transposition table cutoff, only at null-window nodes and only
        // from entries at least as deep as this node.
        if !PV && tt_hit && tt_score != VALUE_NONE && tte.depth as i32 >= depth {
            match tte.bound {
                Bound::Exact => return tt_score,
                Bound::Lower => alpha = alpha.max(tt_score),
                Bound::Upper => beta = beta.min(tt_score),
                Bound::None => {}
            }
            if alpha >= beta {
                return tt_score;
            }
        }

        // Internal iterative reductions: without a stored move this node
        // orders blind, so search it shallower and let the table fill in.
        if !tt_hit {
            depth -= (depth >= 3) as i32 + PV as i32;
            if depth <= 0 {
                return quiescence::<PV>(board, alpha, beta, ply, ctx);
            }
        }

        if in_check {
            ctx.stack[ply].eval = -VALUE_INF;
        } else {
            let static_eval = if tt_hit { tt_score } else { evaluate(board) };
            ctx.stack[ply].eval = static_eval;

            if !PV {
                // Razoring: hopeless nodes drop straight to quiescence.
                if depth < 3 && static_eval + 150 < alpha {
                    return quiescence::<false>(board, alpha, beta, ply, ctx);
                }

                // Reverse futility: a stored quiet move plus a static eval
                // far above beta is trusted without searching. An occupied
                // destination marks the stored move as a capture.
                let tt_move_is_quiet = tt_code != 0
                    && !board.bitboards().occupied().contains(decode_to(tt_code));
                if tt_move_is_quiet && static_eval >= beta + 150 * depth {
                    return static_eval;
                }

                // Null move pruning: hand over the turn; if the reduced
                // search still clears beta, a real move will too.
                if depth >= 3 && static_eval >= beta && ctx.stack[ply].currmove.is_some() {
                    if let Some(null_board) = board.make_null_move() {
                        ctx.position_keys.push(board.hash());
                        let null_score = -negamax::<false, false>(
                            &null_board,
                            -beta,
                            -beta + 1,
                            depth - 3,
                            ply + 1,
                            ctx,
                        );
                        ctx.position_keys.pop();

                        if ctx.control.stopped() {
                            return VALUE_NONE;
                        }
                        if null_score >= beta {
                            // Unproven mates from a null search are not
                            // reported as mates.
                            return if null_score >= VALUE_MATE_IN_PLY {
                                beta
                            } else {
                                null_score
                            };
                        }
                    }
                }
            }
        }
    }

    let moves = board.legal_moves();
    let tt_move = find_encoded(tt_code, &moves);
    let mut picker = MovePicker::new(board, moves, tt_move, ply, &ctx.killers, &ctx.history);

    let mut bestscore = -VALUE_INF;
    let mut bestmove: Option<Move> = None;
    let mut movecount = 0usize;
    let mut quietcount = 0usize;

    while let Some(mv) = picker.next_move() {
        let is_capture = board.is_capture(&mv);
        let is_promotion = mv.is_promotion();
        let is_quiet = !is_capture && !is_promotion && !board.gives_check(&mv);

        movecount += 1;
        quietcount += is_quiet as usize;

        let new_depth = depth - 1;

        // Late move pruning: at shallow null-window nodes, quiet moves this
        // far down the ordering are not worth a search.
        if !ROOT
            && !PV
            && !in_check
            && is_quiet
            && bestscore > VALUE_MATED_IN_PLY
            && depth <= 5
            && quietcount > 4 + (depth * depth) as usize
        {
            continue;
        }

        let is_killer = ctx.killers.is_killer(ply, &mv);

        ctx.nodes += 1;
        let child = board.make_move(&mv);
        ctx.stack[ply].currmove = Some(mv);
        ctx.position_keys.push(board.hash());

        let mut score;
        if movecount == 1 {
            score = -negamax::<PV, false>(&child, -beta, -alpha, new_depth, ply + 1, ctx);
        } else {
            let do_lmr = depth >= 3
                && movecount > 2
                && !ROOT
                && !in_check
                && !PV
                && !is_capture
                && !is_promotion
                && !is_killer;

            if do_lmr {
                let reduction = ctx.reductions.get(depth, movecount);
                let reduced = (new_depth - reduction).max(1);
                score =
                    -negamax::<false, false>(&child, -alpha - 1, -alpha, reduced, ply + 1, ctx);
                // Confirm promising reduced searches at full depth.
                if score > alpha && reduced < new_depth {
                    score = -negamax::<false, false>(
                        &child,
                        -alpha - 1,
                        -alpha,
                        new_depth,
                        ply + 1,
                        ctx,
                    );
                }
            } else {
                score =
                    -negamax::<false, false>(&child, -alpha - 1, -alpha, new_depth, ply + 1, ctx);
            }

            // Principal variation search: a null-window surprise inside the
            // window gets the full re-search.
            if PV && score > alpha && score < beta {
                score = -negamax::<true, false>(&child, -beta, -alpha, new_depth, ply + 1, ctx);
            }
        }

        ctx.position_keys.pop();

        // A stopped search unwinds without touching bounds or tables.
        if ctx.control.stopped() {
            return VALUE_NONE;
        }

        if score > bestscore {
            bestscore = score;
            if score > alpha {
                alpha = score;
                bestmove = Some(mv);
                ctx.pv.update(ply, mv);
            }
        }

        if score >= beta {
            if !is_capture {
                update_quiet_heuristics(ctx, board, &mv, ply, depth);
            }
            break;
        }
    }

    if movecount == 0 {
        return if in_check { mated_in(ply) } else { 0 };
    }

    let bound = if bestscore >= beta {
        Bound::Lower
    } else if PV && bestmove.is_some() {
        Bound::Exact
    } else {
        Bound::Upper
    };
    let stored_move = bestmove.as_ref().map_or(0, encode_move);
    ctx.tt.store(board.hash(), depth, bestscore, stored_move, bound);

    bestscore
}

/// Capture-only search run below depth zero to settle tactical dust before
/// trusting the static evaluation.
fn quiescence<const PV: bool>(
    board: &Board,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    if ctx.control.time_is_up(ctx.nodes) {
        return VALUE_NONE;
    }

    if ply >= MAX_PLY {
        return evaluate(board);
    }

    if is_repetition(board, &ctx.position_keys, 1 + PV as usize) {
        return 0;
    }

    let (tte, tt_hit) = ctx.tt.probe(board.hash());
    let tt_score = if tt_hit { tte.score as i32 } else { VALUE_NONE };

    if !PV && tt_hit && tt_score != VALUE_NONE {
        let cutoff = match tte.bound {
            Bound::Exact => true,
            Bound::Lower => tt_score >= beta,
            Bound::Upper => tt_score <= alpha,
            Bound::None => false,
        };
        if cutoff {
            return tt_score;
        }
    }

    // Stand pat: the side to move may decline every capture.
    let mut bestscore = evaluate(board);
    if bestscore >= beta {
        return bestscore;
    }
    if bestscore > alpha {
        alpha = bestscore;
    }

    let moves = board.capture_moves();
    let tt_move = find_encoded(if tt_hit { tte.mv } else { 0 }, &moves);
    let mut picker = MovePicker::new(board, moves, tt_move, ply, &ctx.killers, &ctx.history);

    let mut bestmove: Option<Move> = None;
    let in_check = board.in_check();

    while let Some(mv) = picker.next_move() {
        // Skip captures that cannot win material outright.
        if !in_check && !see_ge(board, &mv, 1) {
            continue;
        }

        ctx.nodes += 1;
        let child = board.make_move(&mv);
        ctx.position_keys.push(board.hash());
        let score = -quiescence::<PV>(&child, -beta, -alpha, ply + 1, ctx);
        ctx.position_keys.pop();

        if ctx.control.stopped() {
            return VALUE_NONE;
        }

        if score > bestscore {
            bestscore = score;
            if score > alpha {
                alpha = score;
                bestmove = Some(mv);
            }
        }

        if score >= beta {
            break;
        }
    }

    let bound = if bestscore >= beta {
        Bound::Lower
    } else {
        Bound::Upper
    };
    let stored_move = bestmove.as_ref().map_or(0, encode_move);
    ctx.tt
        .store(board.hash(), DEPTH_QS, bestscore, stored_move, bound);

    bestscore
}

/// Reward a quiet move that produced a beta cutoff.
fn update_quiet_heuristics(
    ctx: &mut SearchContext<'_>,
    board: &Board,
    mv: &Move,
    ply: usize,
    depth: i32,
) {
    ctx.killers.store(ply, *mv);
    if let Some(from) = mv.from() {
        ctx.history
            .update(board.side_to_move(), from, mv.to(), depth);
    }
}
