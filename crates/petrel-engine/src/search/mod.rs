//! The search engine: iterative deepening over the negamax core.

pub mod control;
pub mod heuristics;
mod negamax;
pub mod ordering;
pub mod see;
pub mod tt;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::board::{Board, Move};
use crate::search::control::SearchControl;
use crate::search::heuristics::{
    HistoryTable, KillerTable, PlyInfo, PvTable, ReductionTable,
};
use crate::search::negamax::{aspiration_window, SearchContext};
use crate::search::tt::{TranspositionTable, DEFAULT_HASH_MB};
use crate::types::{Limits, MAX_PLY, VALUE_INF};

/// Result of one completed search request.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best move from the deepest completed iteration; `None` when the
    /// position has no legal move.
    pub best_move: Option<Move>,
    /// Score of that iteration, side-to-move relative.
    pub score: i32,
    /// Deepest fully completed depth.
    pub depth: i32,
    /// Nodes visited.
    pub nodes: u64,
}

/// Snapshot handed to the per-iteration callback for `info` output.
pub struct IterationReport<'a> {
    /// Completed depth.
    pub depth: i32,
    /// Score at that depth.
    pub score: i32,
    /// Nodes visited so far.
    pub nodes: u64,
    /// Milliseconds since the search started.
    pub elapsed_ms: u64,
    /// Principal variation of the completed iteration.
    pub pv: &'a [Move],
}

/// The engine: owns the board, the transposition table, the reduction
/// lookup, and the game's position history.
pub struct Engine {
    board: Board,
    game_keys: Vec<u64>,
    tt: TranspositionTable,
    reductions: ReductionTable,
    limits: Limits,
    stop: Arc<AtomicBool>,
    nodes: u64,
}

impl Engine {
    /// Engine at the starting position with the default table size.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            game_keys: Vec::new(),
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            reductions: ReductionTable::new(),
            limits: Limits::default(),
            stop: Arc::new(AtomicBool::new(false)),
            nodes: 0,
        }
    }

    /// Reset for a new game: starting position, cleared table and history.
    pub fn new_game(&mut self) {
        self.board = Board::starting_position();
        self.game_keys.clear();
        self.nodes = 0;
        self.tt.clear();
        debug!("new game: board and tables reset");
    }

    /// Install a position along with the Zobrist keys of the positions
    /// that preceded it in the game (for repetition detection).
    pub fn set_position(&mut self, board: Board, preceding_keys: Vec<u64>) {
        self.board = board;
        self.game_keys = preceding_keys;
    }

    /// The current position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Set the limits for the next search request.
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Shared stop latch; store `true` to interrupt a running search.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Reallocate the transposition table.
    pub fn resize_tt(&mut self, mb: u64) {
        self.tt.resize(mb);
        debug!(mb, entries = self.tt.len(), "transposition table resized");
    }

    /// Nodes visited by the most recent search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Run iterative deepening under the configured limits and return the
    /// best move found.
    ///
    /// `on_iter` fires after every completed iteration; the front-end uses
    /// it to emit `info` lines. An iteration the clock truncated is
    /// abandoned wholesale: the previous depth's move stands.
    pub fn get_bestmove<F>(&mut self, mut on_iter: F) -> SearchOutcome
    where
        F: FnMut(&IterationReport<'_>),
    {
        self.stop.store(false, Ordering::Relaxed);
        let control = SearchControl::new(Arc::clone(&self.stop), &self.limits);

        let mut ctx = SearchContext {
            nodes: 0,
            tt: &mut self.tt,
            control: &control,
            reductions: &self.reductions,
            pv: PvTable::new(),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            stack: [PlyInfo::default(); MAX_PLY + 4],
            position_keys: self.game_keys.clone(),
        };

        let depth_cap = self.limits.depth.clamp(1, MAX_PLY as i32);
        let mut best_move = None;
        let mut best_score = -VALUE_INF;
        let mut completed_depth = 0;
        let mut prev_score = -VALUE_INF;
        let mut pv_line: Vec<Move> = Vec::new();

        for depth in 1..=depth_cap {
            let score = aspiration_window(&self.board, depth, prev_score, &mut ctx);

            if ctx.control.time_is_up(ctx.nodes) {
                break;
            }

            prev_score = score;
            if let Some(mv) = ctx.pv.root_move() {
                best_move = Some(mv);
            }
            best_score = score;
            completed_depth = depth;
            pv_line = ctx.pv.root_line();

            on_iter(&IterationReport {
                depth,
                score,
                nodes: ctx.nodes,
                elapsed_ms: control.elapsed_ms(),
                pv: &pv_line,
            });

            // The soft budget is consulted between iterations only; a
            // started depth runs until the hard cap.
            if control.past_optimum() {
                break;
            }
        }

        self.nodes = ctx.nodes;
        SearchOutcome {
            best_move,
            score: best_score,
            depth: completed_depth,
            nodes: ctx.nodes,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
