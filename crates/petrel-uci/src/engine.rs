//! Event-driven UCI engine loop.
//!
//! A reader thread feeds stdin lines into a channel; searches run on a
//! worker thread that carries the engine away and returns it together with
//! the result. The main loop therefore stays responsive to `stop`,
//! `isready`, and `quit` while a search is in flight.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use tracing::{debug, info, warn};

use petrel_engine::types::{is_mate, VALUE_MATE};
use petrel_engine::{calculate_move_time, evaluate, Board, Engine, Limits, SearchOutcome, TimeBudget};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;
use crate::perft;

/// Supported Hash option range, in mebibytes.
const HASH_MIN_MB: u64 = 1;
const HASH_MAX_MB: u64 = 4096;

enum EngineState {
    Idle,
    Searching,
}

enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(Box<SearchDone>),
    InputClosed,
}

struct SearchDone {
    outcome: SearchOutcome,
    engine: Engine,
}

/// The UCI front-end: current position, the searcher, and pending
/// maintenance that must wait for the searcher to come back.
pub struct UciEngine {
    board: Board,
    preceding_keys: Vec<u64>,
    engine: Option<Engine>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
    debug: bool,
    pending_new_game: bool,
    pending_hash_mb: Option<u64>,
}

impl UciEngine {
    /// Front-end at the starting position with a fresh engine.
    pub fn new() -> Self {
        let engine = Engine::new();
        let stop_flag = engine.stop_flag();
        Self {
            board: Board::starting_position(),
            preceding_keys: Vec::new(),
            engine: Some(engine),
            state: EngineState::Idle,
            stop_flag,
            debug: true,
            pending_new_game: false,
            pending_hash_mb: None,
        }
    }

    /// Run the protocol loop until `quit` or stdin closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received UCI command");
                        if stdin_tx
                            .send(EngineEvent::UciCommand(parse_command(trimmed)))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position {
                        board,
                        preceding_keys,
                    } => {
                        self.board = board;
                        self.preceding_keys = preceding_keys;
                    }
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::Stop => self.stop_flag.store(true, Ordering::Relaxed),
                    Command::Eval => {
                        println!("info string eval {} cp", evaluate(&self.board));
                    }
                    Command::Debug(on) => self.debug = on,
                    Command::SetOption { name, value } => self.handle_setoption(&name, &value),
                    Command::Quit => {
                        if !matches!(self.state, EngineState::Idle) {
                            self.stop_flag.store(true, Ordering::Relaxed);
                            for pending in &rx {
                                if let EngineEvent::SearchDone(done) = pending {
                                    self.finish_search(*done);
                                    break;
                                }
                            }
                        }
                        break;
                    }
                    Command::Unknown(_) => {}
                },
                EngineEvent::UciCommand(Err(e)) => {
                    // Malformed input is a no-op.
                    warn!(error = %e, "UCI parse error");
                }
                EngineEvent::SearchDone(done) => self.finish_search(*done),
                EngineEvent::InputClosed => break,
            }
        }

        info!("petrel shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name petrel");
        println!("id author the petrel authors");
        println!(
            "option name Hash type spin default 64 min {HASH_MIN_MB} max {HASH_MAX_MB}"
        );
        println!("option name Threads type spin default 1 min 1 max 1");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        self.preceding_keys.clear();
        if let Some(ref mut engine) = self.engine {
            engine.new_game();
        } else {
            // The search thread owns the engine; reset when it returns.
            self.pending_new_game = true;
        }
    }

    fn handle_setoption(&mut self, name: &str, value: &str) {
        match name {
            "Hash" => {
                let Ok(mb) = value.parse::<u64>() else {
                    warn!(value, "unparsable Hash value");
                    return;
                };
                let mb = mb.clamp(HASH_MIN_MB, HASH_MAX_MB);
                if let Some(ref mut engine) = self.engine {
                    engine.resize_tt(mb);
                } else {
                    self.pending_hash_mb = Some(mb);
                }
            }
            // Single-threaded engine: the option exists, the value is fixed.
            "Threads" => {}
            _ => warn!(name, "unknown option"),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if !matches!(self.state, EngineState::Idle) {
            warn!("go received while searching, ignoring");
            return;
        }

        if let Some(depth) = params.perft {
            perft::run(&self.board, depth);
            return;
        }

        let mut engine = self.engine.take().unwrap_or_default();
        engine.set_position(self.board.clone(), self.preceding_keys.clone());
        engine.set_limits(limits_from(&params, self.board.side_to_move().is_white()));

        self.stop_flag = engine.stop_flag();
        self.stop_flag.store(false, Ordering::Relaxed);

        let debug_lines = self.debug;
        let tx = tx.clone();
        std::thread::spawn(move || {
            let outcome = engine.get_bestmove(|report| {
                if !debug_lines {
                    return;
                }
                let nps = report.nodes * 1000 / report.elapsed_ms.max(1);
                let pv: Vec<String> = report.pv.iter().map(Board::move_to_uci).collect();
                println!(
                    "info depth {} score {} nodes {} time {} nps {} pv {}",
                    report.depth,
                    format_score(report.score),
                    report.nodes,
                    report.elapsed_ms,
                    nps,
                    pv.join(" ")
                );
            });
            let _ = tx.send(EngineEvent::SearchDone(Box::new(SearchDone {
                outcome,
                engine,
            })));
        });

        self.state = EngineState::Searching;
    }

    fn finish_search(&mut self, done: SearchDone) {
        let mut engine = done.engine;

        if self.pending_new_game {
            engine.new_game();
            self.pending_new_game = false;
        }
        if let Some(mb) = self.pending_hash_mb.take() {
            engine.resize_tt(mb);
        }
        self.engine = Some(engine);
        self.state = EngineState::Idle;

        match done.outcome.best_move {
            Some(ref mv) => println!("bestmove {}", Board::move_to_uci(mv)),
            None => println!("bestmove 0000"),
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate `go` parameters into search limits for the side to move.
fn limits_from(params: &GoParams, white_to_move: bool) -> Limits {
    let mut limits = Limits::default();

    if let Some(depth) = params.depth {
        limits.depth = depth;
    }
    // `go mate N` counts full moves; search deep enough to prove it.
    if let Some(mate) = params.mate {
        limits.depth = 2 * mate;
    }
    if let Some(nodes) = params.nodes {
        limits.nodes = nodes;
    }
    if params.infinite {
        limits.infinite = true;
        return limits;
    }

    if let Some(movetime) = params.movetime {
        limits.time = TimeBudget {
            optimum: movetime,
            maximum: movetime,
        };
    } else {
        let (remaining, increment) = if white_to_move {
            (params.wtime, params.winc)
        } else {
            (params.btime, params.binc)
        };
        if let Some(remaining) = remaining {
            limits.time = calculate_move_time(
                remaining,
                increment.unwrap_or(0),
                params.movestogo.unwrap_or(0),
            );
        }
    }

    limits
}

/// Format a score as `cp <n>` or `mate <n>`, mate distance in full moves,
/// negative when the side to move is the one being mated.
fn format_score(score: i32) -> String {
    if is_mate(score) {
        let distance = (VALUE_MATE - score.abs() + 1) / 2;
        if score > 0 {
            format!("mate {distance}")
        } else {
            format!("mate -{distance}")
        }
    } else {
        format!("cp {score}")
    }
}
