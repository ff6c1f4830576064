//! UCI command parsing.

use petrel_engine::Board;

use crate::error::UciError;

/// Parameters of a `go` command. Absent fields leave that axis
/// unconstrained.
#[derive(Debug, Default, Clone)]
pub struct GoParams {
    /// `go depth N` -- fixed-depth search.
    pub depth: Option<i32>,
    /// `go movetime N` -- exact time for this move, milliseconds.
    pub movetime: Option<u64>,
    /// White's remaining clock, milliseconds.
    pub wtime: Option<i64>,
    /// Black's remaining clock, milliseconds.
    pub btime: Option<i64>,
    /// White's increment per move, milliseconds.
    pub winc: Option<i64>,
    /// Black's increment per move, milliseconds.
    pub binc: Option<i64>,
    /// Moves until the next time control.
    pub movestogo: Option<i64>,
    /// Node budget.
    pub nodes: Option<u64>,
    /// `go mate N` -- find a mate in N full moves.
    pub mate: Option<i32>,
    /// `go infinite` -- search until stopped.
    pub infinite: bool,
    /// `go perft N` -- run the move-generation walk instead of searching.
    pub perft: Option<u32>,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine and its options.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset board and tables.
    UciNewGame,
    /// `position` -- board plus the Zobrist keys of its predecessors.
    Position {
        /// The resulting position.
        board: Board,
        /// Keys of every position leading up to it, for repetition checks.
        preceding_keys: Vec<u64>,
    },
    /// `go` -- start a search (or perft) with the given parameters.
    Go(GoParams),
    /// `stop` -- interrupt the running search.
    Stop,
    /// `eval` -- print the static evaluation of the current position.
    Eval,
    /// `debug on|off` -- toggle info-line output.
    Debug(bool),
    /// `setoption name <name> value <value>`.
    SetOption {
        /// Option name.
        name: String,
        /// Option value, possibly empty.
        value: String,
    },
    /// `quit` -- leave the protocol loop.
    Quit,
    /// Anything unrecognized; ignored per the UCI convention.
    Unknown(String),
}

/// Parse one line of UCI input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = tokens.first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "eval" => Ok(Command::Eval),
        "debug" => parse_debug(&tokens[1..]),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        "setoption" => parse_setoption(&tokens[1..]),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

fn parse_debug(tokens: &[&str]) -> Result<Command, UciError> {
    match tokens.first() {
        Some(&"on") => Ok(Command::Debug(true)),
        Some(&"off") => Ok(Command::Debug(false)),
        _ => Err(UciError::MissingValue {
            param: "debug".to_string(),
        }),
    }
}

/// Parse `position startpos|fen <fen> [moves ...]`, replaying the listed
/// moves and collecting each predecessor's Zobrist key along the way.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut board, rest) = if tokens[0] == "startpos" {
        (Board::starting_position(), &tokens[1..])
    } else if tokens[0] == "fen" {
        // A FEN is six space-separated fields.
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let board = Board::from_fen(&fen).map_err(|_| UciError::InvalidFen { fen })?;
        (board, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    let mut preceding_keys = Vec::new();
    if let Some((&"moves", moves)) = rest.split_first() {
        for uci in moves {
            let mv = board
                .move_from_uci(uci)
                .ok_or_else(|| UciError::InvalidMove {
                    uci_move: uci.to_string(),
                })?;
            preceding_keys.push(board.hash());
            board = board.make_move(&mv);
        }
    }

    Ok(Command::Position {
        board,
        preceding_keys,
    })
}

fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        match token {
            "infinite" => params.infinite = true,
            "depth" => params.depth = Some(numeric(token, iter.next())?),
            "movetime" => params.movetime = Some(numeric(token, iter.next())?),
            "wtime" => params.wtime = Some(numeric(token, iter.next())?),
            "btime" => params.btime = Some(numeric(token, iter.next())?),
            "winc" => params.winc = Some(numeric(token, iter.next())?),
            "binc" => params.binc = Some(numeric(token, iter.next())?),
            "movestogo" => params.movestogo = Some(numeric(token, iter.next())?),
            "nodes" => params.nodes = Some(numeric(token, iter.next())?),
            "mate" => params.mate = Some(numeric(token, iter.next())?),
            "perft" => params.perft = Some(numeric(token, iter.next())?),
            _ => {}
        }
    }

    Ok(Command::Go(params))
}

fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    // Shape: setoption name <name...> [value <value...>]
    enum Section {
        Skip,
        Name,
        Value,
    }

    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut section = Section::Skip;

    for &token in tokens {
        match token {
            "name" => section = Section::Name,
            "value" => section = Section::Value,
            _ => match section {
                Section::Name => name_parts.push(token),
                Section::Value => value_parts.push(token),
                Section::Skip => {}
            },
        }
    }

    if name_parts.is_empty() {
        return Err(UciError::MissingValue {
            param: "setoption name".to_string(),
        });
    }

    Ok(Command::SetOption {
        name: name_parts.join(" "),
        value: value_parts.join(" "),
    })
}

fn numeric<T: std::str::FromStr>(param: &str, token: Option<&&str>) -> Result<T, UciError> {
    let token = token.ok_or_else(|| UciError::MissingValue {
        param: param.to_string(),
    })?;
    token.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(
            parse_command("ucinewgame").unwrap(),
            Command::UciNewGame
        ));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
        assert!(matches!(parse_command("eval").unwrap(), Command::Eval));
    }

    #[test]
    fn parses_debug_toggle() {
        assert!(matches!(parse_command("debug on").unwrap(), Command::Debug(true)));
        assert!(matches!(
            parse_command("debug off").unwrap(),
            Command::Debug(false)
        ));
        assert!(parse_command("debug").is_err());
    }

    #[test]
    fn parses_position_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 e7e5").unwrap();
        let Command::Position {
            board,
            preceding_keys,
        } = cmd
        else {
            panic!("expected position command");
        };
        assert_eq!(preceding_keys.len(), 2);
        assert!(board.side_to_move().is_white());
        assert_ne!(preceding_keys[0], board.hash());
    }

    #[test]
    fn parses_position_fen() {
        let cmd = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert!(matches!(cmd, Command::Position { .. }));
    }

    #[test]
    fn rejects_bad_positions() {
        assert!(parse_command("position").is_err());
        assert!(parse_command("position fen garbage").is_err());
        assert!(parse_command("position startpos moves e2e5").is_err());
    }

    #[test]
    fn parses_go_clock_parameters() {
        let cmd =
            parse_command("go wtime 300000 btime 290000 winc 2000 binc 2000 movestogo 35").unwrap();
        let Command::Go(params) = cmd else {
            panic!("expected go");
        };
        assert_eq!(params.wtime, Some(300_000));
        assert_eq!(params.btime, Some(290_000));
        assert_eq!(params.winc, Some(2_000));
        assert_eq!(params.binc, Some(2_000));
        assert_eq!(params.movestogo, Some(35));
        assert!(!params.infinite);
    }

    #[test]
    fn parses_go_depth_nodes_mate_and_movetime() {
        let Command::Go(params) =
            parse_command("go depth 9 nodes 100000 mate 3 movetime 1500").unwrap()
        else {
            panic!("expected go");
        };
        assert_eq!(params.depth, Some(9));
        assert_eq!(params.nodes, Some(100_000));
        assert_eq!(params.mate, Some(3));
        assert_eq!(params.movetime, Some(1_500));
    }

    #[test]
    fn parses_go_infinite_and_perft() {
        let Command::Go(params) = parse_command("go infinite").unwrap() else {
            panic!("expected go");
        };
        assert!(params.infinite);

        let Command::Go(params) = parse_command("go perft 5").unwrap() else {
            panic!("expected go");
        };
        assert_eq!(params.perft, Some(5));
    }

    #[test]
    fn bare_go_is_unconstrained() {
        let Command::Go(params) = parse_command("go").unwrap() else {
            panic!("expected go");
        };
        assert!(params.depth.is_none());
        assert!(params.movetime.is_none());
        assert!(!params.infinite);
    }

    #[test]
    fn go_rejects_malformed_numbers() {
        assert!(parse_command("go depth").is_err());
        assert!(parse_command("go nodes many").is_err());
    }

    #[test]
    fn parses_setoption() {
        let Command::SetOption { name, value } =
            parse_command("setoption name Hash value 128").unwrap()
        else {
            panic!("expected setoption");
        };
        assert_eq!(name, "Hash");
        assert_eq!(value, "128");
        assert!(parse_command("setoption value 3").is_err());
    }

    #[test]
    fn unknown_commands_pass_through() {
        assert!(matches!(
            parse_command("xyzzy").unwrap(),
            Command::Unknown(_)
        ));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }
}
