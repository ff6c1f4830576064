//! UCI protocol errors.

/// Errors raised while parsing or serving the UCI protocol.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The `position` command is missing its `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// A FEN string failed to parse.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// A move in the `position` command is not legal in its position.
    #[error("invalid move: {uci_move}")]
    InvalidMove {
        /// The UCI move string that failed to apply.
        uci_move: String,
    },

    /// A parameter is missing its required value.
    #[error("missing value for parameter: {param}")]
    MissingValue {
        /// The parameter name (e.g. "wtime", "depth").
        param: String,
    },

    /// A parameter value could not be parsed.
    #[error("invalid value for parameter {param}: {value}")]
    InvalidValue {
        /// The parameter name.
        param: String,
        /// The value string that failed to parse.
        value: String,
    },

    /// An I/O error while reading stdin.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
