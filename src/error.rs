//! Error type shared by every fallible operation in the crate.
//!
//! Solver timeouts are deliberately absent: they are ordinary
//! [`SatResult::Timeout`](crate::sat::oracle::SatResult) values, never errors.

use thiserror::Error;

/// Errors raised while loading formulas, building graphs or persisting them.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A DIMACS line could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A clause referenced a variable outside `1..=num_vars`.
    #[error("literal {literal} is out of range for {num_vars} variables")]
    VariableOutOfRange {
        /// The offending literal.
        literal: i32,
        /// Size of the variable universe.
        num_vars: usize,
    },

    /// The formula has no model, so no graph or sample can be built from it.
    #[error("formula is unsatisfiable")]
    Unsatisfiable,

    /// Binary (de)serialisation failed.
    #[error("serialisation error: {0}")]
    Persistence(#[from] bincode::Error),

    /// A persisted graph is malformed.
    #[error("invalid implication graph: {0}")]
    InvalidGraph(String),

    /// An internal consistency check failed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SamplerError>;
