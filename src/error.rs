//! Error taxonomy for the engine.
//!
//! Probable-prime results are never errors: a tri-state
//! [`Primality::ProbablyPrime`](crate::Primality) is the honest output of a
//! probabilistic test and flows through the deciders as a value. Errors are
//! reserved for contract violations and exhausted parameter searches.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Caller supplied a value outside the stated contract (bad Stirling
    /// type, Miller–Rabin base below 2, Lucas parameters with zero
    /// discriminant, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter search hit its hard cap without finding a suitable value.
    /// Indicates a pathological input or a bug; never silently mapped to
    /// composite.
    #[error("{what} parameter search exhausted at bound {bound}")]
    ParameterSearchExhausted { what: &'static str, bound: u64 },
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Error {
        Error::InvalidArgument(msg.into())
    }
}
