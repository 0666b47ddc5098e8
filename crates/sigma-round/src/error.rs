//! Rounding errors.

use thiserror::Error;

/// Errors that can occur while rounding a measurement.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RoundingError {
    /// The deviation was below zero.
    #[error("deviation must be non-negative, got {0}")]
    NegativeDeviation(String),

    /// An input was NaN or infinite.
    #[error("cannot round non-finite value {0}")]
    NonFinite(f64),

    /// A rounded result does not fit an `f64`.
    #[error("{0} is outside the range of f64")]
    OutOfRange(String),

    /// A decimal literal did not parse.
    #[error("invalid decimal literal {0:?}")]
    InvalidLiteral(String),
}
