//! Errors raised while evaluating or differentiating expressions.

use thiserror::Error;

use crate::handle::{ExprHandle, FunctionId};

/// Errors that can occur when working with arena expressions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A symbol was evaluated without a value.
    #[error("symbol `{0}` has no value")]
    UnboundSymbol(String),

    /// A denominator (or a zero base raised to a negative power) evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operation produced an infinite or NaN result.
    #[error("{0} produced a non-finite result")]
    NonFinite(String),

    /// A function node refers to an id that is not registered.
    #[error("function {0} is not registered")]
    UnknownFunction(FunctionId),

    /// A handle does not point into this arena.
    #[error("expression {0} does not belong to this arena")]
    InvalidHandle(ExprHandle),
}
