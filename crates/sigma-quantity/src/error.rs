//! Errors for building and querying quantities.

use sigma_core::{ExprError, ExprHandle};
use sigma_round::RoundingError;
use thiserror::Error;

/// Errors that can occur when constructing or evaluating a [`Quantity`](crate::Quantity).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum QuantityError {
    /// A measurement needs at least one sample.
    #[error("a measurement needs at least one sample")]
    EmptySamples,

    /// A sample was NaN or infinite.
    #[error("sample {index} is not finite: {value}")]
    InvalidSample {
        /// Position of the offending sample.
        index: usize,
        /// The rejected value.
        value: f64,
    },

    /// A constant was NaN or infinite.
    #[error("constant is not finite: {0}")]
    InvalidConstant(f64),

    /// The systematic deviation was negative or not finite.
    #[error("systematic deviation must be finite and non-negative, got {0}")]
    InvalidSystematic(f64),

    /// A measurement name was empty.
    #[error("measurement name is empty")]
    EmptyName,

    /// A measurement name is already bound in the workspace.
    #[error("name `{0}` is already in use")]
    NameInUse(String),

    /// A formula handle was not created in this workspace.
    #[error("expression {0} does not belong to this workspace")]
    ForeignExpression(ExprHandle),

    /// The expression uses a variable without a measurement.
    #[error("variable `{0}` has no measurement")]
    MissingVariable(String),

    /// Evaluation or differentiation failed.
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// The result could not be rounded.
    #[error(transparent)]
    Rounding(#[from] RoundingError),
}

/// Result alias for quantity operations.
pub type Result<T> = std::result::Result<T, QuantityError>;
