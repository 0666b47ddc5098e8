//! # Sigma
//!
//! Error propagation for laboratory measurements.
//!
//! A measured quantity is a symbolic expression over independent variables,
//! each with a value and a standard deviation. Arithmetic on quantities
//! builds expressions; the uncertainty of the result follows from exact
//! partial derivatives and is rounded to the digits it supports.
//!
//! ## Features
//!
//! - **Symbolic Core**: Arena-allocated, hash-consed expressions with exact
//!   differentiation and LaTeX output
//! - **Exact Rounding**: Big-integer decimals with half-even ties, at any
//!   magnitude
//! - **Ergonomic Quantities**: Operators on quantities and plain numbers
//! - **Reports**: Every step of a derivation, ready for a lab write-up
//!
//! ## Quick Start
//!
//! ```rust
//! use sigma::prelude::*;
//!
//! let ws = Workspace::new();
//! let u = ws.measured_named("U", &[12.1, 11.9, 12.0], 0.0)?;
//! let i = ws.measured_named("I", &[2.0], 0.05)?;
//! let r = &u / &i;
//!
//! assert_eq!(r.value_error()?.to_string(), "6 ± 0.16");
//! println!("{}", r.report()?);
//! # Ok::<(), QuantityError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use sigma_core as core;
pub use sigma_quantity as quantity;
pub use sigma_round as round;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sigma_core::{ExprArena, ExprHandle, ExprNode, FunctionId, UnaryFunction};
    pub use sigma_quantity::{
        BatchConfig, FormatConfig, Measurement, Quantity, QuantityError, Rounded, Source,
        VerboseReport, Workspace,
    };
    pub use sigma_round::{round_measurement, ExactDecimal, RoundingError};
}

#[cfg(test)]
mod tests;
