//! # sigma-core
//!
//! Symbolic expression engine for the sigma uncertainty calculator.
//!
//! This crate provides:
//! - Arena-allocated, hash-consed expression storage
//! - Type-safe handles for expressions, symbols and functions
//! - Exact symbolic differentiation with a pluggable function registry
//! - Substitution, numeric evaluation and simplification
//! - Plain-text and LaTeX rendering
//!
//! ```
//! use std::collections::BTreeMap;
//! use sigma_core::{differentiate, evaluate, simplify, ExprArena};
//!
//! let mut arena = ExprArena::new();
//! let x = arena.symbol("x");
//! let y = arena.symbol("y");
//! let f = arena.mul([x, y]);
//!
//! let x_id = arena.intern_symbol("x");
//! let df = differentiate(&mut arena, f, x_id).unwrap();
//! let df = simplify(&mut arena, df);
//! assert_eq!(df, y);
//!
//! let y_id = arena.intern_symbol("y");
//! let values = BTreeMap::from([(x_id, 2.0), (y_id, 3.0)]);
//! assert_eq!(evaluate(&arena, f, &values).unwrap(), 6.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod diff;
pub mod display;
pub mod error;
pub mod eval;
pub mod expr;
pub mod function;
pub mod handle;
pub mod intern;
pub mod simplify;

#[cfg(test)]
mod proptests;

pub use arena::ExprArena;
pub use diff::differentiate;
pub use display::{ExprDisplay, Style};
pub use error::ExprError;
pub use eval::{depends_on, evaluate, free_symbols, substitute, Bindings};
pub use expr::{functions, ExprNode, RealBits};
pub use function::{Builtin, UnaryFunction};
pub use handle::{ArenaId, ExprHandle, FunctionId, SymbolId};
pub use simplify::simplify;
