//! # sigma-quantity
//!
//! Measured quantities with first-order uncertainty propagation.
//!
//! This crate provides:
//! - [`Workspace`]: the shared arena, naming counter and output format
//! - [`Quantity`]: an expression over measured variables with overloaded
//!   arithmetic, elementary functions and band comparisons
//! - The deviation formula `sqrt(sum (df/dx_i * sigma_i)^2)` built
//!   symbolically, so every step can be printed
//! - Rounding to the significant digits the deviation supports
//! - Plain `value ± error` output and verbose LaTeX reports
//! - Parallel batch evaluation for plotting and fitting
//!
//! ```
//! use sigma_quantity::Workspace;
//!
//! let ws = Workspace::new();
//! let g = ws.measured(&[9.79, 9.83, 9.81, 9.82], 0.0)?;
//! let t = ws.measured_named("t", &[1.0], 0.01)?;
//! let fall = 0.5 * &g * t.pow(2);
//!
//! let (value, error) = fall.get_value_error()?;
//! assert_eq!(value, 4.91);
//! assert_eq!(error, 0.1);
//! # Ok::<(), sigma_quantity::QuantityError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod compare;
pub mod config;
pub mod deviation;
pub mod error;
pub mod ops;
pub mod quantity;
pub mod report;
pub mod table;
pub mod workspace;

#[cfg(test)]
mod proptests;

pub use batch::{columns, value_errors};
pub use compare::{band_less, bands_equal};
pub use config::{BatchConfig, FormatConfig};
pub use deviation::{derive, propagate, Deviation, DeviationFormula};
pub use error::{QuantityError, Result};
pub use ops::Operand;
pub use quantity::Quantity;
pub use report::{format_general, Rounded, VerboseReport};
pub use table::{Measurement, MeasurementTable};
pub use workspace::{Source, Workspace};
