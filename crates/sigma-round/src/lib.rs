//! # sigma-round
//!
//! Rounding of a measurement to the significant digits its uncertainty
//! supports.
//!
//! The deviation keeps one significant digit (two when the leading digit is
//! a 1) and the value is rounded to the same decimal place. Rounding is done
//! on the exact decimal expansion of the binary inputs, held in big integers
//! from [`dashu`], so any finite magnitude rounds. Ties go to the even digit.
//!
//! ```
//! use sigma_round::round_measurement;
//!
//! assert_eq!(round_measurement(123.456, 25.0).unwrap(), (120.0, 20.0));
//! assert_eq!(round_measurement(2.5, 0.0).unwrap(), (2.5, 0.0));
//!
//! let charge = round_measurement(1.602176634e-19, 3.1e-27).unwrap();
//! assert_eq!(charge, (1.60217663e-19, 3e-27));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decimal;
pub mod error;
pub mod rule;

#[cfg(test)]
mod proptests;

pub use decimal::ExactDecimal;
pub use error::RoundingError;
pub use rule::{precision_for, round_measurement, round_pair};
