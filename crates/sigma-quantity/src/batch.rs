//! Evaluating many quantities at once.
//!
//! Plotting and curve fitting consume columns of values and errors. Large
//! batches are evaluated on the rayon pool; the symbolic step of each
//! quantity holds the arena write lock briefly and numeric evaluation runs
//! under shared read locks.

use log::debug;
use rayon::prelude::*;

use crate::config::BatchConfig;
use crate::error::Result;
use crate::quantity::Quantity;
use crate::report::Rounded;

/// Rounded value and error of every quantity, in order.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn value_errors(quantities: &[Quantity], config: &BatchConfig) -> Result<Vec<Rounded>> {
    if quantities.len() < config.parallel_threshold {
        return quantities.iter().map(Quantity::value_error).collect();
    }

    debug!("evaluating {} quantities in parallel", quantities.len());
    quantities.par_iter().map(Quantity::value_error).collect()
}

/// Splits rounded results into a value column and an error column.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn columns(quantities: &[Quantity], config: &BatchConfig) -> Result<(Vec<f64>, Vec<f64>)> {
    Ok(value_errors(quantities, config)?
        .into_iter()
        .map(Rounded::pair)
        .unzip())
}

/// Cuts `items` into consecutive runs of the given lengths.
///
/// Runs past the end of `items` are truncated, possibly to empty slices.
///
/// ```
/// use sigma_quantity::batch::split_runs;
///
/// let data = [1, 2, 3, 4, 5, 6];
/// assert_eq!(split_runs(&data, &[2, 3, 4]), vec![&data[0..2], &data[2..5], &data[5..6]]);
/// ```
#[must_use]
pub fn split_runs<'a, T>(items: &'a [T], lengths: &[usize]) -> Vec<&'a [T]> {
    let mut start = 0;
    lengths
        .iter()
        .map(|&len| {
            let from = start.min(items.len());
            start = start.saturating_add(len);
            &items[from..start.min(items.len())]
        })
        .collect()
}
