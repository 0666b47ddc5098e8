//! First-order propagation of uncertainty.
//!
//! For an expression `f` over independent variables `x_i` with deviations
//! `sigma_x_i`, the deviation is
//!
//! ```text
//! sigma_f = sqrt( sum_i (df/dx_i * sigma_x_i)^2 )
//! ```
//!
//! The formula is built symbolically so it can be printed, then evaluated
//! with the measured values.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use sigma_core::{
    differentiate, evaluate, free_symbols, simplify, substitute, Bindings, ExprArena, ExprHandle,
    SymbolId,
};

use crate::error::{QuantityError, Result};
use crate::table::MeasurementTable;

/// The symbolic deviation of an expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviationFormula {
    /// `sqrt(sum of squared contributions)`, simplified.
    pub formula: ExprHandle,
    /// The formula with values and deviations substituted, unsimplified.
    pub substituted: ExprHandle,
}

/// A deviation formula together with its numeric value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deviation {
    /// `sqrt(sum of squared contributions)`, simplified.
    pub formula: ExprHandle,
    /// The formula with values and deviations substituted, unsimplified.
    pub substituted: ExprHandle,
    /// Numeric value of the deviation.
    pub value: f64,
}

/// Fails with [`QuantityError::MissingVariable`] if a free variable of `expr`
/// has no measurement.
///
/// # Errors
///
/// Names the first unmeasured variable.
pub fn check_bound(arena: &ExprArena, expr: ExprHandle, table: &MeasurementTable) -> Result<()> {
    match free_symbols(arena, expr).into_iter().find(|&v| !table.contains(v)) {
        Some(missing) => Err(QuantityError::MissingVariable(
            arena.symbol_name(missing).unwrap_or("?").to_owned(),
        )),
        None => Ok(()),
    }
}

/// Builds `sqrt(sum (df/dv * sigma_v)^2)` over the free variables `v` of
/// `expr` that are not in `ignore`, simplified.
///
/// Each `sigma_v` is the arena's deviation symbol of `v`, never a named
/// variable. When no variable is left the formula is the literal zero. The
/// result depends on `expr` and `ignore` only, not on any measurement.
///
/// # Errors
///
/// [`QuantityError::Expr`] if differentiation fails.
pub fn deviation_expr(
    arena: &mut ExprArena,
    expr: ExprHandle,
    ignore: &BTreeSet<SymbolId>,
) -> Result<ExprHandle> {
    let mut terms = Vec::new();
    for variable in free_symbols(arena, expr) {
        if ignore.contains(&variable) {
            continue;
        }
        let sigma = arena
            .deviation_symbol(variable)
            .ok_or_else(|| QuantityError::MissingVariable(format!("{variable:?}")))?;
        let partial = differentiate(arena, expr, variable)?;
        let sigma_expr = arena.symbol_expr(sigma);
        let contribution = arena.mul([partial, sigma_expr]);
        terms.push(arena.square(contribution));
    }

    let formula = if terms.is_empty() {
        arena.integer(0)
    } else {
        let sum = arena.add(terms);
        let root = arena.sqrt(sum);
        simplify(arena, root)
    };
    trace!("deviation of {} is {}", arena.display(expr), arena.display(formula));
    Ok(formula)
}

/// Measured values, plus measured deviations under the deviation symbols.
struct MeasuredBindings<'a> {
    table: &'a MeasurementTable,
    deviations: BTreeMap<SymbolId, f64>,
}

impl Bindings for MeasuredBindings<'_> {
    fn value_of(&self, symbol: SymbolId) -> Option<f64> {
        self.deviations
            .get(&symbol)
            .copied()
            .or_else(|| self.table.value_of(symbol))
    }
}

/// Evaluates a formula from [`deviation_expr`] at the measurements of `table`.
///
/// Only reads the arena.
///
/// # Errors
///
/// Fails if evaluation divides by zero, leaves the finite range or meets an
/// unmeasured variable.
pub fn evaluate_deviation(
    arena: &ExprArena,
    formula: ExprHandle,
    table: &MeasurementTable,
) -> Result<f64> {
    let deviations = table
        .iter()
        .filter_map(|(variable, m)| Some((arena.find_deviation_symbol(variable)?, m.deviation)))
        .collect();
    let bindings = MeasuredBindings { table, deviations };
    Ok(evaluate(arena, formula, &bindings)?)
}

/// Replaces values and deviations in a deviation formula by literals.
pub(crate) fn substitute_measurements(
    arena: &mut ExprArena,
    formula: ExprHandle,
    table: &MeasurementTable,
    ignore: &BTreeSet<SymbolId>,
) -> ExprHandle {
    let mut replacements = BTreeMap::new();
    for (variable, measurement) in table.iter() {
        let value = arena.real(measurement.value);
        replacements.insert(variable, value);
        if ignore.contains(&variable) {
            continue;
        }
        if let Some(sigma) = arena.find_deviation_symbol(variable) {
            let deviation = arena.real(measurement.deviation);
            replacements.insert(sigma, deviation);
        }
    }
    substitute(arena, formula, &replacements)
}

/// Builds the deviation formula of `expr` and its substituted form.
///
/// Variables in `ignore` contribute nothing. When no variable is left the
/// formula is the literal zero.
///
/// # Errors
///
/// [`QuantityError::MissingVariable`] for an unmeasured free variable and
/// [`QuantityError::Expr`] if differentiation fails.
pub fn derive(
    arena: &mut ExprArena,
    expr: ExprHandle,
    table: &MeasurementTable,
    ignore: &BTreeSet<SymbolId>,
) -> Result<DeviationFormula> {
    check_bound(arena, expr, table)?;
    let formula = deviation_expr(arena, expr, ignore)?;
    let substituted = substitute_measurements(arena, formula, table, ignore);
    Ok(DeviationFormula { formula, substituted })
}

impl DeviationFormula {
    /// Evaluates the substituted formula.
    ///
    /// # Errors
    ///
    /// Fails if evaluation divides by zero or leaves the finite range.
    pub fn evaluate(self, arena: &ExprArena) -> Result<Deviation> {
        let value = evaluate(arena, self.substituted, &BTreeMap::new())?;
        Ok(Deviation {
            formula: self.formula,
            substituted: self.substituted,
            value,
        })
    }
}

/// Builds and evaluates the deviation of `expr` in one step.
///
/// # Errors
///
/// See [`derive`] and [`DeviationFormula::evaluate`].
pub fn propagate(
    arena: &mut ExprArena,
    expr: ExprHandle,
    table: &MeasurementTable,
    ignore: &BTreeSet<SymbolId>,
) -> Result<Deviation> {
    derive(arena, expr, table, ignore)?.evaluate(arena)
}
