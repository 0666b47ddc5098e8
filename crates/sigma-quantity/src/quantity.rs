//! Quantities: expressions over measured variables.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use log::debug;
use sigma_core::{evaluate, free_symbols, functions, ExprArena, ExprHandle, FunctionId, SymbolId};
use sigma_round::round_measurement;

use crate::deviation::{
    check_bound, evaluate_deviation, substitute_measurements, Deviation, DeviationFormula,
};
use crate::error::Result;
use crate::report::Rounded;
use crate::table::MeasurementTable;
use crate::workspace::Workspace;

/// A value with an uncertainty, kept as a symbolic expression.
///
/// Quantities are immutable. Arithmetic builds a new expression and merges
/// the measurement tables and ignore-sets of the operands. Nothing is
/// evaluated until a value is requested.
///
/// ```
/// use sigma_quantity::Workspace;
///
/// let ws = Workspace::new();
/// let length = ws.measured(&[2.0], 0.1)?;
/// let width = ws.measured(&[3.0], 0.2)?;
/// let area = &length * &width;
///
/// let (value, error) = area.get_value_error()?;
/// assert_eq!(value, 6.0);
/// assert_eq!(error, 0.5);
/// # Ok::<(), sigma_quantity::QuantityError>(())
/// ```
#[derive(Clone)]
pub struct Quantity {
    workspace: Workspace,
    expr: ExprHandle,
    table: Arc<MeasurementTable>,
    ignore: Arc<BTreeSet<SymbolId>>,
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quantity")
            .field("expr", &self.workspace.read().display(self.expr).to_string())
            .field("table", &self.table)
            .field("ignore", &self.ignore)
            .finish()
    }
}

impl Quantity {
    pub(crate) fn from_parts(
        workspace: Workspace,
        expr: ExprHandle,
        table: MeasurementTable,
        ignore: BTreeSet<SymbolId>,
    ) -> Self {
        Self {
            workspace,
            expr,
            table: Arc::new(table),
            ignore: Arc::new(ignore),
        }
    }

    /// The workspace this quantity was built in.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// The expression in the workspace arena.
    #[must_use]
    pub fn expr(&self) -> ExprHandle {
        self.expr
    }

    /// Measurements of every variable this quantity was built from.
    #[must_use]
    pub fn table(&self) -> &MeasurementTable {
        &self.table
    }

    /// Variables excluded from the deviation.
    #[must_use]
    pub fn ignore_set(&self) -> &BTreeSet<SymbolId> {
        &self.ignore
    }

    /// Variables the expression depends on.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<SymbolId> {
        free_symbols(&self.workspace.read(), self.expr)
    }

    /// Applies `f` to the underlying expression.
    ///
    /// `f` may combine any nodes and registered functions; the result is
    /// differentiated exactly. Variables it introduces must be measured
    /// before the quantity is evaluated.
    ///
    /// # Panics
    ///
    /// Panics if `f` returns a handle that is not in the workspace arena.
    #[must_use]
    pub fn use_func<F>(&self, f: F) -> Self
    where
        F: FnOnce(&mut ExprArena, ExprHandle) -> ExprHandle,
    {
        let expr = {
            let mut arena = self.workspace.write();
            let expr = f(&mut arena, self.expr);
            assert!(arena.contains(expr), "use_func returned a foreign handle {expr}");
            expr
        };
        Self {
            workspace: self.workspace.clone(),
            expr,
            table: Arc::clone(&self.table),
            ignore: Arc::clone(&self.ignore),
        }
    }

    /// Applies a registered unary function.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered in the workspace.
    #[must_use]
    pub fn apply(&self, id: FunctionId) -> Self {
        self.use_func(|arena, x| arena.apply(id, x))
    }

    /// `sin(self)`.
    #[must_use]
    pub fn sin(&self) -> Self {
        self.apply(functions::SIN)
    }

    /// `cos(self)`.
    #[must_use]
    pub fn cos(&self) -> Self {
        self.apply(functions::COS)
    }

    /// `tan(self)`.
    #[must_use]
    pub fn tan(&self) -> Self {
        self.apply(functions::TAN)
    }

    /// `exp(self)`.
    #[must_use]
    pub fn exp(&self) -> Self {
        self.apply(functions::EXP)
    }

    /// Natural logarithm.
    #[must_use]
    pub fn ln(&self) -> Self {
        self.apply(functions::LN)
    }

    /// Base 10 logarithm.
    #[must_use]
    pub fn log10(&self) -> Self {
        self.apply(functions::LOG10)
    }

    /// Square root.
    #[must_use]
    pub fn sqrt(&self) -> Self {
        self.apply(functions::SQRT)
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        self.apply(functions::ABS)
    }

    /// Unary plus: the same quantity.
    #[must_use]
    pub fn pos(&self) -> Self {
        self.clone()
    }

    /// Evaluates the expression at the measured values, unrounded.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable or a failed evaluation.
    pub fn value(&self) -> Result<f64> {
        let arena = self.workspace.read();
        check_bound(&arena, self.expr, &self.table)?;
        Ok(evaluate(&arena, self.expr, &*self.table)?)
    }

    /// The deviation formula and its value.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable or a failed evaluation.
    pub fn deviation(&self) -> Result<Deviation> {
        self.deviation_ignoring(&[])
    }

    /// The deviation with the variables of `others` also left out.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable or a failed evaluation.
    ///
    /// # Panics
    ///
    /// Panics if one of `others` belongs to another workspace.
    pub fn deviation_ignoring(&self, others: &[&Quantity]) -> Result<Deviation> {
        let ignore = self.ignoring(others);
        let formula = self.workspace.deviation_expr(self.expr, &ignore)?;
        let substituted = {
            let mut arena = self.workspace.write();
            check_bound(&arena, self.expr, &self.table)?;
            substitute_measurements(&mut arena, formula, &self.table, &ignore)
        };
        DeviationFormula { formula, substituted }.evaluate(&self.workspace.read())
    }

    /// The value and deviation rounded to the significant digits the
    /// deviation supports.
    ///
    /// Only the first evaluation of an expression takes the arena write lock,
    /// to derive its deviation formula.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable, a failed evaluation, or a result
    /// that cannot be rounded.
    pub fn get_value_error(&self) -> Result<(f64, f64)> {
        let formula = self.workspace.deviation_expr(self.expr, &self.ignore)?;

        let (value, deviation) = {
            let arena = self.workspace.read();
            check_bound(&arena, self.expr, &self.table)?;
            let value = evaluate(&arena, self.expr, &*self.table)?;
            (value, evaluate_deviation(&arena, formula, &self.table)?)
        };
        debug!("evaluated {} = {value} ± {deviation}", self.expr);

        Ok(round_measurement(value, deviation)?)
    }

    /// Like [`get_value_error`](Self::get_value_error), formatted with the
    /// workspace configuration when displayed.
    ///
    /// # Errors
    ///
    /// See [`get_value_error`](Self::get_value_error).
    pub fn value_error(&self) -> Result<Rounded> {
        let (value, error) = self.get_value_error()?;
        Ok(Rounded::new(value, error).with_format(self.workspace.config()))
    }

    /// Own ignore-set plus the variables of `others`.
    pub(crate) fn ignoring(&self, others: &[&Quantity]) -> BTreeSet<SymbolId> {
        let mut ignore = (*self.ignore).clone();
        for other in others {
            self.assert_same_workspace(other);
            ignore.extend(other.variables());
        }
        ignore
    }

    pub(crate) fn assert_same_workspace(&self, other: &Quantity) {
        assert!(
            self.workspace.same(&other.workspace),
            "quantities from different workspaces cannot be combined"
        );
    }

    /// Combines two quantities of one workspace.
    pub(crate) fn binary(
        &self,
        rhs: &Quantity,
        build: fn(&mut ExprArena, ExprHandle, ExprHandle) -> ExprHandle,
    ) -> Self {
        self.assert_same_workspace(rhs);
        let expr = build(&mut self.workspace.write(), self.expr, rhs.expr);

        let table = if Arc::ptr_eq(&self.table, &rhs.table) {
            Arc::clone(&self.table)
        } else {
            Arc::new(self.table.merged(&rhs.table))
        };
        let ignore = if Arc::ptr_eq(&self.ignore, &rhs.ignore) {
            Arc::clone(&self.ignore)
        } else {
            Arc::new(self.ignore.union(&rhs.ignore).copied().collect())
        };

        Self {
            workspace: self.workspace.clone(),
            expr,
            table,
            ignore,
        }
    }
}
