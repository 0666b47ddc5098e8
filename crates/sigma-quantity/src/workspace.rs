//! The construction context shared by related quantities.
//!
//! A [`Workspace`] owns the expression arena, the counter used to name
//! anonymous variables, the derived deviation formulas and the formatting
//! configuration. It is cheap to clone and safe to share across threads.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use sigma_core::{ExprArena, ExprHandle, FunctionId, SymbolId, UnaryFunction};

use crate::config::FormatConfig;
use crate::deviation::deviation_expr;
use crate::error::{QuantityError, Result};
use crate::quantity::Quantity;
use crate::table::{Measurement, MeasurementTable};

/// Where a new quantity comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// A number without uncertainty, named `const<N>`.
    Constant(f64),
    /// Repeated readings of one variable plus a systematic deviation.
    Samples {
        /// The readings.
        values: Vec<f64>,
        /// Systematic deviation combined in quadrature.
        systematic: f64,
        /// Variable name, `c<N>` when absent.
        name: Option<String>,
    },
    /// An expression over already measured variables.
    Formula {
        /// Expression in this workspace's arena.
        expr: ExprHandle,
        /// Measurements of the variables.
        table: MeasurementTable,
        /// Variables left out of the deviation.
        ignore: BTreeSet<SymbolId>,
    },
}

type FormulaKey = (ExprHandle, BTreeSet<SymbolId>);

struct Inner {
    arena: RwLock<ExprArena>,
    counter: AtomicU64,
    formulas: RwLock<HashMap<FormulaKey, ExprHandle>>,
    config: FormatConfig,
}

/// Shared arena, naming counter and configuration.
#[derive(Clone)]
pub struct Workspace {
    inner: Arc<Inner>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("expressions", &self.read().len())
            .field("counter", &self.inner.counter.load(Ordering::Relaxed))
            .field("formulas", &self.inner.formulas.read().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Workspace {
    /// Creates a workspace with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    /// Creates a workspace with a custom configuration.
    #[must_use]
    pub fn with_config(config: FormatConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                arena: RwLock::new(ExprArena::new()),
                counter: AtomicU64::new(0),
                formulas: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// The formatting configuration.
    #[must_use]
    pub fn config(&self) -> &FormatConfig {
        &self.inner.config
    }

    /// Locks the arena for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ExprArena> {
        self.inner.arena.read()
    }

    /// Locks the arena for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, ExprArena> {
        self.inner.arena.write()
    }

    /// Returns true if both handles refer to the same workspace.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The deviation formula of `expr` with `ignore` left out.
    ///
    /// Formulas are derived once per expression and ignore-set. Later calls
    /// only take read locks.
    ///
    /// # Errors
    ///
    /// Fails if differentiation fails.
    pub fn deviation_expr(
        &self,
        expr: ExprHandle,
        ignore: &BTreeSet<SymbolId>,
    ) -> Result<ExprHandle> {
        let key = (expr, ignore.clone());
        if let Some(&formula) = self.inner.formulas.read().get(&key) {
            return Ok(formula);
        }
        let formula = deviation_expr(&mut self.write(), expr, ignore)?;
        self.inner.formulas.write().insert(key, formula);
        Ok(formula)
    }

    /// Number of cached deviation formulas.
    #[must_use]
    pub fn cached_formulas(&self) -> usize {
        self.inner.formulas.read().len()
    }

    /// Registers a user function for [`Quantity::apply`].
    pub fn register_function(&self, function: Arc<dyn UnaryFunction>) -> FunctionId {
        self.write().register_function(function)
    }

    /// Builds a quantity from any [`Source`].
    ///
    /// # Errors
    ///
    /// Rejects non-finite constants and samples, invalid systematic
    /// deviations, empty or taken names, and formulas from another arena.
    pub fn build(&self, source: Source) -> Result<Quantity> {
        match source {
            Source::Constant(value) if !value.is_finite() => {
                Err(QuantityError::InvalidConstant(value))
            }
            Source::Constant(value) => Ok(self.constant(value)),
            Source::Samples {
                values,
                systematic,
                name,
            } => self.samples(&values, systematic, name.as_deref()),
            Source::Formula { expr, table, ignore } => {
                if !self.read().contains(expr) {
                    return Err(QuantityError::ForeignExpression(expr));
                }
                Ok(Quantity::from_parts(self.clone(), expr, table, ignore))
            }
        }
    }

    /// Wraps a number as a zero-deviation constant.
    ///
    /// The constant is left out of its own deviation and is substituted as a
    /// number in verbose reports. The value is not validated; a non-finite
    /// constant fails at evaluation.
    #[must_use]
    pub fn constant(&self, value: f64) -> Quantity {
        let (id, expr) = {
            let mut arena = self.write();
            let id = self.fresh_symbol(&mut arena, "const");
            (id, arena.symbol_expr(id))
        };
        debug!("constant {id:?} = {value}");

        let table = [(id, Measurement::exact(value))].into_iter().collect();
        Quantity::from_parts(self.clone(), expr, table, BTreeSet::from([id]))
    }

    /// Measures an anonymous variable `c<N>`.
    ///
    /// # Errors
    ///
    /// See [`Measurement::from_samples`].
    pub fn measured(&self, values: &[f64], systematic: f64) -> Result<Quantity> {
        self.samples(values, systematic, None)
    }

    /// Measures a variable under a chosen name.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, a name already bound in this workspace, or
    /// invalid samples.
    pub fn measured_named(
        &self,
        name: &str,
        values: &[f64],
        systematic: f64,
    ) -> Result<Quantity> {
        self.samples(values, systematic, Some(name))
    }

    /// A pure uncertainty: value 0 with deviation `size`.
    ///
    /// Adding it to other quantities widens their deviation. Every use shares
    /// one variable, so the contributions are fully correlated.
    ///
    /// # Errors
    ///
    /// Fails if `size` is negative or not finite.
    pub fn error(&self, size: f64) -> Result<Quantity> {
        self.samples(&[0.0], size, None)
    }

    /// Builds a quantity from an expression and its measurements.
    ///
    /// # Errors
    ///
    /// Fails if `expr` was not created in this workspace.
    pub fn formula(
        &self,
        expr: ExprHandle,
        table: MeasurementTable,
        ignore: BTreeSet<SymbolId>,
    ) -> Result<Quantity> {
        self.build(Source::Formula { expr, table, ignore })
    }

    fn samples(&self, values: &[f64], systematic: f64, name: Option<&str>) -> Result<Quantity> {
        let measurement = Measurement::from_samples(values, systematic)?;

        let (id, expr) = {
            let mut arena = self.write();
            let id = match name {
                Some("") => return Err(QuantityError::EmptyName),
                Some(name) if arena.symbol_id(name).is_some() => {
                    return Err(QuantityError::NameInUse(name.to_owned()));
                }
                Some(name) => arena.intern_symbol(name),
                None => self.fresh_symbol(&mut arena, "c"),
            };
            (id, arena.symbol_expr(id))
        };
        debug!("measurement {id:?} = {measurement:?} from {} samples", values.len());

        let table = [(id, measurement)].into_iter().collect();
        Ok(Quantity::from_parts(self.clone(), expr, table, BTreeSet::new()))
    }

    /// Interns `<prefix><N>` for the next free counter value.
    fn fresh_symbol(&self, arena: &mut ExprArena, prefix: &str) -> SymbolId {
        loop {
            let n = self.inner.counter.fetch_add(1, Ordering::Relaxed);
            let name = format!("{prefix}{n}");
            if arena.symbol_id(&name).is_none() {
                return arena.intern_symbol(&name);
            }
        }
    }
}
