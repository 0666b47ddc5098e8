//! Numeric evaluation, substitution and free-variable queries.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use crate::arena::ExprArena;
use crate::error::ExprError;
use crate::expr::ExprNode;
use crate::handle::{ExprHandle, SymbolId};

/// A source of numeric values for symbols.
pub trait Bindings {
    /// Returns the value bound to a symbol, if any.
    fn value_of(&self, symbol: SymbolId) -> Option<f64>;
}

impl Bindings for BTreeMap<SymbolId, f64> {
    fn value_of(&self, symbol: SymbolId) -> Option<f64> {
        self.get(&symbol).copied()
    }
}

impl Bindings for HashMap<SymbolId, f64> {
    fn value_of(&self, symbol: SymbolId) -> Option<f64> {
        self.get(&symbol).copied()
    }
}

/// Evaluates an expression to a float.
///
/// Every symbol must be bound. Division by zero and non-finite intermediate
/// results are reported as errors rather than returned as NaN or infinity.
pub fn evaluate<B: Bindings + ?Sized>(
    arena: &ExprArena,
    expr: ExprHandle,
    bindings: &B,
) -> Result<f64, ExprError> {
    let node = arena.try_get(expr)?;
    let value = match node {
        ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Real(_) => {
            node.as_f64().unwrap_or_default()
        }
        ExprNode::Symbol(id) => bindings.value_of(*id).ok_or_else(|| {
            ExprError::UnboundSymbol(arena.symbol_name(*id).unwrap_or("?").to_owned())
        })?,
        ExprNode::Add(args) => {
            let mut total = 0.0;
            for &arg in args {
                total += evaluate(arena, arg, bindings)?;
            }
            total
        }
        ExprNode::Mul(args) => {
            let mut product = 1.0;
            for &arg in args {
                product *= evaluate(arena, arg, bindings)?;
            }
            product
        }
        ExprNode::Neg(arg) => -evaluate(arena, *arg, bindings)?,
        ExprNode::Div { num, den } => {
            let den = evaluate(arena, *den, bindings)?;
            if den == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            evaluate(arena, *num, bindings)? / den
        }
        ExprNode::Pow { base, exp } => {
            let base = evaluate(arena, *base, bindings)?;
            let exp = evaluate(arena, *exp, bindings)?;
            if base == 0.0 && exp < 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            pow(base, exp)
        }
        ExprNode::Function { id, arg } => {
            let function = arena
                .function_def(*id)
                .ok_or(ExprError::UnknownFunction(*id))?;
            let x = evaluate(arena, *arg, bindings)?;
            let y = function.eval(x);
            if !y.is_finite() {
                return Err(ExprError::NonFinite(format!("{}({x})", function.name())));
            }
            y
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NonFinite(format!("expression {expr}")))
    }
}

/// Raises to a power, using repeated multiplication for integral exponents.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn pow(base: f64, exp: f64) -> f64 {
    if exp.fract() == 0.0 && exp.abs() <= f64::from(i32::MAX) {
        base.powi(exp as i32)
    } else {
        base.powf(exp)
    }
}

/// Replaces symbols by expressions.
///
/// The result is rebuilt structurally and is not simplified, so a
/// substituted formula still shows every operation of the original.
pub fn substitute(
    arena: &mut ExprArena,
    expr: ExprHandle,
    replacements: &BTreeMap<SymbolId, ExprHandle>,
) -> ExprHandle {
    let mut cache = HashMap::new();
    substitute_cached(arena, expr, replacements, &mut cache)
}

fn substitute_cached(
    arena: &mut ExprArena,
    expr: ExprHandle,
    replacements: &BTreeMap<SymbolId, ExprHandle>,
    cache: &mut HashMap<ExprHandle, ExprHandle>,
) -> ExprHandle {
    if let Some(&done) = cache.get(&expr) {
        return done;
    }

    let node = arena.get(expr).clone();
    let result = match node {
        ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Real(_) => expr,
        ExprNode::Symbol(id) => replacements.get(&id).copied().unwrap_or(expr),
        ExprNode::Add(args) => {
            let args: Vec<_> = args
                .iter()
                .map(|&a| substitute_cached(arena, a, replacements, cache))
                .collect();
            arena.add(args)
        }
        ExprNode::Mul(args) => {
            let args: Vec<_> = args
                .iter()
                .map(|&a| substitute_cached(arena, a, replacements, cache))
                .collect();
            arena.mul(args)
        }
        ExprNode::Pow { base, exp } => {
            let base = substitute_cached(arena, base, replacements, cache);
            let exp = substitute_cached(arena, exp, replacements, cache);
            arena.pow(base, exp)
        }
        ExprNode::Neg(arg) => {
            let arg = substitute_cached(arena, arg, replacements, cache);
            arena.neg(arg)
        }
        ExprNode::Div { num, den } => {
            let num = substitute_cached(arena, num, replacements, cache);
            let den = substitute_cached(arena, den, replacements, cache);
            arena.div(num, den)
        }
        ExprNode::Function { id, arg } => {
            let arg = substitute_cached(arena, arg, replacements, cache);
            arena.apply(id, arg)
        }
    };

    cache.insert(expr, result);
    result
}

/// Collects the symbols an expression depends on.
#[must_use]
pub fn free_symbols(arena: &ExprArena, expr: ExprHandle) -> BTreeSet<SymbolId> {
    let mut found = BTreeSet::new();
    let mut stack = vec![expr];
    let mut seen = hashbrown::HashSet::new();

    while let Some(handle) = stack.pop() {
        if !seen.insert(handle) {
            continue;
        }
        match arena.get(handle) {
            ExprNode::Symbol(id) => {
                found.insert(*id);
            }
            node => stack.extend(node.children()),
        }
    }

    found
}

/// Returns true if `expr` mentions `symbol`.
#[must_use]
pub fn depends_on(arena: &ExprArena, expr: ExprHandle, symbol: SymbolId) -> bool {
    free_symbols(arena, expr).contains(&symbol)
}
