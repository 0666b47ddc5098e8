//! Exact symbolic differentiation.
//!
//! Derivatives are built directly in the arena. Terms that are known to be
//! zero are pruned while building, so the result of differentiating with
//! respect to an absent variable is the literal `0`. The output is not
//! simplified otherwise; run [`simplify`](crate::simplify::simplify) on it
//! for a reduced form.

use hashbrown::HashMap;

use crate::arena::ExprArena;
use crate::error::ExprError;
use crate::expr::ExprNode;
use crate::handle::{ExprHandle, SymbolId};

/// Computes `d expr / d var`.
///
/// Fails only when the expression refers to an unregistered function or
/// does not belong to the arena.
pub fn differentiate(
    arena: &mut ExprArena,
    expr: ExprHandle,
    var: SymbolId,
) -> Result<ExprHandle, ExprError> {
    Differentiator::new(arena, var).derive(expr)
}

/// Differentiation state: the variable and a cache of finished subterms.
struct Differentiator<'a> {
    arena: &'a mut ExprArena,
    var: SymbolId,
    cache: HashMap<ExprHandle, ExprHandle>,
}

impl<'a> Differentiator<'a> {
    fn new(arena: &'a mut ExprArena, var: SymbolId) -> Self {
        Self {
            arena,
            var,
            cache: HashMap::new(),
        }
    }

    fn derive(&mut self, expr: ExprHandle) -> Result<ExprHandle, ExprError> {
        if let Some(&done) = self.cache.get(&expr) {
            return Ok(done);
        }

        let node = self.arena.try_get(expr)?.clone();
        let result = match node {
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Real(_) => self.zero(),

            ExprNode::Symbol(id) => {
                if id == self.var {
                    self.arena.integer(1)
                } else {
                    self.zero()
                }
            }

            ExprNode::Add(args) => {
                let mut terms = Vec::with_capacity(args.len());
                for &arg in &args {
                    terms.push(self.derive(arg)?);
                }
                self.sum(terms)
            }

            // Product rule: sum over i of (d a_i) * prod_{j != i} a_j.
            ExprNode::Mul(args) => {
                let mut terms = Vec::with_capacity(args.len());
                for (i, &arg) in args.iter().enumerate() {
                    let d = self.derive(arg)?;
                    if self.is_zero(d) {
                        continue;
                    }
                    let mut factors = Vec::with_capacity(args.len());
                    factors.push(d);
                    factors.extend(
                        args.iter()
                            .enumerate()
                            .filter(|&(j, _)| j != i)
                            .map(|(_, &other)| other),
                    );
                    terms.push(self.product(factors));
                }
                self.sum(terms)
            }

            ExprNode::Neg(arg) => {
                let d = self.derive(arg)?;
                self.negate(d)
            }

            // Quotient rule: (n' d - n d') / d^2.
            ExprNode::Div { num, den } => {
                let dn = self.derive(num)?;
                let dd = self.derive(den)?;
                match (self.is_zero(dn), self.is_zero(dd)) {
                    (true, true) => self.zero(),
                    (false, true) => self.arena.div(dn, den),
                    (dn_zero, false) => {
                        let den_sq = self.arena.square(den);
                        let cross = self.product(vec![num, dd]);
                        let numerator = if dn_zero {
                            self.negate(cross)
                        } else {
                            let lead = self.product(vec![dn, den]);
                            self.arena.sub(lead, cross)
                        };
                        self.arena.div(numerator, den_sq)
                    }
                }
            }

            ExprNode::Pow { base, exp } => self.derive_pow(expr, base, exp)?,

            // Chain rule: f'(u) * u'.
            ExprNode::Function { id, arg } => {
                let d = self.derive(arg)?;
                if self.is_zero(d) {
                    self.zero()
                } else {
                    let function = self
                        .arena
                        .function_def(id)
                        .ok_or(ExprError::UnknownFunction(id))?;
                    let outer = function.derivative(self.arena, arg);
                    self.product(vec![outer, d])
                }
            }
        };

        self.cache.insert(expr, result);
        Ok(result)
    }

    /// Derivative of `base^exp`.
    ///
    /// A constant exponent uses the power rule and a constant base uses the
    /// exponential rule, so no logarithm of a possibly negative base is
    /// introduced unless both sides vary.
    fn derive_pow(
        &mut self,
        expr: ExprHandle,
        base: ExprHandle,
        exp: ExprHandle,
    ) -> Result<ExprHandle, ExprError> {
        let db = self.derive(base)?;
        let de = self.derive(exp)?;

        let result = match (self.is_zero(db), self.is_zero(de)) {
            (true, true) => self.zero(),
            // exp * base^(exp - 1) * base'
            (false, true) => {
                let lowered = self.decrement(exp);
                let power = self.arena.pow(base, lowered);
                self.product(vec![exp, power, db])
            }
            // base^exp * ln(base) * exp'
            (true, false) => {
                let ln = self.arena.apply(crate::expr::functions::LN, base);
                self.product(vec![expr, ln, de])
            }
            // base^exp * (exp' ln(base) + exp * base' / base)
            (false, false) => {
                let ln = self.arena.apply(crate::expr::functions::LN, base);
                let log_term = self.product(vec![de, ln]);
                let ratio = self.arena.div(db, base);
                let power_term = self.product(vec![exp, ratio]);
                let inner = self.sum(vec![log_term, power_term]);
                self.product(vec![expr, inner])
            }
        };
        Ok(result)
    }

    fn zero(&mut self) -> ExprHandle {
        self.arena.integer(0)
    }

    fn is_zero(&self, expr: ExprHandle) -> bool {
        self.arena.get(expr).is_zero()
    }

    fn is_one(&self, expr: ExprHandle) -> bool {
        self.arena.get(expr).is_one()
    }

    /// Sum that drops zero terms.
    fn sum(&mut self, terms: Vec<ExprHandle>) -> ExprHandle {
        let terms: Vec<_> = terms.into_iter().filter(|&t| !self.is_zero(t)).collect();
        self.arena.add(terms)
    }

    /// Product that collapses on a zero factor and drops unit factors.
    fn product(&mut self, factors: Vec<ExprHandle>) -> ExprHandle {
        if factors.iter().any(|&f| self.is_zero(f)) {
            return self.zero();
        }
        let factors: Vec<_> = factors.into_iter().filter(|&f| !self.is_one(f)).collect();
        self.arena.mul(factors)
    }

    fn negate(&mut self, expr: ExprHandle) -> ExprHandle {
        if self.is_zero(expr) {
            expr
        } else {
            self.arena.neg(expr)
        }
    }

    /// Builds `exp - 1`, folding integer and rational literals.
    fn decrement(&mut self, exp: ExprHandle) -> ExprHandle {
        let node = self.arena.get(exp).clone();
        match node {
            ExprNode::Integer(n) if n > i64::MIN => self.arena.integer(n - 1),
            ExprNode::Rational(n, d) => match i64::try_from(d) {
                Ok(d) if n.checked_sub(d).is_some() => self.arena.rational(n - d, d),
                _ => self.symbolic_decrement(exp),
            },
            ExprNode::Real(r) => self.arena.real(r.value() - 1.0),
            _ => self.symbolic_decrement(exp),
        }
    }

    fn symbolic_decrement(&mut self, exp: ExprHandle) -> ExprHandle {
        let minus_one = self.arena.integer(-1);
        self.arena.add([exp, minus_one])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::eval::evaluate;
    use crate::expr::functions;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    /// Evaluates `d expr / d x` at the given point.
    fn slope(arena: &mut ExprArena, expr: ExprHandle, point: &[(&str, f64)]) -> f64 {
        let x = arena.intern_symbol("x");
        let d = differentiate(arena, expr, x).unwrap();
        let values: BTreeMap<_, _> = point
            .iter()
            .map(|&(name, v)| (arena.intern_symbol(name), v))
            .collect();
        evaluate(arena, d, &values).unwrap()
    }

    #[test]
    fn test_constant_and_other_symbols_vanish() {
        let mut arena = ExprArena::new();
        let y = arena.symbol("y");
        let five = arena.integer(5);
        let expr = arena.mul([y, five]);

        let x = arena.intern_symbol("x");
        let d = differentiate(&mut arena, expr, x).unwrap();
        assert!(arena.get(d).is_zero());
    }

    #[test]
    fn test_product_rule() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");
        // x * x * y -> 2 x y
        let expr = arena.mul([x, x, y]);
        assert!(close(slope(&mut arena, expr, &[("x", 3.0), ("y", 2.0)]), 12.0));
    }

    #[test]
    fn test_quotient_rule() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let one = arena.integer(1);
        let den = arena.add([x, one]);
        // x / (x + 1) -> 1 / (x + 1)^2
        let expr = arena.div(x, den);
        assert!(close(slope(&mut arena, expr, &[("x", 1.0)]), 0.25));
    }

    #[test]
    fn test_power_rules() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let three = arena.integer(3);

        // x^3 -> 3 x^2
        let cube = arena.pow(x, three);
        assert!(close(slope(&mut arena, cube, &[("x", 2.0)]), 12.0));

        // 2^x -> 2^x ln 2
        let two = arena.integer(2);
        let exponential = arena.pow(two, x);
        assert!(close(
            slope(&mut arena, exponential, &[("x", 3.0)]),
            8.0 * 2f64.ln()
        ));

        // x^y -> y x^(y-1)
        let general = arena.pow(x, y);
        assert!(close(
            slope(&mut arena, general, &[("x", 2.0), ("y", 3.0)]),
            12.0
        ));

        // x^x -> x^x (ln x + 1)
        let self_power = arena.pow(x, x);
        assert!(close(
            slope(&mut arena, self_power, &[("x", 2.0)]),
            4.0 * (2f64.ln() + 1.0)
        ));
    }

    #[test]
    fn test_rational_power_decrements_exactly() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let half = arena.rational(1, 2);
        let root = arena.pow(x, half);

        let x_id = arena.intern_symbol("x");
        let d = differentiate(&mut arena, root, x_id).unwrap();
        let minus_half = arena.rational(-1, 2);
        let expected_power = arena.pow(x, minus_half);
        assert!(arena.get(d).children().contains(&expected_power));
        assert!(close(slope(&mut arena, root, &[("x", 4.0)]), 0.25));
    }

    #[test]
    fn test_chain_rule_through_builtins() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let two = arena.integer(2);
        let scaled = arena.mul([two, x]);

        let sin = arena.apply(functions::SIN, scaled);
        assert!(close(slope(&mut arena, sin, &[("x", 0.3)]), 2.0 * 0.6f64.cos()));

        let cos = arena.apply(functions::COS, x);
        assert!(close(slope(&mut arena, cos, &[("x", 0.3)]), -(0.3f64.sin())));

        let tan = arena.apply(functions::TAN, x);
        let sec_sq = 1.0 / 0.3f64.cos().powi(2);
        assert!(close(slope(&mut arena, tan, &[("x", 0.3)]), sec_sq));

        let exp = arena.apply(functions::EXP, scaled);
        assert!(close(slope(&mut arena, exp, &[("x", 0.5)]), 2.0 * 1f64.exp()));

        let ln = arena.apply(functions::LN, x);
        assert!(close(slope(&mut arena, ln, &[("x", 4.0)]), 0.25));

        let log10 = arena.apply(functions::LOG10, x);
        assert!(close(
            slope(&mut arena, log10, &[("x", 2.0)]),
            1.0 / (2.0 * 10f64.ln())
        ));

        let sqrt = arena.apply(functions::SQRT, x);
        assert!(close(slope(&mut arena, sqrt, &[("x", 9.0)]), 1.0 / 6.0));

        let abs = arena.apply(functions::ABS, x);
        assert!(close(slope(&mut arena, abs, &[("x", -2.0)]), -1.0));
    }

    #[test]
    fn test_negation_and_subtraction() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let diff = arena.sub(y, x);
        assert!(close(slope(&mut arena, diff, &[("x", 1.0), ("y", 1.0)]), -1.0));
    }
}
