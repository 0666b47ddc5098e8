//! Algebraic simplification to a canonical form.
//!
//! The simplifier works bottom-up and is purely rule based:
//!
//! - `Neg` and `Div` are rewritten as products with `-1` and `^-1`
//! - nested sums and products are flattened
//! - numeric literals are folded, exactly for integers and rationals
//! - like terms (`2x + 3x`) and like factors (`x^a x^b`) are collected
//! - integer powers are distributed over products
//! - `x + 0`, `1 x`, `0 x`, `x^0`, `x^1` and `1^x` are reduced
//!
//! Terms and factors are ordered by handle, so two expressions that differ
//! only by grouping or argument order simplify to the same handle.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::arena::ExprArena;
use crate::expr::{functions, ExprNode};
use crate::handle::{ExprHandle, FunctionId};

/// Simplifies an expression.
pub fn simplify(arena: &mut ExprArena, expr: ExprHandle) -> ExprHandle {
    Simplifier::new(arena).run(expr)
}

/// A numeric literal during folding.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Number {
    /// `num / den` in lowest terms with `den > 0`.
    Exact(i64, u64),
    Real(f64),
}

impl Number {
    const ZERO: Number = Number::Exact(0, 1);
    const ONE: Number = Number::Exact(1, 1);

    fn of(node: &ExprNode) -> Option<Self> {
        match *node {
            ExprNode::Integer(n) => Some(Number::Exact(n, 1)),
            ExprNode::Rational(n, d) => Some(Number::Exact(n, d)),
            ExprNode::Real(r) => Some(Number::Real(r.value())),
            _ => None,
        }
    }

    /// Normalizes `num / den`, falling back to a float when out of range.
    #[allow(clippy::cast_precision_loss)]
    fn exact(num: i128, den: i128) -> Self {
        let g = gcd(num.unsigned_abs(), den.unsigned_abs());
        let sign = if den < 0 { -1 } else { 1 };
        #[allow(clippy::cast_possible_wrap)]
        let (num, den) = (sign * num / g as i128, sign * den / g as i128);
        match (i64::try_from(num), u64::try_from(den)) {
            (Ok(n), Ok(d)) => Number::Exact(n, d),
            _ => Number::Real(num as f64 / den as f64),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        match self {
            Number::Exact(n, d) => n as f64 / d as f64,
            Number::Real(r) => r,
        }
    }

    fn is_zero(self) -> bool {
        self.to_f64() == 0.0
    }

    #[allow(clippy::float_cmp)]
    fn is_one(self) -> bool {
        self.to_f64() == 1.0
    }

    fn is_positive(self) -> bool {
        self.to_f64() > 0.0
    }

    fn as_integer(self) -> Option<i64> {
        match self {
            Number::Exact(n, 1) => Some(n),
            _ => None,
        }
    }

    fn add(self, other: Self) -> Self {
        if let (Number::Exact(a, b), Number::Exact(c, d)) = (self, other) {
            let (a, b, c, d) = (i128::from(a), i128::from(b), i128::from(c), i128::from(d));
            let num = a
                .checked_mul(d)
                .zip(c.checked_mul(b))
                .and_then(|(x, y)| x.checked_add(y));
            if let (Some(num), Some(den)) = (num, b.checked_mul(d)) {
                return Number::exact(num, den);
            }
        }
        Number::Real(self.to_f64() + other.to_f64())
    }

    fn mul(self, other: Self) -> Self {
        if let (Number::Exact(a, b), Number::Exact(c, d)) = (self, other) {
            let (a, b, c, d) = (i128::from(a), i128::from(b), i128::from(c), i128::from(d));
            if let (Some(num), Some(den)) = (a.checked_mul(c), b.checked_mul(d)) {
                return Number::exact(num, den);
            }
        }
        Number::Real(self.to_f64() * other.to_f64())
    }

    /// Folds `self^exp`, or `None` when the result should stay symbolic.
    fn pow(self, exp: Self) -> Option<Self> {
        match (self, exp) {
            (Number::Exact(n, d), Number::Exact(e, 1)) if e.unsigned_abs() <= 64 => {
                if n == 0 && e < 0 {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation)]
                let power = e.unsigned_abs() as u32;
                let num = i128::from(n).checked_pow(power);
                let den = i128::from(d).checked_pow(power);
                match (num, den) {
                    (Some(num), Some(den)) if e >= 0 => Some(Number::exact(num, den)),
                    (Some(num), Some(den)) => Some(Number::exact(den, num)),
                    _ => finite(self.to_f64().powf(exp.to_f64())),
                }
            }
            // Irrational results such as 2^(1/2) stay exact symbolically.
            (Number::Exact(..), Number::Exact(..)) => None,
            _ => finite(self.to_f64().powf(exp.to_f64())),
        }
    }

    fn into_expr(self, arena: &mut ExprArena) -> ExprHandle {
        match self {
            Number::Exact(n, 1) => arena.integer(n),
            Number::Exact(n, d) => arena.intern(ExprNode::Rational(n, d)),
            Number::Real(r) => arena.real(r),
        }
    }
}

fn finite(value: f64) -> Option<Number> {
    value.is_finite().then_some(Number::Real(value))
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

struct Simplifier<'a> {
    arena: &'a mut ExprArena,
    cache: HashMap<ExprHandle, ExprHandle>,
}

impl<'a> Simplifier<'a> {
    fn new(arena: &'a mut ExprArena) -> Self {
        Self {
            arena,
            cache: HashMap::new(),
        }
    }

    fn run(&mut self, expr: ExprHandle) -> ExprHandle {
        if let Some(&done) = self.cache.get(&expr) {
            return done;
        }

        let node = self.arena.get(expr).clone();
        let result = match node {
            ExprNode::Integer(_)
            | ExprNode::Rational(_, _)
            | ExprNode::Real(_)
            | ExprNode::Symbol(_) => expr,
            ExprNode::Add(args) => {
                let terms = args.iter().map(|&a| self.run(a)).collect();
                self.sum(terms)
            }
            ExprNode::Mul(args) => {
                let factors = args.iter().map(|&a| self.run(a)).collect();
                self.product(factors)
            }
            ExprNode::Neg(arg) => {
                let arg = self.run(arg);
                let minus_one = self.arena.integer(-1);
                self.product(vec![minus_one, arg])
            }
            ExprNode::Div { num, den } => {
                let num = self.run(num);
                let den = self.run(den);
                let minus_one = self.arena.integer(-1);
                let inverse = self.power(den, minus_one);
                self.product(vec![num, inverse])
            }
            ExprNode::Pow { base, exp } => {
                let base = self.run(base);
                let exp = self.run(exp);
                self.power(base, exp)
            }
            ExprNode::Function { id, arg } => {
                let arg = self.run(arg);
                self.function(id, arg)
            }
        };

        self.cache.insert(expr, result);
        result
    }

    fn number(&self, expr: ExprHandle) -> Option<Number> {
        Number::of(self.arena.get(expr))
    }

    /// Simplified sum of already simplified terms.
    fn sum(&mut self, terms: Vec<ExprHandle>) -> ExprHandle {
        let mut constant = Number::ZERO;
        let mut collected: Vec<(ExprHandle, Number)> = Vec::new();

        for term in self.flatten(terms, |node| matches!(node, ExprNode::Add(_))) {
            if let Some(n) = self.number(term) {
                constant = constant.add(n);
                continue;
            }
            let (coeff, rest) = self.split_coefficient(term);
            match collected.iter_mut().find(|(r, _)| *r == rest) {
                Some(entry) => entry.1 = entry.1.add(coeff),
                None => collected.push((rest, coeff)),
            }
        }

        collected.sort_by_key(|&(rest, _)| rest);

        let mut out: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        if !constant.is_zero() {
            out.push(constant.into_expr(self.arena));
        }
        for (rest, coeff) in collected {
            if !coeff.is_zero() {
                out.push(self.scale(coeff, rest));
            }
        }

        // A collected `1 * (a + b)` surfaces a nested sum; fold it back in.
        if out.len() > 1
            && out
                .iter()
                .any(|&term| matches!(self.arena.get(term), ExprNode::Add(_)))
        {
            return self.sum(out.to_vec());
        }

        match out.len() {
            0 => self.arena.integer(0),
            1 => out[0],
            _ => self.arena.intern(ExprNode::Add(out)),
        }
    }

    /// Simplified product of already simplified factors.
    fn product(&mut self, factors: Vec<ExprHandle>) -> ExprHandle {
        let mut coeff = Number::ONE;
        let mut powers: Vec<(ExprHandle, ExprHandle)> = Vec::new();

        for factor in self.flatten(factors, |node| matches!(node, ExprNode::Mul(_))) {
            if let Some(n) = self.number(factor) {
                coeff = coeff.mul(n);
                continue;
            }
            let split = match self.arena.get(factor) {
                ExprNode::Pow { base, exp } => Some((*base, *exp)),
                _ => None,
            };
            let (base, exp) = match split {
                Some(pair) => pair,
                None => (factor, self.arena.integer(1)),
            };
            match powers.iter().position(|&(b, _)| b == base) {
                Some(i) => {
                    let combined = self.sum(vec![powers[i].1, exp]);
                    powers[i].1 = combined;
                }
                None => powers.push((base, exp)),
            }
        }

        if coeff.is_zero() {
            return self.arena.integer(0);
        }

        powers.sort_by_key(|&(base, _)| base);

        let mut out: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        for (base, exp) in powers {
            let factor = self.power(base, exp);
            if let Some(n) = self.number(factor) {
                coeff = coeff.mul(n);
                continue;
            }
            match self.arena.get(factor).clone() {
                ExprNode::Mul(args) => {
                    for arg in args {
                        match self.number(arg) {
                            Some(n) => coeff = coeff.mul(n),
                            None => out.push(arg),
                        }
                    }
                }
                _ => out.push(factor),
            }
        }

        if coeff.is_zero() {
            return self.arena.integer(0);
        }
        if out.is_empty() {
            return coeff.into_expr(self.arena);
        }
        if coeff.is_one() && out.len() == 1 {
            return out[0];
        }
        if !coeff.is_one() {
            out.insert(0, coeff.into_expr(self.arena));
        }
        self.arena.intern(ExprNode::Mul(out))
    }

    /// Simplified `base^exp` of already simplified operands.
    fn power(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        let b = self.number(base);
        let e = self.number(exp);

        if e.is_some_and(Number::is_zero) {
            return self.arena.integer(1);
        }
        if e.is_some_and(Number::is_one) || b.is_some_and(Number::is_one) {
            return base;
        }
        if let (Some(b), Some(e)) = (b, e) {
            if let Some(value) = b.pow(e) {
                return value.into_expr(self.arena);
            }
            if b.is_zero() && e.is_positive() {
                return self.arena.integer(0);
            }
        }

        if e.and_then(Number::as_integer).is_some() {
            match self.arena.get(base).clone() {
                // (a^b)^n = a^(b n) for integer n
                ExprNode::Pow {
                    base: inner,
                    exp: inner_exp,
                } => {
                    let combined = self.product(vec![inner_exp, exp]);
                    return self.power(inner, combined);
                }
                // (a b)^n = a^n b^n for integer n
                ExprNode::Mul(args) => {
                    let factors = args.iter().map(|&a| self.power(a, exp)).collect();
                    return self.product(factors);
                }
                _ => {}
            }
        }

        self.arena.pow(base, exp)
    }

    /// Folds functions of special literal arguments.
    fn function(&mut self, id: FunctionId, arg: ExprHandle) -> ExprHandle {
        if let Some(n) = self.number(arg) {
            let folded = match id {
                functions::SQRT => n
                    .as_integer()
                    .and_then(exact_sqrt)
                    .map(|root| Number::Exact(root, 1)),
                functions::ABS => Some(if n.to_f64() < 0.0 {
                    n.mul(Number::Exact(-1, 1))
                } else {
                    n
                }),
                functions::SIN | functions::TAN if n.is_zero() => Some(Number::ZERO),
                functions::COS | functions::EXP if n.is_zero() => Some(Number::ONE),
                functions::LN | functions::LOG10 if n == Number::ONE => Some(Number::ZERO),
                _ => None,
            };
            if let Some(value) = folded {
                return value.into_expr(self.arena);
            }
        }
        self.arena.apply(id, arg)
    }

    /// Splices the arguments of nested nodes selected by `nested`.
    fn flatten(
        &self,
        items: Vec<ExprHandle>,
        nested: impl Fn(&ExprNode) -> bool,
    ) -> Vec<ExprHandle> {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            let node = self.arena.get(item);
            if nested(node) {
                flat.extend(node.children());
            } else {
                flat.push(item);
            }
        }
        flat
    }

    /// Splits `c * rest` into its numeric coefficient and the rest.
    fn split_coefficient(&mut self, term: ExprHandle) -> (Number, ExprHandle) {
        if let ExprNode::Mul(args) = self.arena.get(term).clone() {
            if let Some(coeff) = self.number(args[0]) {
                let rest: SmallVec<[ExprHandle; 4]> = args[1..].iter().copied().collect();
                let rest = if rest.len() == 1 {
                    rest[0]
                } else {
                    self.arena.intern(ExprNode::Mul(rest))
                };
                return (coeff, rest);
            }
        }
        (Number::ONE, term)
    }

    /// Rebuilds `coeff * rest` with the coefficient leading.
    fn scale(&mut self, coeff: Number, rest: ExprHandle) -> ExprHandle {
        if coeff.is_one() {
            return rest;
        }
        let coeff = coeff.into_expr(self.arena);
        let mut args: SmallVec<[ExprHandle; 4]> = smallvec::smallvec![coeff];
        match self.arena.get(rest) {
            ExprNode::Mul(factors) => args.extend(factors.iter().copied()),
            _ => args.push(rest),
        }
        self.arena.intern(ExprNode::Mul(args))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn exact_sqrt(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    let root = (n as f64).sqrt().round() as i64;
    (root.checked_mul(root) == Some(n)).then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_like_terms() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");

        let doubled = arena.add([x, x]);
        let simplified = simplify(&mut arena, doubled);

        let two = arena.integer(2);
        let expected = arena.mul([two, x]);
        assert_eq!(simplified, expected);

        let cancelled = arena.sub(x, x);
        let simplified = simplify(&mut arena, cancelled);
        assert!(arena.get(simplified).is_zero());
    }

    #[test]
    fn test_grouping_and_order_are_canonical() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let z = arena.symbol("z");

        let xy = arena.add([x, y]);
        let left = arena.add([xy, z]);
        let yz = arena.add([y, z]);
        let right = arena.add([x, yz]);
        assert_eq!(simplify(&mut arena, left), simplify(&mut arena, right));

        let forward = arena.mul([x, y]);
        let backward = arena.mul([y, x]);
        assert_eq!(
            simplify(&mut arena, forward),
            simplify(&mut arena, backward)
        );
    }

    #[test]
    fn test_collect_like_factors() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");

        let squared = arena.mul([x, x]);
        let simplified = simplify(&mut arena, squared);
        let expected = arena.square(x);
        assert_eq!(simplified, expected);

        let ratio = arena.div(x, x);
        let simplified = simplify(&mut arena, ratio);
        assert!(arena.get(simplified).is_one());
    }

    #[test]
    fn test_distribute_integer_power() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");

        let product = arena.mul([x, y]);
        let squared = arena.square(product);
        let simplified = simplify(&mut arena, squared);

        let x_sq = arena.square(x);
        let y_sq = arena.square(y);
        let expected = arena.mul([x_sq, y_sq]);
        assert_eq!(simplified, expected);
    }

    #[test]
    fn test_identities() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let zero = arena.integer(0);
        let one = arena.integer(1);

        let zero_power = arena.pow(x, zero);
        let simplified = simplify(&mut arena, zero_power);
        assert!(arena.get(simplified).is_one());

        let unit_power = arena.pow(x, one);
        assert_eq!(simplify(&mut arena, unit_power), x);

        let annihilated = arena.mul([zero, x]);
        let simplified = simplify(&mut arena, annihilated);
        assert!(arena.get(simplified).is_zero());

        let double_neg = {
            let inner = arena.neg(x);
            arena.neg(inner)
        };
        assert_eq!(simplify(&mut arena, double_neg), x);
    }

    #[test]
    fn test_fold_numbers() {
        let mut arena = ExprArena::new();
        let half = arena.rational(1, 2);
        let third = arena.rational(1, 3);
        let sum = arena.add([half, third]);
        let simplified = simplify(&mut arena, sum);
        assert_eq!(arena.get(simplified), &ExprNode::Rational(5, 6));

        let two = arena.integer(2);
        let ten = arena.integer(10);
        let big = arena.pow(two, ten);
        let simplified = simplify(&mut arena, big);
        assert_eq!(arena.get(simplified), &ExprNode::Integer(1024));

        let sixteen = arena.integer(16);
        let root = arena.sqrt(sixteen);
        let simplified = simplify(&mut arena, root);
        assert_eq!(arena.get(simplified), &ExprNode::Integer(4));

        let irrational = arena.pow(two, half);
        assert_eq!(simplify(&mut arena, irrational), irrational);
    }

    #[test]
    fn test_reals_fold_numerically() {
        let mut arena = ExprArena::new();
        let a = arena.real(1.5);
        let b = arena.real(2.0);
        let product = arena.mul([a, b]);
        let simplified = simplify(&mut arena, product);
        assert_eq!(arena.get(simplified).as_f64(), Some(3.0));
    }

    #[test]
    fn test_simplify_derivative() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let product = arena.mul([x, y]);

        let x_id = arena.intern_symbol("x");
        let d = crate::diff::differentiate(&mut arena, product, x_id).unwrap();
        assert_eq!(simplify(&mut arena, d), y);
    }
}
