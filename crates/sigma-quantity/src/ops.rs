//! Arithmetic on quantities.
//!
//! Every binary operation accepts a [`Quantity`] or a bare `f64` on either
//! side. Numbers are coerced to zero-deviation constants of the quantity's
//! workspace before the expression node is built.

use std::borrow::Cow;
use std::ops::{Add, Div, Mul, Neg, Sub};

use sigma_core::{ExprArena, ExprHandle};

use crate::quantity::Quantity;
use crate::workspace::Workspace;

/// Either side of a binary operation.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    /// A quantity with uncertainty.
    Quantity(&'a Quantity),
    /// A plain number, treated as exact.
    Scalar(f64),
}

impl<'a> From<&'a Quantity> for Operand<'a> {
    fn from(quantity: &'a Quantity) -> Self {
        Operand::Quantity(quantity)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<i32> for Operand<'_> {
    fn from(value: i32) -> Self {
        Operand::Scalar(f64::from(value))
    }
}

impl<'a> Operand<'a> {
    /// Coerces to a quantity of `workspace`, wrapping scalars as constants.
    #[must_use]
    pub fn into_quantity(self, workspace: &Workspace) -> Cow<'a, Quantity> {
        match self {
            Operand::Quantity(q) => Cow::Borrowed(q),
            Operand::Scalar(value) => Cow::Owned(workspace.constant(value)),
        }
    }
}

type Builder = fn(&mut ExprArena, ExprHandle, ExprHandle) -> ExprHandle;

fn build_add(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> ExprHandle {
    arena.add([a, b])
}

fn build_sub(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> ExprHandle {
    arena.sub(a, b)
}

fn build_mul(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> ExprHandle {
    arena.mul([a, b])
}

fn build_div(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> ExprHandle {
    arena.div(a, b)
}

fn build_pow(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> ExprHandle {
    arena.pow(a, b)
}

impl Quantity {
    fn combine(&self, rhs: Operand<'_>, build: Builder) -> Quantity {
        let rhs = rhs.into_quantity(self.workspace());
        self.binary(&rhs, build)
    }

    fn combine_scalar_left(lhs: f64, rhs: &Quantity, build: Builder) -> Quantity {
        rhs.workspace().constant(lhs).binary(rhs, build)
    }

    /// Raises `self` to a quantity or number.
    ///
    /// # Panics
    ///
    /// Panics if the exponent belongs to another workspace.
    #[must_use]
    pub fn pow<'a>(&self, exponent: impl Into<Operand<'a>>) -> Quantity {
        self.combine(exponent.into(), build_pow)
    }

    /// Raises a number to the power of `exponent`.
    #[must_use]
    pub fn scalar_pow(base: f64, exponent: &Quantity) -> Quantity {
        Self::combine_scalar_left(base, exponent, build_pow)
    }
}

macro_rules! impl_binary_op {
    ($Trait:ident, $method:ident, $build:ident) => {
        impl $Trait<&Quantity> for &Quantity {
            type Output = Quantity;

            fn $method(self, rhs: &Quantity) -> Quantity {
                self.combine(Operand::Quantity(rhs), $build)
            }
        }

        impl $Trait<Quantity> for Quantity {
            type Output = Quantity;

            fn $method(self, rhs: Quantity) -> Quantity {
                self.combine(Operand::Quantity(&rhs), $build)
            }
        }

        impl $Trait<&Quantity> for Quantity {
            type Output = Quantity;

            fn $method(self, rhs: &Quantity) -> Quantity {
                self.combine(Operand::Quantity(rhs), $build)
            }
        }

        impl $Trait<Quantity> for &Quantity {
            type Output = Quantity;

            fn $method(self, rhs: Quantity) -> Quantity {
                self.combine(Operand::Quantity(&rhs), $build)
            }
        }

        impl $Trait<f64> for &Quantity {
            type Output = Quantity;

            fn $method(self, rhs: f64) -> Quantity {
                self.combine(Operand::Scalar(rhs), $build)
            }
        }

        impl $Trait<f64> for Quantity {
            type Output = Quantity;

            fn $method(self, rhs: f64) -> Quantity {
                self.combine(Operand::Scalar(rhs), $build)
            }
        }

        impl $Trait<&Quantity> for f64 {
            type Output = Quantity;

            fn $method(self, rhs: &Quantity) -> Quantity {
                Quantity::combine_scalar_left(self, rhs, $build)
            }
        }

        impl $Trait<Quantity> for f64 {
            type Output = Quantity;

            fn $method(self, rhs: Quantity) -> Quantity {
                Quantity::combine_scalar_left(self, &rhs, $build)
            }
        }
    };
}

impl_binary_op!(Add, add, build_add);
impl_binary_op!(Sub, sub, build_sub);
impl_binary_op!(Mul, mul, build_mul);
impl_binary_op!(Div, div, build_div);

impl Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        self.use_func(|arena, x| arena.neg(x))
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_on_either_side() {
        let ws = Workspace::new();
        let x = ws.measured(&[2.0], 0.1).unwrap();

        assert_eq!((&x + 1.0).get_value_error().unwrap(), (3.0, 0.1));
        assert_eq!((1.0 - &x).get_value_error().unwrap(), (-1.0, 0.1));
        assert_eq!((3.0 * &x).get_value_error().unwrap(), (6.0, 0.3));
        assert_eq!((&x / 2.0).get_value_error().unwrap(), (1.0, 0.05));
    }

    #[test]
    fn test_coerced_constants_are_ignored() {
        let ws = Workspace::new();
        let x = ws.measured(&[2.0], 0.1).unwrap();
        let y = &x * 4.0;
        assert_eq!(y.ignore_set().len(), 1);
        assert_eq!(y.table().len(), 2);
    }

    #[test]
    fn test_owned_and_borrowed_agree() {
        let ws = Workspace::new();
        let a = ws.measured(&[1.5], 0.2).unwrap();
        let b = ws.measured(&[2.5], 0.1).unwrap();

        let borrowed = (&a * &b).get_value_error().unwrap();
        let owned = (a.clone() * b.clone()).get_value_error().unwrap();
        let mixed = (a.clone() * &b).get_value_error().unwrap();
        assert_eq!(borrowed, owned);
        assert_eq!(borrowed, mixed);
    }

    #[test]
    fn test_pow() {
        let ws = Workspace::new();
        let x = ws.measured(&[3.0], 0.1).unwrap();

        // d(x^2) = 2 x sigma = 0.6
        assert_eq!(x.pow(2).get_value_error().unwrap(), (9.0, 0.6));
        assert!((x.pow(0.5).value().unwrap() - 3f64.sqrt()).abs() < 1e-15);

        let p = ws.measured(&[2.0], 0.0).unwrap();
        assert_eq!(x.pow(&p).get_value_error().unwrap(), (9.0, 0.6));
    }

    #[test]
    fn test_scalar_pow() {
        let ws = Workspace::new();
        let x = ws.measured(&[3.0], 0.1).unwrap();
        let q = Quantity::scalar_pow(2.0, &x);
        assert_eq!(q.value().unwrap(), 8.0);
        // d(2^x) = 2^x ln 2 sigma
        let expected = 8.0 * 2f64.ln() * 0.1;
        assert!((q.deviation().unwrap().value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_operands_are_untouched() {
        let ws = Workspace::new();
        let x = ws.measured(&[2.0], 0.1).unwrap();
        let before = x.expr();
        let _ = &x + &x;
        let _ = -&x;
        assert_eq!(x.expr(), before);
        assert_eq!(x.table().len(), 1);
    }
}
