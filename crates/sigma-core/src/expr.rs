//! Expression node types.
//!
//! This module defines the nodes stored in the arena. Nodes never own their
//! children; they refer to them through [`ExprHandle`]s.

use smallvec::SmallVec;

use crate::handle::{ExprHandle, FunctionId, SymbolId};

/// Bit-exact storage for a floating point literal.
///
/// `f64` is neither `Eq` nor `Hash`, so literals are interned by their bit
/// pattern. Negative zero is folded into positive zero so that both intern to
/// the same node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RealBits(u64);

impl RealBits {
    /// Stores a float.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0f64.to_bits())
        } else {
            Self(value.to_bits())
        }
    }

    /// Returns the stored float.
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// An expression node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// A 64-bit integer literal.
    Integer(i64),

    /// An exact rational literal (numerator, denominator).
    ///
    /// Invariant: denominator > 1, gcd(num, den) == 1.
    Rational(i64, u64),

    /// A floating point literal, typically a substituted measurement.
    Real(RealBits),

    /// A variable.
    Symbol(SymbolId),

    // === Compound Expressions ===
    /// Sum of expressions: a + b + c + ...
    ///
    /// Invariant: at least 2 arguments.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product of expressions: a * b * c * ...
    ///
    /// Invariant: at least 2 arguments.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power expression: base^exp.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// Negation: -expr.
    Neg(ExprHandle),

    /// Division: numerator / denominator.
    Div {
        /// The numerator.
        num: ExprHandle,
        /// The denominator.
        den: ExprHandle,
    },

    /// Application of a registered unary function: f(arg).
    Function {
        /// The function identifier.
        id: FunctionId,
        /// The argument.
        arg: ExprHandle,
    },
}

impl ExprNode {
    /// Returns true if this node is an atom (no children).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_)
                | ExprNode::Rational(_, _)
                | ExprNode::Real(_)
                | ExprNode::Symbol(_)
        )
    }

    /// Returns true if this node is a numeric literal.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Real(_)
        )
    }

    /// Returns true if this is a literal zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            ExprNode::Integer(n) => *n == 0,
            ExprNode::Real(r) => r.value() == 0.0,
            _ => false,
        }
    }

    /// Returns true if this is a literal one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        match self {
            ExprNode::Integer(n) => *n == 1,
            ExprNode::Real(r) => r.value() == 1.0,
            _ => false,
        }
    }

    /// Returns the value of a numeric literal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExprNode::Integer(n) => Some(*n as f64),
            ExprNode::Rational(n, d) => Some(*n as f64 / *d as f64),
            ExprNode::Real(r) => Some(r.value()),
            _ => None,
        }
    }

    /// Returns true if this is a numeric literal below zero.
    #[must_use]
    pub fn is_negative_number(&self) -> bool {
        self.as_f64().is_some_and(|v| v < 0.0)
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Integer(_)
            | ExprNode::Rational(_, _)
            | ExprNode::Real(_)
            | ExprNode::Symbol(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Neg(arg) | ExprNode::Function { arg, .. } => smallvec::smallvec![*arg],
            ExprNode::Div { num, den } => smallvec::smallvec![*num, *den],
        }
    }
}

/// Identifiers of the built-in functions.
///
/// Every arena registers these first, in this order.
pub mod functions {
    use crate::handle::FunctionId;

    /// Sine function.
    pub const SIN: FunctionId = FunctionId::new(0);
    /// Cosine function.
    pub const COS: FunctionId = FunctionId::new(1);
    /// Tangent function.
    pub const TAN: FunctionId = FunctionId::new(2);
    /// Natural exponential.
    pub const EXP: FunctionId = FunctionId::new(3);
    /// Natural logarithm.
    pub const LN: FunctionId = FunctionId::new(4);
    /// Logarithm base 10.
    pub const LOG10: FunctionId = FunctionId::new(5);
    /// Square root.
    pub const SQRT: FunctionId = FunctionId::new(6);
    /// Absolute value.
    pub const ABS: FunctionId = FunctionId::new(7);
}
