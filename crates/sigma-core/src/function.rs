//! Unary functions that can appear in expressions.
//!
//! A function knows how to evaluate itself, how to build its own derivative
//! in the arena, and how to typeset itself. The built-in elementary
//! functions live here; callers can register further functions on an arena
//! with [`ExprArena::register_function`](crate::ExprArena::register_function).
//!
//! # Derivatives
//!
//! | f(u)     | f'(u)              |
//! |----------|--------------------|
//! | sin u    | cos u              |
//! | cos u    | -sin u             |
//! | tan u    | 1 + tan(u)^2       |
//! | exp u    | exp u              |
//! | ln u     | u^-1               |
//! | log10 u  | (u ln 10)^-1       |
//! | sqrt u   | 1/2 sqrt(u)^-1     |
//! | abs u    | u / abs(u)         |

use std::fmt;

use crate::arena::ExprArena;
use crate::expr::functions;
use crate::handle::ExprHandle;

/// A unary function with a symbolic derivative rule.
///
/// The chain rule is applied by the differentiator; `derivative` only has to
/// return `f'(arg)`.
pub trait UnaryFunction: fmt::Debug + Send + Sync {
    /// Name used in plain-text rendering.
    fn name(&self) -> &str;

    /// Evaluates the function numerically.
    fn eval(&self, x: f64) -> f64;

    /// Builds `f'(arg)` in the arena.
    fn derivative(&self, arena: &mut ExprArena, arg: ExprHandle) -> ExprHandle;

    /// Typesets `f(arg)` given the already typeset argument.
    fn latex(&self, arg: &str) -> String {
        format!("\\operatorname{{{}}}{{\\left({arg} \\right)}}", self.name())
    }
}

/// The elementary functions every arena starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Base-10 logarithm.
    Log10,
    /// Square root.
    Sqrt,
    /// Absolute value.
    Abs,
}

impl Builtin {
    /// All built-ins in registration order.
    ///
    /// The position of each entry matches its id in [`functions`].
    pub const ALL: [Builtin; 8] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Exp,
        Builtin::Ln,
        Builtin::Log10,
        Builtin::Sqrt,
        Builtin::Abs,
    ];
}

impl UnaryFunction for Builtin {
    fn name(&self) -> &str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Log10 => "log10",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
        }
    }

    fn eval(&self, x: f64) -> f64 {
        match self {
            Builtin::Sin => x.sin(),
            Builtin::Cos => x.cos(),
            Builtin::Tan => x.tan(),
            Builtin::Exp => x.exp(),
            Builtin::Ln => x.ln(),
            Builtin::Log10 => x.log10(),
            Builtin::Sqrt => x.sqrt(),
            Builtin::Abs => x.abs(),
        }
    }

    fn derivative(&self, arena: &mut ExprArena, arg: ExprHandle) -> ExprHandle {
        match self {
            Builtin::Sin => arena.apply(functions::COS, arg),
            Builtin::Cos => {
                let sin = arena.apply(functions::SIN, arg);
                arena.neg(sin)
            }
            Builtin::Tan => {
                let tan = arena.apply(functions::TAN, arg);
                let tan_sq = arena.square(tan);
                let one = arena.integer(1);
                arena.add([one, tan_sq])
            }
            Builtin::Exp => arena.apply(functions::EXP, arg),
            Builtin::Ln => arena.reciprocal(arg),
            Builtin::Log10 => {
                let ten = arena.integer(10);
                let ln_ten = arena.apply(functions::LN, ten);
                let scaled = arena.mul([arg, ln_ten]);
                arena.reciprocal(scaled)
            }
            Builtin::Sqrt => {
                let half = arena.rational(1, 2);
                let root = arena.apply(functions::SQRT, arg);
                let inv = arena.reciprocal(root);
                arena.mul([half, inv])
            }
            Builtin::Abs => {
                let abs = arena.apply(functions::ABS, arg);
                arena.div(arg, abs)
            }
        }
    }

    fn latex(&self, arg: &str) -> String {
        match self {
            Builtin::Sin => format!("\\sin{{\\left({arg} \\right)}}"),
            Builtin::Cos => format!("\\cos{{\\left({arg} \\right)}}"),
            Builtin::Tan => format!("\\tan{{\\left({arg} \\right)}}"),
            Builtin::Exp => format!("e^{{{arg}}}"),
            Builtin::Ln => format!("\\log{{\\left({arg} \\right)}}"),
            Builtin::Log10 => format!("\\log_{{10}}{{\\left({arg} \\right)}}"),
            Builtin::Sqrt => format!("\\sqrt{{{arg}}}"),
            Builtin::Abs => format!("\\left|{{{arg}}}\\right|"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_match_registration_order() {
        let arena = ExprArena::new();
        for (index, builtin) in Builtin::ALL.iter().enumerate() {
            let id = crate::FunctionId::new(u32::try_from(index).unwrap());
            let registered = arena.function_def(id).unwrap();
            assert_eq!(registered.name(), builtin.name());
        }
        assert_eq!(
            arena.function_def(functions::SQRT).unwrap().name(),
            "sqrt"
        );
    }

    #[test]
    fn test_builtin_eval() {
        assert_eq!(Builtin::Sqrt.eval(9.0), 3.0);
        assert_eq!(Builtin::Abs.eval(-2.5), 2.5);
        assert!((Builtin::Log10.eval(1000.0) - 3.0).abs() < 1e-12);
        assert!(Builtin::Ln.eval(-1.0).is_nan());
    }

    #[test]
    fn test_builtin_latex() {
        assert_eq!(Builtin::Sqrt.latex("x"), "\\sqrt{x}");
        assert_eq!(Builtin::Sin.latex("x"), "\\sin{\\left(x \\right)}");
    }
}
