//! Plain-text and LaTeX rendering of expressions.
//!
//! Both styles share one precedence-driven printer. Products whose factors
//! carry negative literal exponents are printed as fractions, and sums print
//! negative terms with a binary minus.

use std::fmt;

use crate::arena::ExprArena;
use crate::expr::{functions, ExprNode};
use crate::handle::ExprHandle;

/// Output style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    /// `x*y^2 + sqrt(z)`
    Plain,
    /// `x y^{2} + \sqrt{z}`
    Latex,
}

// Binding strength of the rendered text, loosest first.
const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_POW: u8 = 3;
const PREC_ATOM: u8 = 4;

/// Displays an expression borrowed from an arena.
#[derive(Clone, Copy)]
pub struct ExprDisplay<'a> {
    arena: &'a ExprArena,
    expr: ExprHandle,
    style: Style,
}

impl<'a> ExprDisplay<'a> {
    /// Creates a display adapter.
    #[must_use]
    pub fn new(arena: &'a ExprArena, expr: ExprHandle, style: Style) -> Self {
        Self { arena, expr, style }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printer = Printer {
            arena: self.arena,
            style: self.style,
        };
        f.write_str(&printer.render(self.expr).0)
    }
}

impl ExprArena {
    /// Returns a plain-text display adapter for an expression.
    #[must_use]
    pub fn display(&self, expr: ExprHandle) -> ExprDisplay<'_> {
        ExprDisplay::new(self, expr, Style::Plain)
    }

    /// Renders an expression as LaTeX.
    #[must_use]
    pub fn latex(&self, expr: ExprHandle) -> String {
        ExprDisplay::new(self, expr, Style::Latex).to_string()
    }
}

/// Typesets a variable name: `sigma_x` becomes `\sigma_{x}` and trailing
/// digits become a subscript (`const3` becomes `const_{3}`).
#[must_use]
pub fn latex_symbol(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("sigma_") {
        return format!("\\sigma_{{{rest}}}");
    }
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if !stem.is_empty() && stem.len() < name.len() {
        return format!("{stem}_{{{}}}", &name[stem.len()..]);
    }
    match name.split_once('_') {
        Some((stem, sub)) if !stem.is_empty() => format!("{stem}_{{{sub}}}"),
        _ => name.to_owned(),
    }
}

/// Formats a float with the shortest representation that round-trips.
#[must_use]
pub fn format_real(value: f64) -> String {
    format!("{value}")
}

struct Printer<'a> {
    arena: &'a ExprArena,
    style: Style,
}

impl Printer<'_> {
    /// Renders an expression and reports how tightly the text binds.
    fn render(&self, expr: ExprHandle) -> (String, u8) {
        match self.arena.get(expr) {
            ExprNode::Integer(n) => (n.to_string(), sign_prec(*n < 0)),
            ExprNode::Rational(n, d) => {
                let text = match self.style {
                    Style::Plain => format!("{n}/{d}"),
                    Style::Latex if *n < 0 => format!("- \\frac{{{}}}{{{d}}}", n.unsigned_abs()),
                    Style::Latex => format!("\\frac{{{n}}}{{{d}}}"),
                };
                (text, if *n < 0 { PREC_ADD } else { PREC_MUL })
            }
            ExprNode::Real(r) => {
                let value = r.value();
                (format_real(value), sign_prec(value < 0.0))
            }
            ExprNode::Symbol(id) => {
                let name = self.arena.symbol_name(*id).unwrap_or("?");
                let text = match self.style {
                    Style::Plain => name.to_owned(),
                    Style::Latex => latex_symbol(name),
                };
                (text, PREC_ATOM)
            }
            ExprNode::Add(args) => {
                let mut text = self.render(args[0]).0;
                for &term in &args[1..] {
                    match self.negated(term) {
                        Some(magnitude) => {
                            text.push_str(" - ");
                            text.push_str(&magnitude);
                        }
                        None => {
                            text.push_str(" + ");
                            text.push_str(&self.render(term).0);
                        }
                    }
                }
                (text, PREC_ADD)
            }
            ExprNode::Mul(args) => self.render_product(args, false),
            ExprNode::Pow { base, exp } => self.render_power(*base, *exp),
            ExprNode::Neg(arg) => (format!("-{}", self.wrap(*arg, PREC_MUL)), PREC_ADD),
            ExprNode::Div { num, den } => {
                let text = match self.style {
                    Style::Plain => {
                        format!("{}/{}", self.wrap(*num, PREC_MUL), self.wrap(*den, PREC_POW))
                    }
                    Style::Latex => format!(
                        "\\frac{{{}}}{{{}}}",
                        self.render(*num).0,
                        self.render(*den).0
                    ),
                };
                (text, PREC_MUL)
            }
            ExprNode::Function { id, arg } => {
                let inner = self.render(*arg).0;
                let text = match (self.style, self.arena.function_def(*id)) {
                    (Style::Plain, Some(def)) => format!("{}({inner})", def.name()),
                    (Style::Latex, Some(def)) => def.latex(&inner),
                    (_, None) => format!("{id}({inner})"),
                };
                (text, PREC_ATOM)
            }
        }
    }

    /// Renders `expr` in parentheses when it binds looser than `min`.
    fn wrap(&self, expr: ExprHandle, min: u8) -> String {
        let (text, prec) = self.render(expr);
        if prec < min {
            self.paren(&text)
        } else {
            text
        }
    }

    fn paren(&self, text: &str) -> String {
        match self.style {
            Style::Plain => format!("({text})"),
            Style::Latex => format!("\\left({text}\\right)"),
        }
    }

    /// Renders `-expr` when `expr` visibly carries a leading minus.
    fn negated(&self, expr: ExprHandle) -> Option<String> {
        match self.arena.get(expr) {
            ExprNode::Neg(arg) => Some(self.wrap(*arg, PREC_MUL)),
            node if node.is_negative_number() => Some(self.magnitude(node)),
            ExprNode::Mul(args) if self.arena.get(args[0]).is_negative_number() => {
                Some(self.render_product(args, true).0)
            }
            _ => None,
        }
    }

    /// Renders the absolute value of a numeric literal.
    fn magnitude(&self, node: &ExprNode) -> String {
        match node {
            ExprNode::Integer(n) => n.unsigned_abs().to_string(),
            ExprNode::Rational(n, d) => match self.style {
                Style::Plain => format!("{}/{d}", n.unsigned_abs()),
                Style::Latex => format!("\\frac{{{}}}{{{d}}}", n.unsigned_abs()),
            },
            _ => format_real(node.as_f64().unwrap_or_default().abs()),
        }
    }

    /// Renders a product, moving negative literal powers below a fraction bar.
    ///
    /// With `negate` set the leading numeric coefficient is rendered with its
    /// sign flipped.
    fn render_product(&self, args: &[ExprHandle], negate: bool) -> (String, u8) {
        let mut minus = false;
        let mut numerator: Vec<String> = Vec::new();
        let mut denominator: Vec<String> = Vec::new();

        for (i, &factor) in args.iter().enumerate() {
            let node = self.arena.get(factor);
            if i == 0 {
                if let Some(value) = node.as_f64() {
                    let value = if negate { -value } else { value };
                    minus = value < 0.0;
                    if value.abs() != 1.0 {
                        numerator.push(self.magnitude(node));
                    }
                    continue;
                }
            }
            match node {
                ExprNode::Pow { base, exp } if self.arena.get(*exp).is_negative_number() => {
                    denominator.push(self.render_reciprocal_power(*base, *exp));
                }
                _ => numerator.push(self.wrap(factor, PREC_MUL)),
            }
        }

        let separator = match self.style {
            Style::Plain => "*",
            Style::Latex => " ",
        };
        let top = if numerator.is_empty() {
            "1".to_owned()
        } else {
            join_factors(&numerator, separator, self.style)
        };

        let body = if denominator.is_empty() {
            top
        } else {
            let bottom = join_factors(&denominator, separator, self.style);
            match self.style {
                Style::Plain if denominator.len() > 1 => format!("{top}/({bottom})"),
                Style::Plain => format!("{top}/{bottom}"),
                Style::Latex => format!("\\frac{{{top}}}{{{bottom}}}"),
            }
        };

        if minus {
            (format!("-{body}"), PREC_ADD)
        } else {
            (body, PREC_MUL)
        }
    }

    /// Renders `base^(-exp)` for a negative literal `exp`.
    fn render_reciprocal_power(&self, base: ExprHandle, exp: ExprHandle) -> String {
        match self.arena.get(exp) {
            ExprNode::Integer(-1) => self.wrap(base, PREC_POW),
            ExprNode::Rational(-1, 2) => self.render_sqrt(base),
            node => {
                let magnitude = match node {
                    ExprNode::Rational(n, d) => format!("{}/{d}", n.unsigned_abs()),
                    _ => self.magnitude(node),
                };
                let simple = !matches!(node, ExprNode::Rational(..)) || self.style == Style::Latex;
                self.format_power(&self.wrap(base, PREC_ATOM), &magnitude, simple)
            }
        }
    }

    fn render_power(&self, base: ExprHandle, exp: ExprHandle) -> (String, u8) {
        let exp_node = self.arena.get(exp);
        if matches!(exp_node, ExprNode::Rational(1, 2)) {
            return (self.render_sqrt(base), PREC_ATOM);
        }
        if exp_node.is_negative_number() {
            let bottom = self.render_reciprocal_power(base, exp);
            let text = match self.style {
                Style::Plain => format!("1/{bottom}"),
                Style::Latex => format!("\\frac{{1}}{{{bottom}}}"),
            };
            return (text, PREC_MUL);
        }

        let base_text = self.wrap(base, PREC_ATOM);
        let (exp_text, exp_prec) = self.render(exp);
        let simple = exp_prec == PREC_ATOM;
        (self.format_power(&base_text, &exp_text, simple), PREC_POW)
    }

    fn format_power(&self, base: &str, exp: &str, simple: bool) -> String {
        match self.style {
            Style::Plain if simple => format!("{base}^{exp}"),
            Style::Plain => format!("{base}^({exp})"),
            Style::Latex => format!("{base}^{{{exp}}}"),
        }
    }

    fn render_sqrt(&self, base: ExprHandle) -> String {
        let inner = self.render(base).0;
        match (self.style, self.arena.function_def(functions::SQRT)) {
            (Style::Latex, Some(def)) => def.latex(&inner),
            _ => format!("sqrt({inner})"),
        }
    }
}

fn sign_prec(negative: bool) -> u8 {
    if negative {
        PREC_ADD
    } else {
        PREC_ATOM
    }
}

/// Joins factors, using `\cdot` in LaTeX where juxtaposition would merge digits.
fn join_factors(factors: &[String], separator: &str, style: Style) -> String {
    let mut out = String::new();
    for (i, factor) in factors.iter().enumerate() {
        if i > 0 {
            let starts_numeric = factor.starts_with(|c: char| c.is_ascii_digit() || c == '.');
            if style == Style::Latex && starts_numeric {
                out.push_str(" \\cdot ");
            } else {
                out.push_str(separator);
            }
        }
        out.push_str(factor);
    }
    out
}
