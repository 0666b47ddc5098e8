//! Plain and LaTeX renderings of a quantity.

use std::collections::BTreeMap;
use std::fmt;

use sigma_core::display::format_real;
use sigma_core::{evaluate, simplify, substitute, SymbolId};
use sigma_round::{round_pair, ExactDecimal};

use crate::config::FormatConfig;
use crate::deviation::{check_bound, derive};
use crate::error::Result;
use crate::quantity::Quantity;

/// Formats like C's `%g` with `significant` digits.
///
/// Fixed notation is used for decimal exponents from -4 up to
/// `significant - 1`, scientific notation otherwise. Trailing zeros are
/// dropped.
///
/// ```
/// use sigma_quantity::format_general;
///
/// assert_eq!(format_general(8.0, 10), "8");
/// assert_eq!(format_general(0.012, 10), "0.012");
/// assert_eq!(format_general(1234.5, 3), "1.23e+03");
/// assert_eq!(format_general(0.00001, 6), "1e-05");
/// ```
#[must_use]
pub fn format_general(value: f64, significant: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    let digits = significant.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let digits = i32::try_from(digits).unwrap_or(i32::MAX);
    if exponent < -4 || exponent >= digits {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.unsigned_abs())
    } else {
        let decimals = usize::try_from(digits - 1 - exponent).unwrap_or(0);
        trim_zeros(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// A rounded value and error, displayed as `value ± error`.
///
/// The formatter precision overrides the configured number of significant
/// digits: `format!("{:.3}", r)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rounded {
    /// The rounded value.
    pub value: f64,
    /// The rounded error.
    pub error: f64,
    significant_digits: usize,
    separator: char,
}

impl Rounded {
    /// Wraps a pair with the default format.
    #[must_use]
    pub fn new(value: f64, error: f64) -> Self {
        Self::from_config(value, error, &FormatConfig::default())
    }

    fn from_config(value: f64, error: f64, config: &FormatConfig) -> Self {
        Self {
            value,
            error,
            significant_digits: config.significant_digits,
            separator: config.separator,
        }
    }

    /// Uses the digits and separator of `config`.
    #[must_use]
    pub fn with_format(self, config: &FormatConfig) -> Self {
        Self::from_config(self.value, self.error, config)
    }

    /// The `(value, error)` pair.
    #[must_use]
    pub fn pair(self) -> (f64, f64) {
        (self.value, self.error)
    }
}

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = f.precision().unwrap_or(self.significant_digits);
        write!(
            f,
            "{} {} {}",
            format_general(self.value, digits),
            self.separator,
            format_general(self.error, digits)
        )
    }
}

/// Every step from the deviation formula to the rounded result, as LaTeX.
#[derive(Clone, Debug, PartialEq)]
pub struct VerboseReport {
    /// The deviation formula.
    pub deviation_formula: String,
    /// The deviation formula with numbers substituted.
    pub deviation_substituted: String,
    /// Unrounded deviation.
    pub deviation_value: f64,
    /// The expression, with ignored variables replaced by their values.
    pub formula: String,
    /// The expression with every value substituted.
    pub substituted: String,
    /// Rounded value, keeping the digits the error supports.
    pub value: ExactDecimal,
    /// Rounded error.
    pub error: ExactDecimal,
    /// Wrap the output in `$$ ... $$`.
    pub display_math: bool,
}

impl VerboseReport {
    /// The report body without math delimiters.
    #[must_use]
    pub fn latex(&self) -> String {
        format!(
            "{}={}={}\\\\{}= {} = {} \\pm {}",
            self.deviation_formula,
            self.deviation_substituted,
            format_real(self.deviation_value),
            self.formula,
            self.substituted,
            self.value,
            self.error
        )
    }
}

impl fmt::Display for VerboseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_math {
            write!(f, "$${}$$", self.latex())
        } else {
            f.write_str(&self.latex())
        }
    }
}

impl Quantity {
    /// Builds the verbose LaTeX derivation of this quantity.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable, a failed evaluation or rounding.
    pub fn report(&self) -> Result<VerboseReport> {
        self.report_ignoring(&[])
    }

    /// Builds the verbose report with the variables of `others` treated as
    /// exact.
    ///
    /// Ignored variables are replaced by their values before the expression
    /// is simplified, so they appear as numbers throughout.
    ///
    /// # Errors
    ///
    /// Fails on an unmeasured variable, a failed evaluation or rounding.
    ///
    /// # Panics
    ///
    /// Panics if one of `others` belongs to another workspace.
    pub fn report_ignoring(&self, others: &[&Quantity]) -> Result<VerboseReport> {
        let ignore = self.ignoring(others);
        let table = self.table();
        let mut arena = self.workspace().write();
        check_bound(&arena, self.expr(), table)?;

        let mut exact = BTreeMap::new();
        let mut values: BTreeMap<SymbolId, _> = BTreeMap::new();
        for (id, measurement) in table.iter() {
            let literal = arena.real(measurement.value);
            if ignore.contains(&id) {
                exact.insert(id, literal);
            }
            values.insert(id, literal);
        }

        let reduced = substitute(&mut arena, self.expr(), &exact);
        let reduced = simplify(&mut arena, reduced);
        let deviation = derive(&mut arena, reduced, table, &ignore)?.evaluate(&arena)?;
        let substituted = substitute(&mut arena, reduced, &values);
        let value = evaluate(&arena, reduced, table)?;

        let (value, error) = round_pair(
            &ExactDecimal::from_f64(value)?,
            &ExactDecimal::from_f64(deviation.value)?,
        )?;
        Ok(VerboseReport {
            deviation_formula: arena.latex(deviation.formula),
            deviation_substituted: arena.latex(deviation.substituted),
            deviation_value: deviation.value,
            formula: arena.latex(reduced),
            substituted: arena.latex(substituted),
            value,
            error,
            display_math: self.workspace().config().display_math,
        })
    }
}
