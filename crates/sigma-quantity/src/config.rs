//! Output and batch settings.

/// How values and reports are formatted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatConfig {
    /// Significant digits used by the plain `value ± error` form.
    pub significant_digits: usize,
    /// Glyph between value and error.
    pub separator: char,
    /// Wrap LaTeX reports in `$$ ... $$`.
    pub display_math: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            significant_digits: 10,
            separator: '±',
            display_math: false,
        }
    }
}

/// Configuration for evaluating many quantities at once.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Minimum number of quantities to evaluate in parallel.
    pub parallel_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
        }
    }
}
