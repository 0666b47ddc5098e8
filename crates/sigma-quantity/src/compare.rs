//! Comparisons between rounded quantities.
//!
//! Two quantities are equal when their uncertainty bands overlap. Ordering
//! compares the upper ends of the bands. Neither relation is transitive, so
//! quantities implement no `PartialOrd`.

use sigma_round::round_measurement;

use crate::error::Result;
use crate::ops::Operand;
use crate::quantity::Quantity;

/// True if the bands `[a - da, a + da]` and `[b - db, b + db]` overlap or touch.
#[must_use]
pub fn bands_equal((a, da): (f64, f64), (b, db): (f64, f64)) -> bool {
    a == b || (a - b).abs() <= da + db
}

/// True if the upper end of the first band lies below the second.
#[must_use]
pub fn band_less((a, da): (f64, f64), (b, db): (f64, f64)) -> bool {
    a + da < b + db
}

impl Operand<'_> {
    fn rounded(self) -> Result<(f64, f64)> {
        match self {
            Operand::Quantity(q) => q.get_value_error(),
            Operand::Scalar(value) => Ok(round_measurement(value, 0.0)?),
        }
    }
}

impl Quantity {
    /// `self == other` within uncertainty.
    ///
    /// ```
    /// use sigma_quantity::Workspace;
    ///
    /// let ws = Workspace::new();
    /// let p = ws.measured(&[10.0], 1.0)?;
    /// let q = ws.measured(&[10.5], 1.0)?;
    /// assert!(p.is_equal(&q)?);
    /// assert!(!p.is_equal(13.0)?);
    /// # Ok::<(), sigma_quantity::QuantityError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be evaluated.
    pub fn is_equal<'a>(&self, other: impl Into<Operand<'a>>) -> Result<bool> {
        Ok(bands_equal(self.get_value_error()?, other.into().rounded()?))
    }

    /// `self < other`: the upper end of `self` is below that of `other`.
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be evaluated.
    pub fn is_less<'a>(&self, other: impl Into<Operand<'a>>) -> Result<bool> {
        Ok(band_less(self.get_value_error()?, other.into().rounded()?))
    }

    /// `self < other || self == other`.
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be evaluated.
    pub fn is_less_or_equal<'a>(&self, other: impl Into<Operand<'a>>) -> Result<bool> {
        let (lhs, rhs) = (self.get_value_error()?, other.into().rounded()?);
        Ok(band_less(lhs, rhs) || bands_equal(lhs, rhs))
    }

    /// `other < self`.
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be evaluated.
    pub fn is_greater<'a>(&self, other: impl Into<Operand<'a>>) -> Result<bool> {
        Ok(band_less(other.into().rounded()?, self.get_value_error()?))
    }

    /// `other <= self`.
    ///
    /// # Errors
    ///
    /// Fails if either side cannot be evaluated.
    pub fn is_greater_or_equal<'a>(&self, other: impl Into<Operand<'a>>) -> Result<bool> {
        let (lhs, rhs) = (other.into().rounded()?, self.get_value_error()?);
        Ok(band_less(lhs, rhs) || bands_equal(lhs, rhs))
    }
}
