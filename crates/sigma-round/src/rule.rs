//! The significant-digit rounding rule.
//!
//! A deviation keeps one significant digit, or two when its leading digit is
//! a 1. The value is rounded to the same decimal place. All arithmetic is
//! carried out on exact decimals, with half-even tie breaking.

use crate::decimal::ExactDecimal;
use crate::error::RoundingError;

/// The number of decimal places a deviation dictates.
///
/// With `e` the exponent of the leading digit, the result is `-e`, plus one
/// when that digit is a 1. Negative results mean rounding to tens, hundreds
/// and so on. Returns `None` for a zero deviation. The sign is ignored.
///
/// ```
/// use sigma_round::{precision_for, ExactDecimal};
///
/// let places = |text: &str| precision_for(&text.parse::<ExactDecimal>().unwrap());
/// assert_eq!(places("0.0123"), Some(3));
/// assert_eq!(places("25"), Some(-1));
/// assert_eq!(places("0"), None);
/// ```
#[must_use]
pub fn precision_for(deviation: &ExactDecimal) -> Option<i32> {
    let (exponent, leading_one) = deviation.leading_digit()?;
    Some(-exponent + i32::from(leading_one))
}

/// Rounds a decimal `(value, deviation)` pair to the precision of the deviation.
///
/// A zero deviation returns the pair unchanged.
///
/// # Errors
///
/// [`RoundingError::NegativeDeviation`] for a negative deviation.
pub fn round_pair(
    value: &ExactDecimal,
    deviation: &ExactDecimal,
) -> Result<(ExactDecimal, ExactDecimal), RoundingError> {
    if deviation.is_sign_negative() && !deviation.is_zero() {
        return Err(RoundingError::NegativeDeviation(deviation.to_string()));
    }
    let Some(places) = precision_for(deviation) else {
        return Ok((value.clone(), deviation.clone()));
    };
    Ok((value.round_to(places), deviation.round_to(places)))
}

/// Rounds a floating point `(value, deviation)` pair.
///
/// Both numbers are expanded to exact decimals, rounded with [`round_pair`]
/// and converted back. Any finite magnitude is accepted. A zero deviation
/// returns the inputs untouched.
///
/// ```
/// use sigma_round::round_measurement;
///
/// let (value, error) = round_measurement(0.81234, 0.0234).unwrap();
/// assert_eq!((value, error), (0.81, 0.02));
/// ```
///
/// # Errors
///
/// [`RoundingError::NonFinite`] or [`RoundingError::NegativeDeviation`] for
/// invalid inputs, and [`RoundingError::OutOfRange`] when rounding pushes the
/// value past `f64::MAX`.
pub fn round_measurement(value: f64, deviation: f64) -> Result<(f64, f64), RoundingError> {
    if !value.is_finite() {
        return Err(RoundingError::NonFinite(value));
    }
    if !deviation.is_finite() {
        return Err(RoundingError::NonFinite(deviation));
    }
    if deviation < 0.0 {
        return Err(RoundingError::NegativeDeviation(deviation.to_string()));
    }
    if deviation == 0.0 {
        return Ok((value, deviation));
    }

    let (value, deviation) = round_pair(
        &ExactDecimal::from_f64(value)?,
        &ExactDecimal::from_f64(deviation)?,
    )?;
    Ok((value.to_f64()?, deviation.to_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> ExactDecimal {
        text.parse().unwrap()
    }

    fn rounded(value: &str, deviation: &str) -> (String, String) {
        let (value, deviation) = round_pair(&dec(value), &dec(deviation)).unwrap();
        (value.to_string(), deviation.to_string())
    }

    #[test]
    fn test_precision_for() {
        assert_eq!(precision_for(&dec("0.0123")), Some(3));
        assert_eq!(precision_for(&dec("0.5")), Some(1));
        assert_eq!(precision_for(&dec("1")), Some(1));
        assert_eq!(precision_for(&dec("1.00")), Some(1));
        assert_eq!(precision_for(&dec("2")), Some(0));
        assert_eq!(precision_for(&dec("25")), Some(-1));
        assert_eq!(precision_for(&dec("150")), Some(-1));
        assert_eq!(precision_for(&dec("0")), None);
    }

    #[test]
    fn test_round_pair() {
        assert_eq!(rounded("1.23456", "0.0123"), ("1.235".into(), "0.012".into()));
        assert_eq!(rounded("123.456", "25"), ("120".into(), "20".into()));
        assert_eq!(rounded("2.25", "0.3"), ("2.2".into(), "0.3".into()));
        assert_eq!(rounded("-1250", "300"), ("-1200".into(), "300".into()));
    }

    #[test]
    fn test_round_pair_keeps_trailing_zeros() {
        assert_eq!(rounded("14", "1"), ("14.0".into(), "1.0".into()));
    }

    #[test]
    fn test_round_pair_carries_into_next_decade() {
        assert_eq!(rounded("0", "0.96"), ("0.0".into(), "1.0".into()));
    }

    #[test]
    fn test_zero_deviation_is_untouched() {
        assert_eq!(rounded("3.14159", "0"), ("3.14159".into(), "0".into()));
        assert_eq!(round_measurement(3.14159, 0.0).unwrap(), (3.14159, 0.0));
    }

    #[test]
    fn test_negative_deviation() {
        assert!(matches!(
            round_pair(&dec("1"), &dec("-0.1")),
            Err(RoundingError::NegativeDeviation(_))
        ));
        assert!(matches!(
            round_measurement(1.0, -0.1),
            Err(RoundingError::NegativeDeviation(_))
        ));
    }

    #[test]
    fn test_non_finite() {
        assert!(matches!(round_measurement(f64::NAN, 0.1), Err(RoundingError::NonFinite(_))));
        assert!(matches!(
            round_measurement(1.0, f64::INFINITY),
            Err(RoundingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_tiny_magnitudes() {
        assert_eq!(
            round_measurement(6.62607015e-34, 8.1e-42).unwrap(),
            (6.62607015e-34, 8e-42)
        );
        // The smallest subnormal deviation still has a leading digit.
        assert_eq!(round_measurement(1.0, 5e-324).unwrap(), (1.0, 5e-324));
    }

    #[test]
    fn test_huge_magnitudes() {
        assert_eq!(round_measurement(1e30, 2e27).unwrap(), (1e30, 2e27));
        assert_eq!(round_measurement(6.02214076e23, 3.4e20).unwrap(), (6.022e23, 3e20));
    }

    #[test]
    fn test_rounding_past_f64_max() {
        assert!(matches!(
            round_measurement(f64::MAX, 1e308),
            Err(RoundingError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_round_measurement() {
        assert_eq!(round_measurement(1.23456, 0.0123).unwrap(), (1.235, 0.012));
        assert_eq!(round_measurement(123.456, 25.0).unwrap(), (120.0, 20.0));
    }

    #[test]
    fn test_round_measurement_uses_binary_expansion() {
        // 0.125 is exact in binary, so the tie goes to the even digit.
        assert_eq!(round_measurement(0.125, 0.03).unwrap(), (0.12, 0.03));
        // 0.135 is stored slightly above the midpoint.
        assert_eq!(round_measurement(0.135, 0.03).unwrap(), (0.14, 0.03));
    }
}
