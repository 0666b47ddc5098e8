//! Exact decimals of unbounded magnitude.
//!
//! Every finite `f64` is `m * 2^k`, and `2^-k = 5^k / 10^k`, so its binary
//! value has a finite decimal expansion. [`ExactDecimal`] stores that
//! expansion as a big integer and a decimal scale.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use dashu::integer::UBig;

use crate::error::RoundingError;

fn pow10(exp: u32) -> UBig {
    UBig::from(10u8).pow(exp as usize)
}

/// An exact decimal `±digits * 10^-scale`.
///
/// A negative scale stands for zeros before the decimal point: `1200`
/// rounded to hundreds is `12` at scale `-2`. Equality compares digits and
/// scale, so `1.0` and `1.00` differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExactDecimal {
    negative: bool,
    digits: UBig,
    scale: i32,
}

impl ExactDecimal {
    /// Zero at scale 0.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: UBig::ZERO,
            scale: 0,
        }
    }

    /// The exact decimal expansion of a finite `f64`.
    ///
    /// ```
    /// use sigma_round::ExactDecimal;
    ///
    /// let tenth = ExactDecimal::from_f64(0.1)?;
    /// assert_eq!(tenth.to_string(), "0.1000000000000000055511151231257827021181583404541015625");
    /// assert_eq!(ExactDecimal::from_f64(1e30)?.to_string(), "1000000000000000019884624838656");
    /// # Ok::<(), sigma_round::RoundingError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`RoundingError::NonFinite`] for NaN or infinities.
    pub fn from_f64(value: f64) -> Result<Self, RoundingError> {
        if !value.is_finite() {
            return Err(RoundingError::NonFinite(value));
        }
        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7ff) as i32;
        let fraction = bits & ((1 << 52) - 1);

        // Subnormals have no implicit leading bit.
        let (mut mantissa, mut exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1 << 52), biased - 1075)
        };
        if mantissa == 0 {
            return Ok(Self {
                negative,
                ..Self::zero()
            });
        }
        let shift = mantissa.trailing_zeros();
        mantissa >>= shift;
        exponent += shift as i32;

        let (digits, scale) = if exponent >= 0 {
            (UBig::from(mantissa) << exponent as usize, 0)
        } else {
            let fives = UBig::from(5u8).pow(exponent.unsigned_abs() as usize);
            (UBig::from(mantissa) * fives, -exponent)
        };
        Ok(Self {
            negative,
            digits,
            scale,
        })
    }

    /// The nearest `f64`.
    ///
    /// # Errors
    ///
    /// [`RoundingError::OutOfRange`] when the magnitude exceeds `f64::MAX`.
    pub fn to_f64(&self) -> Result<f64, RoundingError> {
        let sign = if self.negative { "-" } else { "" };
        // Float parsing rounds correctly for any number of digits.
        let text = format!("{sign}{}e{}", self.digits, -i64::from(self.scale));
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(RoundingError::OutOfRange(self.to_string())),
        }
    }

    /// Number of digits after the decimal point. Negative for values rounded
    /// to tens, hundreds and so on.
    #[must_use]
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// True for zero of either sign.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits == UBig::ZERO
    }

    /// True if the sign bit is set, including for `-0`.
    #[must_use]
    pub fn is_sign_negative(&self) -> bool {
        self.negative
    }

    /// The exponent of the leading digit and whether that digit is a 1.
    pub(crate) fn leading_digit(&self) -> Option<(i32, bool)> {
        if self.is_zero() {
            return None;
        }
        let text = self.digits.to_string();
        let count = text.len() as i32;
        Some((count - 1 - self.scale, text.starts_with('1')))
    }

    /// Rounds half-even to `places` decimal places.
    ///
    /// The result carries exactly that scale: `1` rounded to one place is
    /// `1.0`, `123.4` rounded to `-1` places is `120`.
    #[must_use]
    pub fn round_to(&self, places: i32) -> Self {
        let digits = if places >= self.scale {
            &self.digits * pow10((places - self.scale).unsigned_abs())
        } else {
            let step = pow10((self.scale - places).unsigned_abs());
            let quotient = &self.digits / &step;
            let remainder = &self.digits % &step;
            let round_up = match (&remainder + &remainder).cmp(&step) {
                Ordering::Greater => true,
                Ordering::Equal => &quotient % UBig::from(2u8) == UBig::ONE,
                Ordering::Less => false,
            };
            if round_up {
                quotient + UBig::ONE
            } else {
                quotient
            }
        };
        Self {
            negative: self.negative,
            digits,
            scale: places,
        }
    }
}

impl Default for ExactDecimal {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for ExactDecimal {
    type Err = RoundingError;

    /// Parses `[-]digits[.digits]`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || RoundingError::InvalidLiteral(text.to_owned());
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits {
            return Err(invalid());
        }
        let digits =
            UBig::from_str_radix(&format!("{whole}{fraction}"), 10).map_err(|_| invalid())?;
        let scale = i32::try_from(fraction.len()).map_err(|_| invalid())?;
        Ok(Self {
            negative,
            digits,
            scale,
        })
    }
}

impl fmt::Display for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let text = self.digits.to_string();
        if self.scale <= 0 {
            f.write_str(&text)?;
            if !self.is_zero() {
                for _ in 0..self.scale.unsigned_abs() {
                    f.write_str("0")?;
                }
            }
            return Ok(());
        }

        let scale = self.scale.unsigned_abs() as usize;
        let padded = format!("{text:0>width$}", width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{whole}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> ExactDecimal {
        text.parse().unwrap()
    }

    #[test]
    fn test_from_f64_is_exact() {
        assert_eq!(ExactDecimal::from_f64(0.125).unwrap(), dec("0.125"));
        assert_eq!(ExactDecimal::from_f64(3.0).unwrap(), dec("3"));
        assert_eq!(ExactDecimal::from_f64(-2.5).unwrap(), dec("-2.5"));
        assert_eq!(ExactDecimal::from_f64(1024.0).unwrap(), dec("1024"));
        assert!(ExactDecimal::from_f64(0.0).unwrap().is_zero());
        assert!(ExactDecimal::from_f64(-0.0).unwrap().is_sign_negative());
    }

    #[test]
    fn test_from_f64_extremes() {
        let tiny = ExactDecimal::from_f64(f64::from_bits(1)).unwrap();
        assert_eq!(tiny.scale(), 1074);
        assert_eq!(tiny.to_f64().unwrap(), f64::from_bits(1));

        let huge = ExactDecimal::from_f64(f64::MAX).unwrap();
        assert_eq!(huge.scale(), 0);
        assert_eq!(huge.to_f64().unwrap(), f64::MAX);
        assert_eq!(huge.to_string().len(), 309);
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(matches!(ExactDecimal::from_f64(f64::NAN), Err(RoundingError::NonFinite(_))));
        assert!(matches!(
            ExactDecimal::from_f64(f64::INFINITY),
            Err(RoundingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(dec("0.0123").to_string(), "0.0123");
        assert_eq!(dec("-1.50").to_string(), "-1.50");
        assert_eq!(dec("12").round_to(-2).to_string(), "0");
        assert_eq!(dec("1234").round_to(-2).to_string(), "1200");
        assert_eq!(dec("7").round_to(2).to_string(), "7.00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "-", ".5", "1.2.3", "1e5", "abc", "+1"] {
            assert!(matches!(
                text.parse::<ExactDecimal>(),
                Err(RoundingError::InvalidLiteral(_))
            ));
        }
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(dec("2.25").round_to(1), dec("2.2"));
        assert_eq!(dec("2.35").round_to(1), dec("2.4"));
        assert_eq!(dec("-2.25").round_to(1), dec("-2.2"));
        assert_eq!(dec("2.251").round_to(1), dec("2.3"));
        assert_eq!(dec("25").round_to(-1).to_string(), "20");
        assert_eq!(dec("35").round_to(-1).to_string(), "40");
    }

    #[test]
    fn test_to_f64_overflow() {
        let beyond = ExactDecimal::from_f64(f64::MAX).unwrap().round_to(-308);
        assert!(matches!(beyond.to_f64(), Err(RoundingError::OutOfRange(_))));
    }
}
