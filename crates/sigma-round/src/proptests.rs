//! Property-based tests for the rounding rule.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{precision_for, round_measurement, round_pair, ExactDecimal};

    fn exact(value: f64) -> ExactDecimal {
        ExactDecimal::from_f64(value).unwrap()
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(value in -1e6f64..1e6, deviation in 1e-6f64..1e6) {
            let (value, deviation) = (exact(value), exact(deviation));
            let places = precision_for(&deviation).unwrap();

            let (rounded, rounded_dev) = round_pair(&value, &deviation).unwrap();
            prop_assert_eq!(rounded.round_to(places), rounded.clone());
            prop_assert_eq!(rounded_dev.round_to(places), rounded_dev.clone());
        }

        #[test]
        fn rounding_moves_at_most_half_a_step(value in -1e6f64..1e6, deviation in 1e-6f64..1e6) {
            let places = precision_for(&exact(deviation)).unwrap();
            let (rounded, _) = round_measurement(value, deviation).unwrap();

            let half_step = 0.5 * 10f64.powi(-places);
            let slack = 1e-12 * value.abs().max(half_step);
            prop_assert!((rounded - value).abs() <= half_step + slack);
        }

        #[test]
        fn zero_deviation_keeps_value(value in -1e9f64..1e9) {
            let value = exact(value);
            let (rounded, deviation) = round_pair(&value, &ExactDecimal::zero()).unwrap();
            prop_assert_eq!(rounded, value);
            prop_assert!(deviation.is_zero());
        }

        #[test]
        fn any_magnitude_rounds(
            mantissa in 1.0f64..10.0,
            exponent in -300i32..300,
            deviation_mantissa in 1.0f64..10.0,
            deviation_exponent in -300i32..300,
        ) {
            let value = mantissa * 10f64.powi(exponent);
            let deviation = deviation_mantissa * 10f64.powi(deviation_exponent);
            let (_, rounded_dev) = round_measurement(value, deviation).unwrap();
            prop_assert!(rounded_dev > 0.0);
        }
    }
}
