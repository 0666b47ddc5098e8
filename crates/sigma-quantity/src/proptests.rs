//! Property-based tests for quantity arithmetic.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{Quantity, Workspace};

    fn measurement() -> impl Strategy<Value = (f64, f64)> {
        (1.0f64..100.0, 0.01f64..5.0)
    }

    /// Whole values keep every product exact.
    fn whole_measurement() -> impl Strategy<Value = (f64, f64)> {
        (1u32..100, 0.01f64..5.0).prop_map(|(value, dev)| (f64::from(value), dev))
    }

    fn three(ws: &Workspace, a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> [Quantity; 3] {
        [a, b, c].map(|(value, dev)| ws.measured(&[value], dev).unwrap())
    }

    proptest! {
        #[test]
        fn addition_is_associative(a in measurement(), b in measurement(), c in measurement()) {
            let ws = Workspace::new();
            let [x, y, z] = three(&ws, a, b, c);
            let left = (&x + &y) + &z;
            let right = &x + (&y + &z);
            prop_assert_eq!(left.get_value_error().unwrap(), right.get_value_error().unwrap());
        }

        #[test]
        fn multiplication_is_associative(
            a in whole_measurement(),
            b in whole_measurement(),
            c in whole_measurement(),
        ) {
            let ws = Workspace::new();
            let [x, y, z] = three(&ws, a, b, c);
            let left = (&x * &y) * &z;
            let right = &x * (&y * &z);
            prop_assert_eq!(left.get_value_error().unwrap(), right.get_value_error().unwrap());
        }

        #[test]
        fn operations_commute(a in measurement(), b in measurement()) {
            let ws = Workspace::new();
            let x = ws.measured(&[a.0], a.1).unwrap();
            let y = ws.measured(&[b.0], b.1).unwrap();
            let sum = (&x + &y).get_value_error().unwrap();
            prop_assert_eq!(sum, (&y + &x).get_value_error().unwrap());
            let product = (&x * &y).get_value_error().unwrap();
            prop_assert_eq!(product, (&y * &x).get_value_error().unwrap());
        }

        #[test]
        fn negation_keeps_deviation(a in measurement()) {
            let ws = Workspace::new();
            let x = ws.measured(&[a.0], a.1).unwrap();
            let (value, error) = x.get_value_error().unwrap();
            prop_assert_eq!((-&x).get_value_error().unwrap(), (-value, error));
        }

        #[test]
        fn identity_function_is_transparent(a in measurement(), b in measurement()) {
            let ws = Workspace::new();
            let x = ws.measured(&[a.0], a.1).unwrap();
            let y = ws.measured(&[b.0], b.1).unwrap();
            let q = (&x / &y).sin();
            prop_assert_eq!(q.use_func(|_, e| e).get_value_error(), q.get_value_error());
        }
    }
}
