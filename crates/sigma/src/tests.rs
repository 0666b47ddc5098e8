//! Integration tests for sigma.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::core::functions;
    use crate::prelude::*;
    use crate::quantity::columns;

    /// The logistic function `1 / (1 + e^-x)`.
    #[derive(Debug)]
    struct Logistic;

    impl UnaryFunction for Logistic {
        fn name(&self) -> &str {
            "logistic"
        }

        fn eval(&self, x: f64) -> f64 {
            1.0 / (1.0 + (-x).exp())
        }

        // s'(x) = e^-x / (1 + e^-x)^2
        fn derivative(&self, arena: &mut ExprArena, arg: ExprHandle) -> ExprHandle {
            let minus_x = arena.neg(arg);
            let decay = arena.apply(functions::EXP, minus_x);
            let one = arena.integer(1);
            let denominator = arena.add([one, decay]);
            let denominator = arena.square(denominator);
            arena.div(decay, denominator)
        }
    }

    #[test]
    fn test_constants_have_no_deviation() {
        let ws = Workspace::new();
        let q = ws.constant(5.0) + 3.0;
        assert_eq!(q.get_value_error().unwrap(), (8.0, 0.0));
        assert_eq!(q.value_error().unwrap().to_string(), "8 ± 0");
    }

    #[test]
    fn test_pendulum() {
        let ws = Workspace::new();
        let length = ws.measured_named("l", &[0.995, 1.002, 1.001, 0.998], 0.001).unwrap();
        let period = ws.measured_named("T", &[2.01, 2.00, 1.99, 2.00], 0.005).unwrap();

        let two_pi = 2.0 * std::f64::consts::PI;
        let g = (two_pi * two_pi) * &length / period.pow(2);

        let (value, error) = g.get_value_error().unwrap();
        assert!((value - 9.86).abs() < 0.05, "{value}");
        assert!(error > 0.0 && error < 0.2, "{error}");

        let report = g.report().unwrap();
        assert!(report.deviation_formula.contains("\\sigma_{l}"));
        assert!(report.deviation_formula.contains("\\sigma_{T}"));
    }

    #[test]
    fn test_shared_error_term() {
        // One systematic error added to many readings stays a single variable.
        let ws = Workspace::new();
        let err = ws.error(10.0).unwrap();
        let half = &err / 2.0;
        let xs: Vec<Quantity> = [10.0, 20.0, 30.0]
            .into_iter()
            .map(|x| ws.constant(x) + &half)
            .collect();

        let (values, errors) = columns(&xs, &BatchConfig::default()).unwrap();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
        assert_eq!(errors, vec![5.0; 3]);

        // Fully correlated: the difference carries no error.
        let spread = &xs[2] - &xs[0];
        assert_eq!(spread.get_value_error().unwrap(), (20.0, 0.0));
    }

    #[test]
    fn test_user_function() {
        let ws = Workspace::new();
        let id = ws.register_function(Arc::new(Logistic));
        let x = ws.measured(&[0.0], 0.4).unwrap();

        // s(0) = 1/2, s'(0) = 1/4
        let y = x.apply(id);
        assert_eq!(y.get_value_error().unwrap(), (0.5, 0.1));
        assert!(y.report().unwrap().formula.contains("logistic"));
    }

    #[test]
    fn test_verbose_report() {
        let ws = Workspace::with_config(FormatConfig {
            display_math: true,
            ..FormatConfig::default()
        });
        let a = ws.measured_named("a", &[1.5], 0.1).unwrap();
        let b = ws.measured_named("b", &[2.5], 0.2).unwrap();
        let c = &a + &b;

        let report = c.report().unwrap();
        assert_eq!(report.value.to_string(), "4.0");
        assert_eq!(report.error.to_string(), "0.2");
        assert_eq!(report.formula, "a + b");
        assert_eq!(report.substituted, "1.5 + 2.5");
        assert_eq!(
            report.deviation_formula,
            "\\sqrt{\\sigma_{a}^{2} + \\sigma_{b}^{2}}"
        );
        assert!(report.to_string().starts_with("$$\\sqrt{"));
    }

    #[test]
    fn test_equality_within_bands() {
        let ws = Workspace::new();
        let p = ws.measured(&[10.0], 1.0).unwrap();
        let q = ws.measured(&[10.5], 1.0).unwrap();
        let r = ws.measured(&[13.0], 0.5).unwrap();

        assert!(p.is_equal(&q).unwrap());
        assert!(!p.is_equal(&r).unwrap());
        assert!(p.is_less(&r).unwrap());
        assert!(r.is_greater_or_equal(&q).unwrap());
    }

    #[test]
    fn test_build_from_source() {
        let ws = Workspace::new();
        let sources = vec![
            Source::Constant(2.0),
            Source::Samples {
                values: vec![1.0, 2.0, 3.0],
                systematic: 0.0,
                name: None,
            },
        ];
        let built: Vec<Quantity> = sources
            .into_iter()
            .map(|s| ws.build(s).unwrap())
            .collect();
        let product = &built[0] * &built[1];
        assert_eq!(product.get_value_error().unwrap(), (4.0, 2.0));
    }

    #[test]
    fn test_errors_are_reported() {
        let ws = Workspace::new();
        assert!(matches!(ws.measured(&[], 0.1), Err(QuantityError::EmptySamples)));

        let x = ws.measured(&[-1.0], 0.1).unwrap();
        assert!(matches!(x.ln().get_value_error(), Err(QuantityError::Expr(_))));

        assert!(matches!(round_measurement(1.0, -1.0), Err(RoundingError::NegativeDeviation(_))));
    }
}
