//! Property-based tests for simplification and differentiation.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use crate::{differentiate, evaluate, simplify, ExprArena, ExprHandle, SymbolId};

    /// A small expression tree over `x` and `y`, built into an arena later.
    #[derive(Clone, Debug)]
    enum Tree {
        X,
        Y,
        Int(i64),
        Add(Box<Tree>, Box<Tree>),
        Mul(Box<Tree>, Box<Tree>),
        Sub(Box<Tree>, Box<Tree>),
        Square(Box<Tree>),
    }

    fn tree() -> impl Strategy<Value = Tree> {
        let leaf = prop_oneof![Just(Tree::X), Just(Tree::Y), (-3i64..=3).prop_map(Tree::Int)];
        leaf.prop_recursive(3, 16, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Tree::Add(a.into(), b.into())),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Tree::Mul(a.into(), b.into())),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Tree::Sub(a.into(), b.into())),
                inner.prop_map(|a| Tree::Square(a.into())),
            ]
        })
    }

    fn build(arena: &mut ExprArena, tree: &Tree) -> ExprHandle {
        match tree {
            Tree::X => arena.symbol("x"),
            Tree::Y => arena.symbol("y"),
            Tree::Int(n) => arena.integer(*n),
            Tree::Add(a, b) => {
                let (a, b) = (build(arena, a), build(arena, b));
                arena.add([a, b])
            }
            Tree::Mul(a, b) => {
                let (a, b) = (build(arena, a), build(arena, b));
                arena.mul([a, b])
            }
            Tree::Sub(a, b) => {
                let (a, b) = (build(arena, a), build(arena, b));
                arena.sub(a, b)
            }
            Tree::Square(a) => {
                let a = build(arena, a);
                arena.square(a)
            }
        }
    }

    fn point(arena: &mut ExprArena, x: f64, y: f64) -> (SymbolId, BTreeMap<SymbolId, f64>) {
        let x_id = arena.intern_symbol("x");
        let y_id = arena.intern_symbol("y");
        (x_id, BTreeMap::from([(x_id, x), (y_id, y)]))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
    }

    proptest! {
        #[test]
        fn simplify_preserves_value(t in tree(), x in -3.0f64..3.0, y in -3.0f64..3.0) {
            let mut arena = ExprArena::new();
            let expr = build(&mut arena, &t);
            let (_, values) = point(&mut arena, x, y);

            let before = evaluate(&arena, expr, &values).unwrap();
            let simplified = simplify(&mut arena, expr);
            let after = evaluate(&arena, simplified, &values).unwrap();
            prop_assert!(close(before, after), "{} vs {}", before, after);
        }

        #[test]
        fn simplify_is_idempotent(t in tree()) {
            let mut arena = ExprArena::new();
            let expr = build(&mut arena, &t);
            let once = simplify(&mut arena, expr);
            let twice = simplify(&mut arena, once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn derivative_matches_finite_difference(t in tree(), x in -2.0f64..2.0, y in -2.0f64..2.0) {
            let mut arena = ExprArena::new();
            let expr = build(&mut arena, &t);
            let (x_id, values) = point(&mut arena, x, y);

            let d = differentiate(&mut arena, expr, x_id).unwrap();
            let exact = evaluate(&arena, d, &values).unwrap();

            let h = 1e-5;
            let mut ahead = values.clone();
            ahead.insert(x_id, x + h);
            let mut behind = values.clone();
            behind.insert(x_id, x - h);
            let numeric = (evaluate(&arena, expr, &ahead).unwrap()
                - evaluate(&arena, expr, &behind).unwrap())
                / (2.0 * h);

            prop_assert!(
                (exact - numeric).abs() <= 1e-3 * (1.0 + exact.abs()),
                "{} vs {}", exact, numeric
            );
        }
    }
}
