use crate::test_utils::{
    bgp, binding, context, equal, evaluate, sorted, storage, unoptimized, var,
};
use rdf_cursor_algebra::Op;
use rdf_cursor_engine::compile;
use rdf_cursor_engine::iter::QueryIterator;
use rdf_cursor_model::{Binding, Expression};
use rdf_cursor_storage::MemQuadStorage;
use std::sync::Arc;

fn optional_storage() -> Arc<MemQuadStorage> {
    storage(&[
        ("a", "p", "1"),
        ("b", "p", "2"),
        ("a", "q", "x"),
        ("a", "q", "y"),
    ])
}

/// Evaluates `op` with the linear and the general join algorithm and checks that both agree.
fn evaluate_both(op: &Op, storage: &Arc<MemQuadStorage>) -> Vec<Binding> {
    let linear = evaluate(
        op,
        context(Arc::clone(storage)).with_options(unoptimized()),
    );
    let general = evaluate(
        op,
        context(Arc::clone(storage))
            .with_options(unoptimized().with_index_join_strategy(false)),
    );
    assert_eq!(sorted(&linear), sorted(&general));
    linear
}

#[test]
fn test_optional_keeps_unmatched_left_bindings() {
    let op = Op::left_join(
        bgp(&[("?s", "p", "?o")]),
        bgp(&[("?s", "q", "?t")]),
        vec![],
    );

    let results = evaluate_both(&op, &optional_storage());

    assert_eq!(
        sorted(&results),
        sorted(&[
            binding(&[("s", "a"), ("o", "1"), ("t", "x")]),
            binding(&[("s", "a"), ("o", "1"), ("t", "y")]),
            binding(&[("s", "b"), ("o", "2")]),
        ])
    );
}

#[test]
fn test_optional_condition_rejects_matches() {
    let op = Op::left_join(
        bgp(&[("?s", "p", "?o")]),
        bgp(&[("?s", "q", "?t")]),
        vec![equal("t", "x")],
    );

    let results = evaluate_both(&op, &optional_storage());

    assert_eq!(
        sorted(&results),
        sorted(&[
            binding(&[("s", "a"), ("o", "1"), ("t", "x")]),
            binding(&[("s", "b"), ("o", "2")]),
        ])
    );
}

#[test]
fn test_optional_condition_without_any_match_falls_back() {
    let op = Op::left_join(
        bgp(&[("?s", "p", "?o")]),
        bgp(&[("?s", "q", "?t")]),
        vec![equal("t", "z")],
    );

    let results = evaluate_both(&op, &optional_storage());

    assert_eq!(
        sorted(&results),
        sorted(&[
            binding(&[("s", "a"), ("o", "1")]),
            binding(&[("s", "b"), ("o", "2")]),
        ])
    );
}

#[test]
fn test_filtered_subquery_limit_applies_per_subquery() {
    let subquery = Op::Slice {
        inner: Arc::new(Op::project(bgp(&[("?t", "q", "?u")]), vec![var("t")])),
        start: 0,
        length: Some(1),
    };
    let op = Op::join(
        bgp(&[("?s", "p", "?o")]),
        Op::filter(vec![Expression::Bound(var("t"))], subquery),
    );
    let expected = sorted(&[
        binding(&[("s", "a"), ("o", "1"), ("t", "a")]),
        binding(&[("s", "b"), ("o", "2"), ("t", "a")]),
    ]);

    let results = evaluate_both(&op, &optional_storage());
    assert_eq!(sorted(&results), expected);

    let optimized = evaluate(&op, context(optional_storage()));
    assert_eq!(sorted(&optimized), expected);
}

#[test]
fn test_minus_excludes_on_shared_variables() {
    let op = Op::minus(bgp(&[("?s", "p", "?o")]), bgp(&[("?s", "q", "?t")]));

    let results = evaluate(&op, context(optional_storage()));

    assert_eq!(results, vec![binding(&[("s", "b"), ("o", "2")])]);
}

#[test]
fn test_minus_with_disjoint_variables() {
    let disjoint = Op::minus(bgp(&[("?s", "p", "?o")]), bgp(&[("?u", "q", "?t")]));
    assert!(evaluate(&disjoint, context(optional_storage())).is_empty());

    let empty_right = Op::minus(bgp(&[("?s", "p", "?o")]), bgp(&[("?u", "r", "?t")]));
    assert_eq!(evaluate(&empty_right, context(optional_storage())).len(), 2);
}

#[test]
fn test_diff_removes_compatible_bindings() {
    let op = Op::diff(bgp(&[("?s", "p", "?o")]), bgp(&[("?s", "q", "?t")]));

    let results = evaluate(&op, context(optional_storage()));

    assert_eq!(results, vec![binding(&[("s", "b"), ("o", "2")])]);
}

#[test]
fn test_close_is_idempotent() {
    let op = Op::join(bgp(&[("?s", "p", "?o")]), bgp(&[("?s", "q", "?t")]));
    let ctx = context(optional_storage()).with_options(unoptimized().with_index_join_strategy(false));

    let mut iter = compile(&op, Arc::new(ctx)).unwrap();
    let first = iter.next().unwrap().unwrap();
    iter.close();
    iter.close();

    assert_eq!(first, binding(&[("s", "a"), ("o", "1"), ("t", "x")]));
    assert!(iter.next().is_none());
}
