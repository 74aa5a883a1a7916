use crate::test_utils::{bgp, binding, constant, context, evaluate, storage, var};
use rdf_cursor_algebra::Op;
use rdf_cursor_model::{
    AggregateExpression, AggregateFunction, Expression, OrderExpression,
};
use rdf_cursor_storage::MemQuadStorage;
use std::sync::Arc;

fn numbers() -> Arc<MemQuadStorage> {
    storage(&[("a", "p", "1"), ("b", "p", "0"), ("c", "p", "1")])
}

fn objects() -> Op {
    Op::project(bgp(&[("?s", "p", "?o")]), vec![var("o")])
}

#[test]
fn test_distinct_removes_all_duplicates() {
    let results = evaluate(&Op::Distinct(Arc::new(objects())), context(numbers()));

    assert_eq!(results, vec![binding(&[("o", "1")]), binding(&[("o", "0")])]);
}

#[test]
fn test_reduced_removes_adjacent_duplicates() {
    let results = evaluate(&Op::Reduced(Arc::new(objects())), context(numbers()));

    assert_eq!(
        results,
        vec![
            binding(&[("o", "1")]),
            binding(&[("o", "0")]),
            binding(&[("o", "1")]),
        ]
    );
}

#[test]
fn test_order_is_stable() {
    let ascending = Op::order(
        bgp(&[("?s", "p", "?o")]),
        vec![OrderExpression::Asc(Expression::Variable(var("o")))],
    );
    assert_eq!(
        evaluate(&ascending, context(numbers())),
        vec![
            binding(&[("s", "b"), ("o", "0")]),
            binding(&[("s", "a"), ("o", "1")]),
            binding(&[("s", "c"), ("o", "1")]),
        ]
    );

    let descending = Op::order(
        bgp(&[("?s", "p", "?o")]),
        vec![OrderExpression::Desc(Expression::Variable(var("o")))],
    );
    assert_eq!(
        evaluate(&descending, context(numbers())),
        vec![
            binding(&[("s", "a"), ("o", "1")]),
            binding(&[("s", "c"), ("o", "1")]),
            binding(&[("s", "b"), ("o", "0")]),
        ]
    );
}

#[test]
fn test_slice_after_order() {
    let op = Op::Slice {
        inner: Arc::new(Op::order(
            bgp(&[("?s", "p", "?o")]),
            vec![OrderExpression::Asc(Expression::Variable(var("o")))],
        )),
        start: 1,
        length: Some(1),
    };

    let results = evaluate(&op, context(numbers()));

    assert_eq!(results, vec![binding(&[("s", "a"), ("o", "1")])]);
}

#[test]
fn test_group_counts_per_key_in_first_seen_order() {
    let op = Op::Group {
        inner: Arc::new(bgp(&[("?s", "p", "?o")])),
        variables: vec![var("o")],
        aggregates: vec![(
            var("n"),
            AggregateExpression::CountSolutions { distinct: false },
        )],
    };

    let results = evaluate(&op, context(numbers()));

    assert_eq!(
        results,
        vec![
            binding(&[("o", "1"), ("n", "2")]),
            binding(&[("o", "0"), ("n", "1")]),
        ]
    );
}

#[test]
fn test_group_without_keys_over_empty_input() {
    let sum = AggregateExpression::FunctionCall {
        name: AggregateFunction::Sum,
        expr: Expression::Variable(var("o")),
        distinct: false,
    };
    let sample = AggregateExpression::FunctionCall {
        name: AggregateFunction::Sample,
        expr: Expression::Variable(var("o")),
        distinct: false,
    };
    let op = Op::Group {
        inner: Arc::new(bgp(&[("?s", "unknown", "?o")])),
        variables: vec![],
        aggregates: vec![
            (var("n"), AggregateExpression::CountSolutions { distinct: false }),
            (var("sum"), sum),
            (var("sample"), sample),
        ],
    };

    let results = evaluate(&op, context(numbers()));

    assert_eq!(results, vec![binding(&[("n", "0"), ("sum", "0")])]);
}

#[test]
fn test_distinct_sum() {
    let op = Op::Group {
        inner: Arc::new(bgp(&[("?s", "p", "?o")])),
        variables: vec![],
        aggregates: vec![
            (
                var("all"),
                AggregateExpression::FunctionCall {
                    name: AggregateFunction::Sum,
                    expr: Expression::Variable(var("o")),
                    distinct: false,
                },
            ),
            (
                var("distinct"),
                AggregateExpression::FunctionCall {
                    name: AggregateFunction::Sum,
                    expr: Expression::Variable(var("o")),
                    distinct: true,
                },
            ),
        ],
    };

    let results = evaluate(&op, context(numbers()));

    assert_eq!(results, vec![binding(&[("all", "2"), ("distinct", "1")])]);
}

#[test]
fn test_extend_computes_values() {
    let op = Op::extend(
        bgp(&[("?s", "p", "?o")]),
        var("next"),
        Expression::Add(
            Box::new(Expression::Variable(var("o"))),
            Box::new(constant("1")),
        ),
    );

    let results = evaluate(&op, context(numbers()));

    assert_eq!(
        results,
        vec![
            binding(&[("s", "a"), ("o", "1"), ("next", "2")]),
            binding(&[("s", "b"), ("o", "0"), ("next", "1")]),
            binding(&[("s", "c"), ("o", "1"), ("next", "2")]),
        ]
    );
}

#[test]
fn test_extend_of_bound_variable_keeps_equal_values() {
    let op = Op::extend(bgp(&[("?s", "p", "?o")]), var("o"), constant("1"));

    let results = evaluate(&op, context(numbers()));

    assert_eq!(
        results,
        vec![
            binding(&[("s", "a"), ("o", "1")]),
            binding(&[("s", "c"), ("o", "1")]),
        ]
    );
}

#[test]
fn test_extend_error_leaves_variable_unbound() {
    let op = Op::extend(
        bgp(&[("?s", "p", "?o")]),
        var("bad"),
        Expression::Add(
            Box::new(Expression::Variable(var("s"))),
            Box::new(constant("1")),
        ),
    );

    let results = evaluate(&op, context(numbers()));

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|binding| !binding.contains(&var("bad"))));
}
