use crate::test_utils::{bgp, iri, var};
use rdf_cursor_algebra::{JoinClassifier, LeftJoinClassifier, Op};
use rdf_cursor_model::{
    AggregateExpression, Expression, NamedNodePattern, OrderExpression,
};
use std::sync::Arc;

#[test]
fn test_join_on_shared_fixed_variable_is_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = bgp(&[("?y", "q", "?z")]);
    assert!(JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_modifier_on_right_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::Distinct(Arc::new(bgp(&[("?a", "q", "?b")])));
    assert!(!JoinClassifier::is_linear(&left, &right));

    let right = Op::minus(bgp(&[("?a", "q", "?b")]), bgp(&[("?a", "r", "?c")]));
    assert!(!JoinClassifier::is_linear(&left, &right));
}

fn subquery() -> Op {
    Op::Slice {
        inner: Arc::new(Op::project(bgp(&[("?t", "q", "?u")]), vec![var("t")])),
        start: 0,
        length: Some(1),
    }
}

#[test]
fn test_join_with_modifier_under_filter_is_not_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let right = Op::filter(vec![Expression::Bound(var("t"))], subquery());
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_modifier_under_extend_is_not_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let grouped = Op::Group {
        inner: Arc::new(bgp(&[("?t", "q", "?u")])),
        variables: vec![var("t")],
        aggregates: vec![(var("n"), AggregateExpression::CountSolutions { distinct: false })],
    };
    let right = Op::extend(grouped, var("w"), Expression::Variable(var("n")));
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_modifier_under_graph_is_not_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let right = Op::Graph {
        name: NamedNodePattern::NamedNode(iri("g")),
        inner: Arc::new(Op::Distinct(Arc::new(bgp(&[("?t", "q", "?u")])))),
    };
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_modifier_in_nested_join_is_not_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let right = Op::join(subquery(), bgp(&[("?t", "r", "?v")]));
    assert!(!JoinClassifier::is_linear(&left, &right));

    let right = Op::Sequence(vec![
        Arc::new(bgp(&[("?t", "r", "?v")])),
        Arc::new(Op::filter(vec![Expression::Bound(var("t"))], subquery())),
    ]);
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_modifier_in_union_branch_is_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let right = Op::union(subquery(), bgp(&[("?t", "r", "?v")]));
    assert!(JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_right_optional_fixed_on_left_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::left_join(bgp(&[("?a", "q", "?b")]), bgp(&[("?a", "r", "?y")]), vec![]);
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_right_filter_on_left_variable_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::filter(
        vec![Expression::Equal(
            Box::new(Expression::Variable(var("x"))),
            Box::new(iri("b").into()),
        )],
        bgp(&[("?y", "q", "?z")]),
    );
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_join_with_right_assignment_on_left_variable_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::extend(
        bgp(&[("?y", "q", "?z")]),
        var("w"),
        Expression::Variable(var("x")),
    );
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_labels_are_transparent() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::Label {
        label: "sorted".to_owned(),
        inner: Arc::new(Op::order(
            bgp(&[("?y", "q", "?z")]),
            vec![OrderExpression::Asc(Expression::Variable(var("z")))],
        )),
    };
    assert!(!JoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_left_join_with_ordered_right_side_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::order(
        bgp(&[("?a", "q", "?b")]),
        vec![OrderExpression::Asc(Expression::Variable(var("b")))],
    );
    assert!(!LeftJoinClassifier::is_linear(&left, &right));
    assert!(LeftJoinClassifier::non_linear_vars(&left, &right).is_empty());
}

#[test]
fn test_left_join_with_modifier_under_filter_is_not_linear() {
    let left = bgp(&[("?s", "p", "?o")]);
    let right = Op::filter(vec![Expression::Bound(var("t"))], subquery());
    assert!(!LeftJoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_left_join_simple_is_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = bgp(&[("?y", "q", "?z")]);
    assert!(LeftJoinClassifier::is_linear(&left, &right));
}

#[test]
fn test_nested_optional_on_left_variable_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::left_join(bgp(&[("?z", "q", "?w")]), bgp(&[("?z", "r", "?y")]), vec![]);
    assert!(!LeftJoinClassifier::is_linear(&left, &right));
    assert_eq!(
        LeftJoinClassifier::non_linear_vars(&left, &right),
        [var("y")].into_iter().collect()
    );
}

#[test]
fn test_left_join_with_filter_on_left_variable_is_not_linear() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = Op::filter(
        vec![Expression::Bound(var("x"))],
        bgp(&[("?z", "q", "?w")]),
    );
    assert!(!LeftJoinClassifier::is_linear(&left, &right));
}
