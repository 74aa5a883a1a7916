use crate::test_utils::{bgp, iri, var};
use rdf_cursor_algebra::{Op, Optimizer, Table};
use rdf_cursor_model::Expression;
use std::sync::Arc;

fn equals_b(variable: &str) -> Expression {
    Expression::Equal(
        Box::new(Expression::Variable(var(variable))),
        Box::new(iri("b").into()),
    )
}

#[test]
fn test_merge_basic_patterns() {
    let op = Op::join(bgp(&[("?x", "p", "?y")]), bgp(&[("?y", "q", "?z")]));

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @"(bgp (?x <http://example.com/p> ?y) (?y <http://example.com/q> ?z))");
}

#[test]
fn test_remove_unit_table() {
    let op = Op::join(Op::Table(Table::unit()), bgp(&[("?x", "p", "?y")]));

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @"(bgp (?x <http://example.com/p> ?y))");
}

#[test]
fn test_merge_nested_filters() {
    let op = Op::Filter {
        expressions: vec![Expression::Bound(var("x"))],
        inner: Arc::new(Op::Filter {
            expressions: vec![Expression::Bound(var("y"))],
            inner: Arc::new(bgp(&[("?x", "p", "?y")])),
        }),
    };

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @r"
    (filter (exprlist (bound ?y) (bound ?x))
      (bgp (?x <http://example.com/p> ?y)))
    ");
}

#[test]
fn test_linear_join_becomes_sequence() {
    let op = Op::join(
        bgp(&[("?x", "p", "?y")]),
        Op::union(bgp(&[("?y", "q", "?z")]), bgp(&[("?y", "r", "?z")])),
    );

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @r"
    (sequence
      (bgp (?x <http://example.com/p> ?y))
      (union
        (bgp (?y <http://example.com/q> ?z))
        (bgp (?y <http://example.com/r> ?z))))
    ");
}

#[test]
fn test_non_linear_join_is_kept() {
    let op = Op::join(
        bgp(&[("?x", "p", "?y")]),
        Op::filter(vec![equals_b("x")], bgp(&[("?y", "q", "?z")])),
    );

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @r"
    (join
      (bgp (?x <http://example.com/p> ?y))
      (filter (= ?x <http://example.com/b>)
        (bgp (?y <http://example.com/q> ?z))))
    ");
}

#[test]
fn test_linear_left_join_becomes_conditional() {
    let op = Op::left_join(
        bgp(&[("?x", "p", "?y")]),
        bgp(&[("?y", "q", "?z")]),
        vec![equals_b("z")],
    );

    insta::assert_snapshot!(Optimizer::default().optimize(&op), @r"
    (conditional
      (bgp (?x <http://example.com/p> ?y))
      (filter (= ?z <http://example.com/b>)
        (bgp (?y <http://example.com/q> ?z))))
    ");
}

#[test]
fn test_no_linearization_without_index_join_strategy() {
    let op = Op::left_join(bgp(&[("?x", "p", "?y")]), bgp(&[("?y", "q", "?z")]), vec![]);

    insta::assert_snapshot!(Optimizer::new(false).optimize(&op), @r"
    (leftjoin
      (bgp (?x <http://example.com/p> ?y))
      (bgp (?y <http://example.com/q> ?z)))
    ");
}
