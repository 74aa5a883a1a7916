use crate::test_utils::{bgp, iri, var};
use rdf_cursor_algebra::{Op, VarFinder, VarSet};
use rdf_cursor_model::{Expression, NamedNodePattern};
use std::sync::Arc;

fn vars(names: &[&str]) -> VarSet {
    names.iter().map(|n| var(n)).collect()
}

#[test]
fn test_bgp_variables_are_fixed() {
    let usage = VarFinder::classify(&bgp(&[("?x", "p", "?y"), ("?y", "q", "c")]));
    assert_eq!(usage.fixed, vars(&["x", "y"]));
    assert!(usage.optional.is_empty());
    assert!(usage.filter.is_empty());
}

#[test]
fn test_left_join_right_side_is_optional() {
    let op = Op::left_join(
        bgp(&[("?x", "p", "?y")]),
        bgp(&[("?y", "q", "?z")]),
        vec![Expression::Bound(var("w"))],
    );
    let usage = VarFinder::classify(&op);

    assert_eq!(usage.fixed, vars(&["x", "y"]));
    assert_eq!(usage.optional, vars(&["z"]));
    assert_eq!(usage.filter, vars(&["w"]));
}

#[test]
fn test_filter_and_project() {
    let filter = Op::filter(
        vec![Expression::Equal(
            Box::new(Expression::Variable(var("y"))),
            Box::new(iri("b").into()),
        )],
        bgp(&[("?x", "p", "?y")]),
    );
    let usage = VarFinder::classify(&filter);
    assert_eq!(usage.filter, vars(&["y"]));

    let project = Op::project(filter, vec![var("x")]);
    let usage = VarFinder::classify(&project);
    assert_eq!(usage.fixed, vars(&["x"]));
    assert!(usage.filter.is_empty());
}

#[test]
fn test_extend_fixes_variable_and_records_assignment() {
    let op = Op::extend(
        bgp(&[("?x", "p", "?y")]),
        var("z"),
        Expression::Variable(var("w")),
    );
    let usage = VarFinder::classify(&op);
    assert_eq!(usage.fixed, vars(&["x", "y", "z"]));
    assert_eq!(usage.assign, vars(&["w"]));
}

#[test]
fn test_graph_variable_is_fixed() {
    let op = Op::Graph {
        name: NamedNodePattern::Variable(var("g")),
        inner: Arc::new(bgp(&[("?x", "p", "?y")])),
    };
    assert_eq!(VarFinder::classify(&op).fixed, vars(&["g", "x", "y"]));
}

#[test]
fn test_minus_only_exposes_left_side() {
    let op = Op::minus(bgp(&[("?x", "p", "?y")]), bgp(&[("?x", "q", "?z")]));
    assert_eq!(VarFinder::classify(&op).fixed, vars(&["x", "y"]));
}

/// A variable bound in only one branch of a union is still reported as fixed.
#[test]
fn test_union_fixed_is_union_of_branches() {
    let op = Op::union(bgp(&[("?x", "p", "?y")]), bgp(&[("?x", "q", "?z")]));
    let usage = VarFinder::classify(&op);
    assert_eq!(usage.fixed, vars(&["x", "y", "z"]));
    assert!(usage.optional.is_empty());
}
