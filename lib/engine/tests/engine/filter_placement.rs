use crate::test_utils::{bgp, equal, triple};
use insta::assert_snapshot;
use rdf_cursor_algebra::{BasicPattern, Op};
use rdf_cursor_engine::FilterPlacement;
use rdf_cursor_model::{NamedNodePattern, Variable};
use std::sync::Arc;

fn two_step_pattern() -> BasicPattern {
    BasicPattern::new([triple("?x", "p", "?y"), triple("?y", "q", "?z")])
}

#[test]
fn test_filter_is_placed_after_first_binding_triple() {
    let placement = FilterPlacement::new(false).place_bgp(&[equal("y", "b")], &two_step_pattern());

    assert_eq!(placement.steps().len(), 2);
    assert_eq!(placement.steps()[0].filters, vec![equal("y", "b")]);
    assert!(placement.steps()[1].filters.is_empty());
    assert!(placement.unplaced().is_empty());
    assert_snapshot!(placement, @r"
    (sequence
      (filter (= ?y <http://example.com/b>)
        (bgp (?x <http://example.com/p> ?y)))
      (bgp (?y <http://example.com/q> ?z)))
    ");
}

#[test]
fn test_safe_placement_keeps_pattern_whole() {
    let placement = FilterPlacement::new(true).place_bgp(&[equal("y", "b")], &two_step_pattern());

    assert_eq!(placement.steps().len(), 1);
    assert_snapshot!(placement, @r"
    (filter (= ?y <http://example.com/b>)
      (bgp (?x <http://example.com/p> ?y) (?y <http://example.com/q> ?z)))
    ");
}

#[test]
fn test_filter_on_unknown_variable_wraps_result() {
    let pattern = BasicPattern::new([triple("?x", "p", "?y")]);

    let placement = FilterPlacement::new(false).place_bgp(&[equal("w", "b")], &pattern);

    assert_eq!(placement.unplaced(), [equal("w", "b")]);
    assert_snapshot!(placement, @r"
    (filter (= ?w <http://example.com/b>)
      (bgp (?x <http://example.com/p> ?y)))
    ");
}

#[test]
fn test_filters_ready_together_keep_their_order() {
    let placement = FilterPlacement::new(false).place_bgp(
        &[equal("y", "b"), equal("z", "c"), equal("x", "a")],
        &two_step_pattern(),
    );

    assert_snapshot!(placement, @r"
    (sequence
      (filter (exprlist (= ?y <http://example.com/b>) (= ?x <http://example.com/a>))
        (bgp (?x <http://example.com/p> ?y)))
      (filter (= ?z <http://example.com/c>)
        (bgp (?y <http://example.com/q> ?z))))
    ");
}

#[test]
fn test_placement_into_sequence() {
    let graph = Op::Graph {
        name: NamedNodePattern::Variable(Variable::new_unchecked("g")),
        inner: Arc::new(bgp(&[("?x", "p", "?y")])),
    };
    let elements = vec![Arc::new(graph), Arc::new(bgp(&[("?y", "q", "?z")]))];

    let placement = FilterPlacement::new(false)
        .place_sequence(&[equal("z", "c"), equal("g", "g1")], &elements);

    assert_snapshot!(placement, @r"
    (sequence
      (filter (= ?g <http://example.com/g1>)
        (graph ?g
          (bgp (?x <http://example.com/p> ?y))))
      (filter (= ?z <http://example.com/c>)
        (bgp (?y <http://example.com/q> ?z))))
    ");
}

#[test]
fn test_build_filter_applies_everything_on_top() {
    let op = Arc::new(bgp(&[("?x", "p", "?y")]));

    let placement = FilterPlacement::build_filter(&[equal("x", "a"), equal("y", "b")], op);

    assert_eq!(placement.steps().len(), 1);
    assert_snapshot!(placement, @r"
    (filter (exprlist (= ?x <http://example.com/a>) (= ?y <http://example.com/b>))
      (bgp (?x <http://example.com/p> ?y)))
    ");
}
