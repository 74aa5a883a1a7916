//! Algebraic laws checked over small random datasets.

use crate::test_utils::{bgp, context, equal, evaluate, sorted, storage, unoptimized, var};
use proptest::prelude::*;
use rdf_cursor_algebra::Op;
use rdf_cursor_engine::QueryOptions;
use rdf_cursor_model::{AggregateExpression, Expression};
use rdf_cursor_storage::MemQuadStorage;
use std::sync::Arc;

type Triple = (&'static str, &'static str, &'static str);

fn dataset() -> impl Strategy<Value = Vec<Triple>> {
    let triple = (
        prop::sample::select(vec!["a", "b", "c"]),
        prop::sample::select(vec!["p", "q"]),
        prop::sample::select(vec!["a", "b", "c", "1"]),
    );
    prop::collection::vec(triple, 0..12)
}

fn evaluate_with(op: &Op, storage: &Arc<MemQuadStorage>, options: QueryOptions) -> Vec<String> {
    sorted(&evaluate(
        op,
        context(Arc::clone(storage)).with_options(options),
    ))
}

fn general() -> QueryOptions {
    unoptimized().with_index_join_strategy(false)
}

/// Joins `?x :p ?y` with `right` and returns the results of the linear, the general and the
/// optimized evaluation.
fn join_all_ways(
    storage: &Arc<MemQuadStorage>,
    right: Op,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let op = Op::join(bgp(&[("?x", "p", "?y")]), right);
    (
        evaluate_with(&op, storage, unoptimized()),
        evaluate_with(&op, storage, general()),
        evaluate_with(&op, storage, QueryOptions::default()),
    )
}

fn first_match() -> Op {
    Op::Slice {
        inner: Arc::new(Op::project(bgp(&[("?y", "q", "?z")]), vec![var("y"), var("z")])),
        start: 0,
        length: Some(1),
    }
}

fn match_count() -> Op {
    Op::Group {
        inner: Arc::new(bgp(&[("?y", "q", "?z")])),
        variables: vec![var("y")],
        aggregates: vec![(var("n"), AggregateExpression::CountSolutions { distinct: false })],
    }
}

proptest! {
    #[test]
    fn linear_join_with_filtered_right_side(triples in dataset()) {
        let right = Op::filter(vec![equal("z", "1")], bgp(&[("?y", "q", "?z")]));
        let (linear, general, optimized) = join_all_ways(&storage(&triples), right);
        prop_assert_eq!(&linear, &general);
        prop_assert_eq!(&optimized, &general);
    }

    #[test]
    fn linear_join_with_extended_right_side(triples in dataset()) {
        let right = Op::extend(
            bgp(&[("?y", "q", "?z")]),
            var("w"),
            Expression::Variable(var("z")),
        );
        let (linear, general, optimized) = join_all_ways(&storage(&triples), right);
        prop_assert_eq!(&linear, &general);
        prop_assert_eq!(&optimized, &general);
    }

    #[test]
    fn linear_join_with_union_right_side(triples in dataset()) {
        let right = Op::union(bgp(&[("?y", "q", "?z")]), bgp(&[("?y", "p", "?z")]));
        let (linear, general, optimized) = join_all_ways(&storage(&triples), right);
        prop_assert_eq!(&linear, &general);
        prop_assert_eq!(&optimized, &general);
    }

    #[test]
    fn join_with_filtered_slice(triples in dataset()) {
        let right = Op::filter(vec![Expression::Bound(var("z"))], first_match());
        let (linear, general, optimized) = join_all_ways(&storage(&triples), right);
        prop_assert_eq!(&linear, &general);
        prop_assert_eq!(&optimized, &general);
    }

    #[test]
    fn join_with_filtered_group(triples in dataset()) {
        let right = Op::filter(vec![Expression::Bound(var("n"))], match_count());
        let (linear, general, optimized) = join_all_ways(&storage(&triples), right);
        prop_assert_eq!(&linear, &general);
        prop_assert_eq!(&optimized, &general);
    }


    #[test]
    fn linear_join_equals_general_join(triples in dataset()) {
        let storage = storage(&triples);
        let op = Op::join(bgp(&[("?x", "p", "?y")]), bgp(&[("?y", "q", "?z")]));

        prop_assert_eq!(
            evaluate_with(&op, &storage, unoptimized()),
            evaluate_with(&op, &storage, general())
        );
    }

    #[test]
    fn linear_left_join_equals_general_left_join(triples in dataset()) {
        let storage = storage(&triples);
        let op = Op::left_join(
            bgp(&[("?x", "p", "?y")]),
            bgp(&[("?y", "q", "?z")]),
            vec![equal("z", "1")],
        );

        prop_assert_eq!(
            evaluate_with(&op, &storage, unoptimized()),
            evaluate_with(&op, &storage, general())
        );
    }

    #[test]
    fn join_is_commutative(triples in dataset()) {
        let storage = storage(&triples);
        let left = bgp(&[("?x", "p", "?y")]);
        let right = bgp(&[("?y", "q", "?z")]);

        prop_assert_eq!(
            evaluate_with(&Op::join(left.clone(), right.clone()), &storage, general()),
            evaluate_with(&Op::join(right, left), &storage, general())
        );
    }

    #[test]
    fn filter_placement_is_transparent(triples in dataset()) {
        let storage = storage(&triples);
        let op = Op::filter(
            vec![equal("y", "b"), equal("z", "1")],
            bgp(&[("?x", "p", "?y"), ("?y", "q", "?z")]),
        );

        prop_assert_eq!(
            evaluate_with(&op, &storage, QueryOptions::default().with_safe_filter_placement(true)),
            evaluate_with(&op, &storage, QueryOptions::default().with_safe_filter_placement(false))
        );
    }
}
