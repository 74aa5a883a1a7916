use crate::test_utils::{
    bgp, binding, context, equal, evaluate, iri, quad, sorted, storage, unoptimized, var,
};
use rdf_cursor_algebra::{non_distinguished_variable, JoinClassifier, Op, OpExtension, Table};
use rdf_cursor_engine::error::QueryResult;
use rdf_cursor_engine::iter::{BoxedQueryIter, NullIter, QueryIterator};
use rdf_cursor_engine::{ExecutionContext, ExtensionEvaluator};
use rdf_cursor_model::{
    BlankNode, NamedNodePattern, PropertyPathExpression, TermPattern, TriplePattern,
};
use rdf_cursor_storage::MemQuadStorage;
use std::sync::Arc;

#[test]
fn test_linear_join_substitutes_left_bindings() {
    let left = bgp(&[("?x", "p", "?y")]);
    let right = bgp(&[("?y", "q", "?z")]);
    assert!(JoinClassifier::is_linear(&left, &right));

    let storage = storage(&[("a", "p", "b"), ("b", "q", "c")]);
    let op = Op::join(left, right);
    let results = evaluate(&op, context(storage).with_options(unoptimized()));

    assert_eq!(results, vec![binding(&[("x", "a"), ("y", "b"), ("z", "c")])]);
}

#[test]
fn test_nested_union_equals_flat_disjunction() {
    let storage = storage(&[("a", "p", "1"), ("b", "p", "2"), ("c", "q", "3"), ("d", "r", "4")]);
    let a = Arc::new(bgp(&[("?s", "p", "?o")]));
    let b = Arc::new(bgp(&[("?s", "q", "?o")]));
    let c = Arc::new(bgp(&[("?s", "r", "?o")]));
    let ctx = || context(Arc::clone(&storage)).with_options(unoptimized());

    let nested = Op::union(Op::union(Arc::clone(&a), Arc::clone(&b)), Arc::clone(&c));
    let flat = Op::Disjunction(vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)]);

    let expected = [&a, &b, &c]
        .into_iter()
        .flat_map(|branch| evaluate(branch, ctx()))
        .collect::<Vec<_>>();
    assert_eq!(expected.len(), 4);
    assert_eq!(evaluate(&nested, ctx()), expected);
    assert_eq!(evaluate(&flat, ctx()), expected);
}

#[test]
fn test_union_evaluates_branches_per_input_binding() {
    let storage = storage(&[("a", "p", "1"), ("a", "q", "2"), ("b", "p", "3"), ("b", "q", "4")]);
    let table = Table::new(
        vec![var("s")],
        vec![binding(&[("s", "a")]), binding(&[("s", "b")])],
    );
    let union = Op::union(bgp(&[("?s", "p", "?o")]), bgp(&[("?s", "q", "?o")]));
    let op = Op::Sequence(vec![Arc::new(Op::Table(table)), Arc::new(union)]);

    let results = evaluate(&op, context(storage).with_options(unoptimized()));

    assert_eq!(
        results,
        vec![
            binding(&[("s", "a"), ("o", "1")]),
            binding(&[("s", "a"), ("o", "2")]),
            binding(&[("s", "b"), ("o", "3")]),
            binding(&[("s", "b"), ("o", "4")]),
        ]
    );
}

#[test]
fn test_filter_over_bgp() {
    let storage = storage(&[("a", "p", "b"), ("b", "q", "c"), ("x", "p", "y"), ("y", "q", "z")]);
    let op = Op::filter(
        vec![equal("y", "b")],
        bgp(&[("?x", "p", "?y"), ("?y", "q", "?z")]),
    );

    let results = evaluate(&op, context(storage));

    assert_eq!(results, vec![binding(&[("x", "a"), ("y", "b"), ("z", "c")])]);
}

#[test]
fn test_table_is_joined_with_non_root_input() {
    let storage = storage(&[("a", "p", "1"), ("b", "p", "3")]);
    let table = Table::new(
        vec![var("o"), var("t")],
        vec![
            binding(&[("o", "1"), ("t", "x")]),
            binding(&[("o", "2"), ("t", "y")]),
        ],
    );
    let op = Op::Sequence(vec![
        Arc::new(bgp(&[("?s", "p", "?o")])),
        Arc::new(Op::Table(table)),
    ]);

    let results = evaluate(&op, context(storage).with_options(unoptimized()));

    assert_eq!(results, vec![binding(&[("s", "a"), ("o", "1"), ("t", "x")])]);
}

fn graph_storage() -> Arc<MemQuadStorage> {
    Arc::new(MemQuadStorage::from_iter([
        quad("a", "p", "1", Some("g1")),
        quad("b", "p", "2", Some("g2")),
        quad("c", "p", "3", None),
    ]))
}

#[test]
fn test_graph_variable_iterates_named_graphs() {
    let op = Op::Graph {
        name: NamedNodePattern::Variable(var("g")),
        inner: Arc::new(bgp(&[("?s", "p", "?o")])),
    };

    let results = evaluate(&op, context(graph_storage()));

    assert_eq!(
        results,
        vec![
            binding(&[("g", "g1"), ("s", "a"), ("o", "1")]),
            binding(&[("g", "g2"), ("s", "b"), ("o", "2")]),
        ]
    );
}

#[test]
fn test_bound_graph_variable_restricts_graph() {
    let op = Op::Graph {
        name: NamedNodePattern::Variable(var("g")),
        inner: Arc::new(bgp(&[("?s", "p", "?o")])),
    };

    let ctx = context(graph_storage()).with_seed(binding(&[("g", "g2")]));
    let results = evaluate(&op, ctx);

    assert_eq!(results, vec![binding(&[("g", "g2"), ("s", "b"), ("o", "2")])]);
}

#[test]
fn test_graph_constant_and_default_graph() {
    let inner = Arc::new(bgp(&[("?s", "p", "?o")]));
    let op = Op::Graph {
        name: NamedNodePattern::NamedNode(iri("g2")),
        inner: Arc::clone(&inner),
    };
    assert_eq!(
        evaluate(&op, context(graph_storage())),
        vec![binding(&[("s", "b"), ("o", "2")])]
    );

    let unknown = Op::Graph {
        name: NamedNodePattern::NamedNode(iri("g3")),
        inner: Arc::clone(&inner),
    };
    assert!(evaluate(&unknown, context(graph_storage())).is_empty());

    assert_eq!(
        evaluate(&inner, context(graph_storage())),
        vec![binding(&[("s", "c"), ("o", "3")])]
    );
}

#[test]
fn test_one_or_more_path() {
    let storage = storage(&[("a", "p", "b"), ("b", "p", "c")]);
    let op = Op::Path {
        subject: TermPattern::Variable(var("x")),
        path: PropertyPathExpression::OneOrMore(Box::new(PropertyPathExpression::NamedNode(
            iri("p"),
        ))),
        object: TermPattern::Variable(var("y")),
    };

    let results = evaluate(&op, context(storage));

    assert_eq!(
        sorted(&results),
        sorted(&[
            binding(&[("x", "a"), ("y", "b")]),
            binding(&[("x", "a"), ("y", "c")]),
            binding(&[("x", "b"), ("y", "c")]),
        ])
    );
}

#[test]
fn test_zero_or_more_path_from_constant() {
    let storage = storage(&[("a", "p", "b"), ("b", "p", "c"), ("c", "p", "a")]);
    let op = Op::Path {
        subject: TermPattern::NamedNode(iri("a")),
        path: PropertyPathExpression::ZeroOrMore(Box::new(PropertyPathExpression::NamedNode(
            iri("p"),
        ))),
        object: TermPattern::Variable(var("y")),
    };

    let results = evaluate(&op, context(storage));

    assert_eq!(
        sorted(&results),
        sorted(&[
            binding(&[("y", "a")]),
            binding(&[("y", "b")]),
            binding(&[("y", "c")]),
        ])
    );
}

#[test]
fn test_seeded_projection_hides_outer_variables() {
    let storage = storage(&[("a", "p", "b"), ("c", "p", "d")]);
    let pattern = Arc::new(bgp(&[("?x", "p", "?y")]));
    let seed = binding(&[("x", "a")]);

    let correlated = Op::project(Arc::clone(&pattern), vec![var("x"), var("y")]);
    let results = evaluate(
        &correlated,
        context(Arc::clone(&storage)).with_seed(seed.clone()),
    );
    assert_eq!(results, vec![binding(&[("x", "a"), ("y", "b")])]);

    let hidden = Op::project(Arc::clone(&pattern), vec![var("y")]);
    let results = evaluate(&hidden, context(storage).with_seed(seed));
    assert_eq!(
        results,
        vec![
            binding(&[("x", "a"), ("y", "b")]),
            binding(&[("x", "a"), ("y", "d")]),
        ]
    );
}

#[test]
fn test_non_distinguished_variables_are_hidden() {
    let storage = storage(&[("a", "p", "b")]);
    let hidden = non_distinguished_variable(&BlankNode::new_unchecked("b0"));
    let op = Op::bgp([TriplePattern {
        subject: TermPattern::Variable(var("x")),
        predicate: NamedNodePattern::NamedNode(iri("p")),
        object: TermPattern::Variable(hidden.clone()),
    }]);

    let results = evaluate(&op, context(Arc::clone(&storage)));
    assert_eq!(results, vec![binding(&[("x", "a")])]);

    let options = unoptimized().with_hide_non_distinguished_variables(false);
    let results = evaluate(&op, context(storage).with_options(options));
    assert_eq!(results.len(), 1);
    assert!(results[0].contains(&hidden));
}

#[derive(Debug)]
struct Wrapped(Op);

impl OpExtension for Wrapped {
    fn name(&self) -> &str {
        "wrapped"
    }

    fn effective_op(&self) -> Option<&Op> {
        Some(&self.0)
    }
}

struct Discard;

impl ExtensionEvaluator for Discard {
    fn evaluate(
        &self,
        _extension: &Arc<dyn OpExtension>,
        mut input: BoxedQueryIter,
        _context: &Arc<ExecutionContext>,
    ) -> QueryResult<BoxedQueryIter> {
        input.close();
        Ok(Box::new(NullIter))
    }
}

#[test]
fn test_extension_uses_effective_op_or_evaluator() {
    let storage = storage(&[("a", "p", "b")]);
    let op = Op::Ext(Arc::new(Wrapped(bgp(&[("?x", "p", "?y")]))));

    let results = evaluate(&op, context(Arc::clone(&storage)));
    assert_eq!(results, vec![binding(&[("x", "a"), ("y", "b")])]);

    let ctx = context(storage).with_extension("wrapped", Arc::new(Discard));
    assert!(evaluate(&op, ctx).is_empty());
}
