use rdf_cursor_algebra::Op;
use rdf_cursor_engine::iter::materialize;
use rdf_cursor_engine::{compile, ExecutionContext, QueryOptions};
use rdf_cursor_model::{
    Binding, Expression, GraphName, Literal, NamedNode, NamedNodePattern, Quad, Term,
    TermPattern, TriplePattern, Variable,
};
use rdf_cursor_storage::MemQuadStorage;
use std::sync::Arc;

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

/// Terms of the test data. Numbers become `xsd:integer` literals, everything else is an IRI in
/// the `http://example.com/` namespace.
pub fn data_term(value: &str) -> Term {
    match value.parse::<i64>() {
        Ok(number) => Literal::from(number).into(),
        Err(_) => iri(value).into(),
    }
}

/// Creates a triple pattern. Terms starting with `?` are variables, all others are IRIs in the
/// `http://example.com/` namespace.
pub fn triple(subject: &str, predicate: &str, object: &str) -> TriplePattern {
    TriplePattern {
        subject: term(subject),
        predicate: match var_or_iri(predicate) {
            Ok(v) => NamedNodePattern::Variable(v),
            Err(n) => NamedNodePattern::NamedNode(n),
        },
        object: term(object),
    }
}

pub fn bgp(triples: &[(&str, &str, &str)]) -> Op {
    Op::bgp(triples.iter().map(|(s, p, o)| triple(s, p, o)))
}

pub fn constant(value: &str) -> Expression {
    match value.parse::<i64>() {
        Ok(number) => Literal::from(number).into(),
        Err(_) => iri(value).into(),
    }
}

pub fn equal(variable: &str, value: &str) -> Expression {
    Expression::Equal(
        Box::new(Expression::Variable(var(variable))),
        Box::new(constant(value)),
    )
}

pub fn quad(subject: &str, predicate: &str, object: &str, graph: Option<&str>) -> Quad {
    Quad::new(
        iri(subject),
        iri(predicate),
        data_term(object),
        graph.map_or(GraphName::DefaultGraph, |graph| iri(graph).into()),
    )
}

/// Creates a storage with the given triples in the default graph.
pub fn storage(triples: &[(&str, &str, &str)]) -> Arc<MemQuadStorage> {
    Arc::new(
        triples
            .iter()
            .map(|(s, p, o)| quad(s, p, o, None))
            .collect(),
    )
}

pub fn context(storage: Arc<MemQuadStorage>) -> ExecutionContext {
    ExecutionContext::new(storage)
}

/// Options that compile the tree as given.
pub fn unoptimized() -> QueryOptions {
    QueryOptions::default().with_optimize(false)
}

pub fn evaluate(op: &Op, context: ExecutionContext) -> Vec<Binding> {
    let iter = compile(op, Arc::new(context)).unwrap();
    materialize(iter).unwrap()
}

pub fn binding(pairs: &[(&str, &str)]) -> Binding {
    let mut builder = Binding::builder();
    for (variable, value) in pairs {
        builder.add(var(variable), data_term(value)).unwrap();
    }
    builder.build()
}

/// The textual form of the bindings, sorted. Used to compare results as multisets.
pub fn sorted(bindings: &[Binding]) -> Vec<String> {
    let mut result = bindings.iter().map(ToString::to_string).collect::<Vec<_>>();
    result.sort();
    result
}

fn term(value: &str) -> TermPattern {
    match var_or_iri(value) {
        Ok(v) => TermPattern::Variable(v),
        Err(n) => TermPattern::NamedNode(n),
    }
}

fn var_or_iri(value: &str) -> Result<Variable, NamedNode> {
    match value.strip_prefix('?') {
        Some(name) => Ok(var(name)),
        None => Err(iri(value)),
    }
}
