use rdf_cursor_algebra::Op;
use rdf_cursor_model::{NamedNode, NamedNodePattern, TermPattern, TriplePattern, Variable};

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
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
