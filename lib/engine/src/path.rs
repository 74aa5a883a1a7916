//! Evaluation of property paths against the active graph.
//!
//! Paths are evaluated with set semantics: every pair of nodes connected by the path is produced
//! once, regardless of the number of connecting routes.

use crate::context::ExecutionContext;
use crate::error::QueryResult;
use crate::iter::{BoxedQueryIter, PlainIter};
use crate::stage::into_subject;
use rdf_cursor_model::{Binding, NamedNode, PropertyPathExpression, Term, TermPattern};
use rustc_hash::FxHashSet;

/// Evaluates the path `subject path object` for the bindings of `binding`.
pub fn evaluate_path(
    subject: &TermPattern,
    path: &PropertyPathExpression,
    object: &TermPattern,
    binding: &Binding,
    context: &ExecutionContext,
) -> QueryResult<BoxedQueryIter> {
    let evaluator = PathEvaluator { context };
    let subject_value = bound_value(subject, binding);
    let object_value = bound_value(object, binding);

    let bindings = match (subject_value, object_value) {
        (Some(start), Some(end)) => {
            if evaluator.eval_from(path, &start, false)?.contains(&end) {
                vec![binding.clone()]
            } else {
                Vec::new()
            }
        }
        (Some(start), None) => evaluator
            .eval_from(path, &start, false)?
            .into_iter()
            .filter_map(|end| bind(binding, object, end))
            .collect(),
        (None, Some(end)) => evaluator
            .eval_from(path, &end, true)?
            .into_iter()
            .filter_map(|start| bind(binding, subject, start))
            .collect(),
        (None, None) => evaluator
            .eval_all(path)?
            .into_iter()
            .filter_map(|(start, end)| {
                bind(binding, subject, start).and_then(|binding| bind(&binding, object, end))
            })
            .collect(),
    };
    Ok(Box::new(PlainIter::from_vec(bindings)))
}

fn bound_value(pattern: &TermPattern, binding: &Binding) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::Variable(variable) => binding.get(variable).cloned(),
        _ => None,
    }
}

/// Binds the variable of `pattern` to `value`. Returns [None] if the variable has another value.
fn bind(binding: &Binding, pattern: &TermPattern, value: Term) -> Option<Binding> {
    match pattern {
        TermPattern::Variable(variable) => binding.with(variable.clone(), value).ok(),
        _ => Some(binding.clone()),
    }
}

struct PathEvaluator<'context> {
    context: &'context ExecutionContext,
}

impl PathEvaluator<'_> {
    /// Returns the nodes reachable from `start`. If `reversed` is set, the path is followed
    /// backwards.
    fn eval_from(
        &self,
        path: &PropertyPathExpression,
        start: &Term,
        reversed: bool,
    ) -> QueryResult<Vec<Term>> {
        self.context.cancellation().check()?;
        match path {
            PropertyPathExpression::NamedNode(predicate) => {
                self.step(start, |p| p == predicate, Some(predicate), reversed)
            }
            PropertyPathExpression::Reverse(inner) => self.eval_from(inner, start, !reversed),
            PropertyPathExpression::Sequence(first, second) => {
                let (first, second) = if reversed {
                    (second, first)
                } else {
                    (first, second)
                };
                let mut result = NodeSet::default();
                for middle in self.eval_from(first, start, reversed)? {
                    result.extend(self.eval_from(second, &middle, reversed)?);
                }
                Ok(result.into_vec())
            }
            PropertyPathExpression::Alternative(lhs, rhs) => {
                let mut result = NodeSet::default();
                result.extend(self.eval_from(lhs, start, reversed)?);
                result.extend(self.eval_from(rhs, start, reversed)?);
                Ok(result.into_vec())
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                self.closure(inner, start, reversed, true)
            }
            PropertyPathExpression::OneOrMore(inner) => {
                self.closure(inner, start, reversed, false)
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                let mut result = NodeSet::default();
                result.insert(start.clone());
                result.extend(self.eval_from(inner, start, reversed)?);
                Ok(result.into_vec())
            }
            PropertyPathExpression::NegatedPropertySet(excluded) => {
                self.step(start, |p| !excluded.contains(p), None, reversed)
            }
        }
    }

    /// Returns all pairs of nodes connected by `path`.
    fn eval_all(&self, path: &PropertyPathExpression) -> QueryResult<Vec<(Term, Term)>> {
        if let PropertyPathExpression::NamedNode(predicate) = path {
            let triples = self.context.storage().triples_for_pattern(
                self.context.active_graph(),
                None,
                Some(predicate),
                None,
            )?;
            return Ok(triples
                .into_iter()
                .map(|triple| (triple.subject.into(), triple.object))
                .collect());
        }

        let mut result = Vec::new();
        for start in self.nodes()? {
            for end in self.eval_from(path, &start, false)? {
                result.push((start.clone(), end));
            }
        }
        Ok(result)
    }

    /// Follows one edge whose predicate satisfies `accept`.
    fn step(
        &self,
        node: &Term,
        accept: impl Fn(&NamedNode) -> bool,
        predicate: Option<&NamedNode>,
        reversed: bool,
    ) -> QueryResult<Vec<Term>> {
        let storage = self.context.storage();
        let active_graph = self.context.active_graph();
        let triples = if reversed {
            storage.triples_for_pattern(active_graph, None, predicate, Some(node))?
        } else {
            let Some(subject) = into_subject(node.clone()) else {
                return Ok(Vec::new());
            };
            storage.triples_for_pattern(active_graph, Some(&subject), predicate, None)?
        };

        let mut result = NodeSet::default();
        for triple in triples {
            if !accept(&triple.predicate) {
                continue;
            }
            if reversed {
                result.insert(triple.subject.into());
            } else {
                result.insert(triple.object);
            }
        }
        Ok(result.into_vec())
    }

    /// Computes the transitive closure of `path` from `start`.
    fn closure(
        &self,
        path: &PropertyPathExpression,
        start: &Term,
        reversed: bool,
        include_start: bool,
    ) -> QueryResult<Vec<Term>> {
        let mut result = NodeSet::default();
        if include_start {
            result.insert(start.clone());
        }

        let mut visited = FxHashSet::default();
        let mut frontier = vec![start.clone()];
        while let Some(node) = frontier.pop() {
            if !visited.insert(node.clone()) {
                continue;
            }
            for next in self.eval_from(path, &node, reversed)? {
                result.insert(next.clone());
                if !visited.contains(&next) {
                    frontier.push(next);
                }
            }
        }
        Ok(result.into_vec())
    }

    /// Returns every node that occurs as a subject or object in the active graph.
    fn nodes(&self) -> QueryResult<Vec<Term>> {
        let triples = self.context.storage().triples_for_pattern(
            self.context.active_graph(),
            None,
            None,
            None,
        )?;
        let mut result = NodeSet::default();
        for triple in triples {
            result.insert(triple.subject.into());
            result.insert(triple.object);
        }
        Ok(result.into_vec())
    }
}

/// A set of nodes that remembers the insertion order.
#[derive(Default)]
struct NodeSet {
    seen: FxHashSet<Term>,
    nodes: Vec<Term>,
}

impl NodeSet {
    fn insert(&mut self, node: Term) {
        if self.seen.insert(node.clone()) {
            self.nodes.push(node);
        }
    }

    fn extend(&mut self, nodes: impl IntoIterator<Item = Term>) {
        for node in nodes {
            self.insert(node);
        }
    }

    fn into_vec(self) -> Vec<Term> {
        self.nodes
    }
}
