use crate::context::ExecutionContext;
use crate::error::QueryResult;
use crate::iter::{BoxedQueryIter, NullIter, PlainIter, RepeatApplyIter};
use rdf_cursor_algebra::BasicPattern;
use rdf_cursor_model::{
    Binding, NamedNodePattern, Subject, Term, TermPattern, Triple, TriplePattern,
};
use std::sync::Arc;

/// Turns a basic graph pattern into bindings.
///
/// The generator receives the bindings produced so far and must treat their values as
/// constraints on the pattern (index join). It is invoked once per BGP node of the query and is
/// exchangeable per [ExecutionContext].
pub trait StageGenerator: Send + Sync {
    fn execute(
        &self,
        pattern: &BasicPattern,
        input: BoxedQueryIter,
        context: &Arc<ExecutionContext>,
    ) -> QueryResult<BoxedQueryIter>;
}

/// Evaluates a basic pattern one triple pattern after the other, substituting each binding of
/// the previous stage into the next triple pattern.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericStageGenerator;

impl StageGenerator for GenericStageGenerator {
    fn execute(
        &self,
        pattern: &BasicPattern,
        input: BoxedQueryIter,
        context: &Arc<ExecutionContext>,
    ) -> QueryResult<BoxedQueryIter> {
        let mut iter = input;
        for triple in pattern {
            let triple = triple.clone();
            let context = Arc::clone(context);
            iter = Box::new(RepeatApplyIter::new(iter, move |binding| {
                context.cancellation().check()?;
                match_triple_pattern(&triple, &binding, &context)
            }));
        }
        Ok(iter)
    }
}

/// Returns the extensions of `binding` that match `pattern` in the active graph.
pub fn match_triple_pattern(
    pattern: &TriplePattern,
    binding: &Binding,
    context: &ExecutionContext,
) -> QueryResult<BoxedQueryIter> {
    let subject = match substitute(&pattern.subject, binding) {
        Substituted::Bound(term) => match into_subject(term) {
            Some(subject) => Some(subject),
            None => return Ok(Box::new(NullIter)),
        },
        Substituted::Free => None,
    };
    let predicate = match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => Some(node.clone()),
        NamedNodePattern::Variable(variable) => match binding.get(variable) {
            Some(Term::NamedNode(node)) => Some(node.clone()),
            Some(_) => return Ok(Box::new(NullIter)),
            None => None,
        },
    };
    let object = match substitute(&pattern.object, binding) {
        Substituted::Bound(term) => Some(term),
        Substituted::Free => None,
    };

    let triples = context.storage().triples_for_pattern(
        context.active_graph(),
        subject.as_ref(),
        predicate.as_ref(),
        object.as_ref(),
    )?;

    let bindings = triples
        .into_iter()
        .filter_map(|triple| extend_binding(pattern, binding, triple))
        .collect::<Vec<_>>();
    Ok(Box::new(PlainIter::from_vec(bindings)))
}

enum Substituted {
    Bound(Term),
    Free,
}

fn substitute(pattern: &TermPattern, binding: &Binding) -> Substituted {
    match pattern {
        TermPattern::NamedNode(node) => Substituted::Bound(node.clone().into()),
        TermPattern::Literal(literal) => Substituted::Bound(literal.clone().into()),
        TermPattern::Variable(variable) => match binding.get(variable) {
            Some(term) => Substituted::Bound(term.clone()),
            None => Substituted::Free,
        },
        // Blank nodes have been replaced by variables. A remaining one matches anything.
        _ => Substituted::Free,
    }
}

pub(crate) fn into_subject(term: Term) -> Option<Subject> {
    match term {
        Term::NamedNode(node) => Some(node.into()),
        Term::BlankNode(node) => Some(node.into()),
        _ => None,
    }
}

/// Binds the free variables of `pattern` to the values of `triple`. Returns [None] if a variable
/// occurs twice in the pattern and the triple has different values at these positions.
fn extend_binding(pattern: &TriplePattern, binding: &Binding, triple: Triple) -> Option<Binding> {
    let mut builder = binding.child();
    if let TermPattern::Variable(variable) = &pattern.subject {
        if !binding.contains(variable) {
            builder.add(variable.clone(), triple.subject.into()).ok()?;
        }
    }
    if let NamedNodePattern::Variable(variable) = &pattern.predicate {
        if !binding.contains(variable) {
            builder
                .add(variable.clone(), triple.predicate.into())
                .ok()?;
        }
    }
    if let TermPattern::Variable(variable) = &pattern.object {
        if !binding.contains(variable) {
            builder.add(variable.clone(), triple.object).ok()?;
        }
    }
    Some(builder.build())
}
