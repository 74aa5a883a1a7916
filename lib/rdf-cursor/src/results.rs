//! Results of SPARQL queries evaluated by a [`Store`](crate::store::Store).

use crate::error::SerializerError;
use oxrdfio::{RdfFormat, RdfSerializer};
use rdf_cursor_common::{ActiveGraph, QuadStorage};
use rdf_cursor_engine::error::QueryEvaluationError;
use rdf_cursor_engine::iter::BoxedQueryIter;
use rdf_cursor_model::{
    BlankNode, NamedNodePattern, Subject, Term, TermPattern, Triple, TriplePattern, Variable,
};
use rustc_hash::{FxHashMap, FxHashSet};
use sparesults::{QueryResultsFormat, QueryResultsSerializer};
use std::io::Write;
use std::sync::Arc;

pub use sparesults::QuerySolution;

/// Results of a [SPARQL query](https://www.w3.org/TR/sparql11-query/).
pub enum QueryResults {
    /// Results of a [SELECT](https://www.w3.org/TR/sparql11-query/#select) query.
    Solutions(QuerySolutionIter),
    /// Result of a [ASK](https://www.w3.org/TR/sparql11-query/#ask) query.
    Boolean(bool),
    /// Results of a [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct) or
    /// [DESCRIBE](https://www.w3.org/TR/sparql11-query/#describe) query.
    Graph(QueryTripleIter),
}

impl QueryResults {
    /// Writes the query results (solutions or boolean).
    ///
    /// This method fails if it is called on the `Graph` results.
    pub fn write<W: Write>(
        self,
        writer: W,
        format: QueryResultsFormat,
    ) -> Result<W, SerializerError> {
        let serializer = QueryResultsSerializer::from_format(format);
        match self {
            Self::Boolean(value) => Ok(serializer.serialize_boolean_to_writer(writer, value)?),
            Self::Solutions(solutions) => {
                let mut serializer = serializer
                    .serialize_solutions_to_writer(writer, solutions.variables().to_vec())?;
                for solution in solutions {
                    serializer.serialize(&solution?)?;
                }
                Ok(serializer.finish()?)
            }
            Self::Graph(_) => Err(SerializerError::UnsupportedResultKind("graph")),
        }
    }

    /// Writes the graph query results.
    ///
    /// This method fails if it is called on the `Solution` or `Boolean` results.
    pub fn write_graph<W: Write>(
        self,
        writer: W,
        format: impl Into<RdfFormat>,
    ) -> Result<W, SerializerError> {
        let Self::Graph(triples) = self else {
            return Err(SerializerError::UnsupportedResultKind("non-graph"));
        };

        let mut serializer = RdfSerializer::from_format(format.into()).for_writer(writer);
        for triple in triples {
            serializer.serialize_triple(&triple?)?;
        }
        Ok(serializer.finish()?)
    }
}

/// An iterator over [`QuerySolution`]s.
///
/// The underlying iterator tree is closed once the iterator is exhausted or dropped.
pub struct QuerySolutionIter {
    variables: Arc<[Variable]>,
    inner: BoxedQueryIter,
    done: bool,
}

impl QuerySolutionIter {
    pub fn new(variables: Arc<[Variable]>, inner: BoxedQueryIter) -> Self {
        Self {
            variables,
            inner,
            done: false,
        }
    }

    /// The variables used in the solutions.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.inner.close();
        }
    }
}

impl Iterator for QuerySolutionIter {
    type Item = Result<QuerySolution, QueryEvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.inner.next() {
            Some(Ok(binding)) => {
                let values = self
                    .variables
                    .iter()
                    .map(|variable| binding.get(variable).cloned())
                    .collect::<Vec<_>>();
                Some(Ok((Arc::clone(&self.variables), values).into()))
            }
            Some(Err(error)) => {
                self.finish();
                Some(Err(error))
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl Drop for QuerySolutionIter {
    fn drop(&mut self) {
        self.finish();
    }
}

/// An iterator over the triples that compose a graph solution.
///
/// Each triple is returned at most once.
pub struct QueryTripleIter {
    inner: QuerySolutionIter,
    producer: TripleProducer,
    buffer: Vec<Triple>,
    emitted: FxHashSet<Triple>,
}

enum TripleProducer {
    /// Instantiates a `CONSTRUCT` template for every solution.
    Construct(Vec<TriplePattern>),
    /// Returns the triples whose subject is a resource bound in a solution.
    Describe {
        storage: Arc<dyn QuadStorage>,
        active_graph: ActiveGraph,
        described: FxHashSet<Subject>,
    },
}

impl QueryTripleIter {
    pub(crate) fn construct(template: Vec<TriplePattern>, inner: QuerySolutionIter) -> Self {
        Self::new(inner, TripleProducer::Construct(template))
    }

    pub(crate) fn describe(
        storage: Arc<dyn QuadStorage>,
        active_graph: ActiveGraph,
        inner: QuerySolutionIter,
    ) -> Self {
        Self::new(
            inner,
            TripleProducer::Describe {
                storage,
                active_graph,
                described: FxHashSet::default(),
            },
        )
    }

    fn new(inner: QuerySolutionIter, producer: TripleProducer) -> Self {
        Self {
            inner,
            producer,
            buffer: Vec::new(),
            emitted: FxHashSet::default(),
        }
    }

    fn produce(&mut self, solution: &QuerySolution) -> Result<(), QueryEvaluationError> {
        match &mut self.producer {
            TripleProducer::Construct(template) => {
                // Blank nodes of the template are fresh for every solution.
                let mut bnodes = FxHashMap::default();
                for pattern in template.iter() {
                    if let Some(triple) = instantiate(pattern, solution, &mut bnodes) {
                        self.buffer.push(triple);
                    }
                }
            }
            TripleProducer::Describe {
                storage,
                active_graph,
                described,
            } => {
                for term in solution.values().iter().flatten() {
                    let subject = match term {
                        Term::NamedNode(node) => Subject::NamedNode(node.clone()),
                        Term::BlankNode(node) => Subject::BlankNode(node.clone()),
                        Term::Literal(_) => continue,
                    };
                    if described.insert(subject.clone()) {
                        let triples =
                            storage.triples_for_pattern(active_graph, Some(&subject), None, None)?;
                        self.buffer.extend(triples);
                    }
                }
            }
        }
        // The buffer is consumed from the back.
        self.buffer.reverse();
        Ok(())
    }
}

impl Iterator for QueryTripleIter {
    type Item = Result<Triple, QueryEvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(triple) = self.buffer.pop() {
                if self.emitted.insert(triple.clone()) {
                    return Some(Ok(triple));
                }
            }

            let solution = match self.inner.next()? {
                Ok(solution) => solution,
                Err(error) => return Some(Err(error)),
            };
            if let Err(error) = self.produce(&solution) {
                return Some(Err(error));
            }
        }
    }
}

fn instantiate(
    pattern: &TriplePattern,
    solution: &QuerySolution,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Triple> {
    let subject = match instantiate_term(&pattern.subject, solution, bnodes)? {
        Term::NamedNode(node) => Subject::NamedNode(node),
        Term::BlankNode(node) => Subject::BlankNode(node),
        Term::Literal(_) => return None,
    };
    let predicate = match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => node.clone(),
        NamedNodePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => node.clone(),
            _ => return None,
        },
    };
    let object = instantiate_term(&pattern.object, solution, bnodes)?;
    Some(Triple::new(subject, predicate, object))
}

fn instantiate_term(
    pattern: &TermPattern,
    solution: &QuerySolution,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::BlankNode(node) => Some(bnodes.entry(node.clone()).or_default().clone().into()),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
    }
}
