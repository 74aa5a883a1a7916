//! API to access an in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
//!
//! The entry point of the module is the [`Store`] struct.
//!
//! Usage example:
//! ```
//! use rdf_cursor::model::*;
//! use rdf_cursor::results::QueryResults;
//! use rdf_cursor::store::Store;
//!
//! let store = Store::new();
//!
//! // insertion
//! let ex = NamedNode::new("http://example.com")?;
//! let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
//! store.insert(&quad)?;
//! assert!(store.contains(&quad)?);
//!
//! // SPARQL query
//! if let QueryResults::Solutions(mut solutions) = store.query("SELECT ?s WHERE { ?s ?p ?o }")? {
//!     assert_eq!(solutions.next().unwrap()?.get("s"), Some(&ex.into()));
//! };
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::{LoaderError, SerializerError};
use crate::explanation::QueryExplanation;
use crate::results::{QueryResults, QuerySolutionIter, QueryTripleIter};
use oxrdfio::{RdfParser, RdfSerializer};
use rdf_cursor_algebra::{AlgebraGenerator, Optimizer};
use rdf_cursor_common::error::StorageError;
use rdf_cursor_common::{ActiveGraph, QuadStorage};
use rdf_cursor_engine::error::QueryEvaluationError;
use rdf_cursor_engine::{compile, ExecutionContext, QueryOptions, ServiceHandler};
use rdf_cursor_model::{
    GraphName, GraphNameRef, GraphPattern, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef,
    Query, QueryDataset, Variable,
};
use rdf_cursor_storage::MemQuadStorage;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// An in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) store.
///
/// The store can be queried using [SPARQL](https://www.w3.org/TR/sparql11-query). Cloning a
/// store is cheap, the clones share the same quads.
///
/// Usage example:
/// ```
/// use rdf_cursor::model::*;
/// use rdf_cursor::results::QueryResults;
/// use rdf_cursor::store::Store;
///
/// let store = Store::new();
/// let ex = NamedNodeRef::new("http://example.com")?;
/// store.insert(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?;
///
/// if let QueryResults::Boolean(result) = store.query("ASK { ?s ?p ?o }")? {
///     assert!(result);
/// }
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default)]
pub struct Store {
    storage: Arc<MemQuadStorage>,
    service_handler: Option<Arc<dyn ServiceHandler>>,
    union_default_graph: bool,
}

impl Store {
    /// Creates an empty [Store] with a [MemQuadStorage] as backing storage.
    pub fn new() -> Store {
        Self::default()
    }

    /// Sets the handler that evaluates `SERVICE` patterns. Without a handler, queries with a
    /// non-silent `SERVICE` fail.
    #[must_use]
    pub fn with_service_handler(mut self, service_handler: Arc<dyn ServiceHandler>) -> Self {
        self.service_handler = Some(service_handler);
        self
    }

    /// If enabled, the default graph of queries without a `FROM` clause is the union of all
    /// graphs in the store.
    #[must_use]
    pub fn with_union_default_graph(mut self, union_default_graph: bool) -> Self {
        self.union_default_graph = union_default_graph;
        self
    }

    /// Returns a reference to the underlying storage.
    pub fn storage(&self) -> &Arc<MemQuadStorage> {
        &self.storage
    }

    /// Executes a [SPARQL](https://www.w3.org/TR/sparql11-query/) query.
    pub fn query(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryEvaluationError>>,
    ) -> Result<QueryResults, QueryEvaluationError> {
        self.query_opt(query, QueryOptions::default())
    }

    /// Executes a [SPARQL](https://www.w3.org/TR/sparql11-query/) query with some options.
    ///
    /// Usage example:
    /// ```
    /// use rdf_cursor::engine::QueryOptions;
    /// use rdf_cursor::model::*;
    /// use rdf_cursor::results::QueryResults;
    /// use rdf_cursor::store::Store;
    ///
    /// let store = Store::new();
    /// if let QueryResults::Solutions(mut solutions) = store.query_opt(
    ///     "SELECT (STR(1) AS ?nt) WHERE {}",
    ///     QueryOptions::default().with_optimize(false),
    /// )? {
    ///     assert_eq!(
    ///         solutions.next().unwrap()?.get("nt"),
    ///         Some(&Literal::from("1").into())
    ///     );
    /// }
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn query_opt(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryEvaluationError>>,
        options: QueryOptions,
    ) -> Result<QueryResults, QueryEvaluationError> {
        self.explain_query_opt(query, options)
            .map(|(results, _)| results)
    }

    /// Translates and optimizes a query without evaluating it.
    pub fn explain(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryEvaluationError>>,
        options: &QueryOptions,
    ) -> Result<QueryExplanation, QueryEvaluationError> {
        let query = query.try_into().map_err(Into::into)?;
        plan(query_pattern(&query), options)
    }

    /// Executes a query and returns the results together with an explanation of the evaluated
    /// algebra.
    pub fn explain_query_opt(
        &self,
        query: impl TryInto<Query, Error = impl Into<QueryEvaluationError>>,
        options: QueryOptions,
    ) -> Result<(QueryResults, QueryExplanation), QueryEvaluationError> {
        let query = query.try_into().map_err(Into::into)?;
        let explanation = plan(query_pattern(&query), &options)?;
        let context = Arc::new(self.execution_context(query_dataset(&query), options));

        let results = match &query {
            Query::Select { pattern, .. } => {
                QueryResults::Solutions(evaluate(&explanation, pattern, &context)?)
            }
            Query::Ask { .. } => {
                let mut solutions = compile(&explanation.optimized_op, Arc::clone(&context))?;
                let result = solutions.next().transpose()?.is_some();
                solutions.close();
                QueryResults::Boolean(result)
            }
            Query::Construct {
                template, pattern, ..
            } => QueryResults::Graph(QueryTripleIter::construct(
                template.clone(),
                evaluate(&explanation, pattern, &context)?,
            )),
            Query::Describe { pattern, .. } => QueryResults::Graph(QueryTripleIter::describe(
                Arc::clone(context.storage()),
                context.active_graph().clone(),
                evaluate(&explanation, pattern, &context)?,
            )),
        };
        Ok((results, explanation))
    }

    /// Loads an RDF file into the store.
    ///
    /// Blank nodes of the file are renamed such that loading the same file twice creates new
    /// blank nodes.
    ///
    /// Usage example:
    /// ```
    /// use rdf_cursor::io::RdfFormat;
    /// use rdf_cursor::model::*;
    /// use rdf_cursor::store::Store;
    ///
    /// let store = Store::new();
    /// let file = b"<http://example.com> <http://example.com> <http://example.com> <http://example.com/g> .";
    /// store.load_from_reader(RdfFormat::NQuads, file.as_ref())?;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, NamedNodeRef::new("http://example.com/g")?))?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn load_from_reader(
        &self,
        parser: impl Into<RdfParser>,
        reader: impl Read,
    ) -> Result<(), LoaderError> {
        let quads = parser
            .into()
            .rename_blank_nodes()
            .for_reader(reader)
            .collect::<Result<Vec<_>, _>>()?;
        self.storage.extend(quads)?;
        Ok(())
    }

    /// Adds a quad to this store.
    ///
    /// Returns `true` if the quad was not already in the store.
    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.storage.insert(quad.into())
    }

    /// Adds a set of quads to this store.
    pub fn extend(
        &self,
        quads: impl IntoIterator<Item = impl Into<Quad>>,
    ) -> Result<(), StorageError> {
        let quads = quads.into_iter().map(Into::into).collect::<Vec<_>>();
        self.storage.extend(quads)?;
        Ok(())
    }

    /// Removes a quad from this store.
    ///
    /// Returns `true` if the quad was in the store and has been removed.
    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.storage.remove(quad.into())
    }

    /// Checks if this store contains a given quad.
    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        let quad = quad.into();
        let triples = self.storage.triples_for_pattern(
            &ActiveGraph::single(quad.graph_name.into_owned()),
            Some(&quad.subject.into_owned()),
            Some(&quad.predicate.into_owned()),
            Some(&quad.object.into_owned()),
        )?;
        Ok(!triples.is_empty())
    }

    /// Returns the number of quads in the store.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.storage.len()
    }

    /// Returns whether the store contains no quads.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Returns all the named graphs of the store.
    pub fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        self.storage.named_graphs()
    }

    /// Adds an empty named graph to the store.
    ///
    /// Returns `true` if the graph was not already in the store.
    pub fn insert_named_graph<'a>(&self, graph_name: impl Into<NamedOrBlankNodeRef<'a>>) -> bool {
        self.storage.insert_named_graph(graph_name.into())
    }

    /// Clears a graph from this store.
    pub fn clear_graph<'a>(&self, graph_name: impl Into<GraphNameRef<'a>>) {
        self.storage.clear_graph(graph_name.into());
    }

    /// Removes all quads and named graphs of the store.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Dumps the store into a file. The format must support datasets.
    ///
    /// ```
    /// use rdf_cursor::io::RdfFormat;
    /// use rdf_cursor::store::Store;
    ///
    /// let file =
    ///     "<http://example.com> <http://example.com> <http://example.com> <http://example.com> .\n"
    ///         .as_bytes();
    ///
    /// let store = Store::new();
    /// store.load_from_reader(RdfFormat::NQuads, file)?;
    ///
    /// let buffer = store.dump_to_writer(RdfFormat::NQuads, Vec::new())?;
    /// assert_eq!(file, buffer.as_slice());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn dump_to_writer<W: Write>(
        &self,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let serializer = serializer.into();
        if !serializer.format().supports_datasets() {
            return Err(SerializerError::DatasetFormatExpected(serializer.format()));
        }

        let mut writer = serializer.for_writer(writer);
        let graphs = std::iter::once(GraphName::DefaultGraph)
            .chain(self.storage.named_graphs()?.into_iter().map(GraphName::from));
        for graph in graphs {
            for quad in self.storage.quads_for_graph(graph.as_ref())? {
                writer.serialize_quad(&quad)?;
            }
        }
        Ok(writer.finish()?)
    }

    /// Dumps a store graph into a file.
    pub fn dump_graph_to_writer<'a, W: Write>(
        &self,
        from_graph_name: impl Into<GraphNameRef<'a>>,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let mut writer = serializer.into().for_writer(writer);
        for quad in self.storage.quads_for_graph(from_graph_name.into())? {
            writer.serialize_triple(quad.as_ref())?;
        }
        Ok(writer.finish()?)
    }

    /// Builds the context of a query. `FROM` and `FROM NAMED` replace the default graph and the
    /// named graphs of the store.
    fn execution_context(
        &self,
        dataset: Option<&QueryDataset>,
        options: QueryOptions,
    ) -> ExecutionContext {
        // The algebra has already been optimized while planning.
        let options = QueryOptions {
            optimize: false,
            ..options
        };
        let storage = Arc::clone(&self.storage) as Arc<dyn QuadStorage>;
        let mut context = ExecutionContext::new(storage).with_options(options);

        match dataset {
            Some(dataset) => {
                let default = dataset.default.iter().cloned().map(GraphName::from);
                let named = dataset
                    .named
                    .iter()
                    .flatten()
                    .cloned()
                    .map(NamedOrBlankNode::from);
                context = context
                    .with_active_graph(ActiveGraph::Union(default.collect()))
                    .with_named_graphs(named.collect());
            }
            None if self.union_default_graph => {
                context = context.with_active_graph(ActiveGraph::AllGraphs);
            }
            None => {}
        }

        if let Some(service_handler) = &self.service_handler {
            context = context.with_service_handler(Arc::clone(service_handler));
        }
        context
    }
}

/// Translates and optimizes the pattern of a query.
fn plan(
    pattern: &GraphPattern,
    options: &QueryOptions,
) -> Result<QueryExplanation, QueryEvaluationError> {
    let start = Instant::now();
    let initial_op = AlgebraGenerator::new().translate(pattern)?;
    let optimized_op = if options.optimize {
        Optimizer::new(options.index_join_strategy).optimize(&initial_op)
    } else {
        initial_op.clone()
    };
    let planning_time = start.elapsed();
    debug!(?planning_time, "Planned query");

    Ok(QueryExplanation {
        planning_time,
        initial_op,
        optimized_op,
    })
}

fn evaluate(
    explanation: &QueryExplanation,
    pattern: &GraphPattern,
    context: &Arc<ExecutionContext>,
) -> Result<QuerySolutionIter, QueryEvaluationError> {
    let iter = compile(&explanation.optimized_op, Arc::clone(context))?;
    Ok(QuerySolutionIter::new(in_scope_variables(pattern), iter))
}

/// The variables of the solutions in the order in which they are projected.
fn in_scope_variables(pattern: &GraphPattern) -> Arc<[Variable]> {
    let mut variables = Vec::<Variable>::new();
    pattern.on_in_scope_variable(|variable| {
        if !variables.contains(variable) {
            variables.push(variable.clone());
        }
    });
    variables.into()
}

fn query_pattern(query: &Query) -> &GraphPattern {
    match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => pattern,
    }
}

fn query_dataset(query: &Query) -> Option<&QueryDataset> {
    match query {
        Query::Select { dataset, .. }
        | Query::Construct { dataset, .. }
        | Query::Describe { dataset, .. }
        | Query::Ask { dataset, .. } => dataset.as_ref(),
    }
}
