use crate::error::{QueryEvaluationError, QueryResult};
use crate::iter::BoxedQueryIter;
use crate::options::QueryOptions;
use crate::stage::{GenericStageGenerator, StageGenerator};
use rdf_cursor_algebra::{Op, OpExtension};
use rdf_cursor_common::{ActiveGraph, QuadStorage};
use rdf_cursor_model::{Binding, NamedNode, NamedOrBlankNode};
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Evaluates `SERVICE` patterns.
pub trait ServiceHandler: Send + Sync {
    /// Evaluates `pattern` at the service `service_name` for the solution `input`. The returned
    /// bindings are joined with `input` by the caller.
    fn handle(
        &self,
        service_name: &NamedNode,
        pattern: &Arc<Op>,
        input: &Binding,
    ) -> Result<Vec<Binding>, Box<dyn Error + Send + Sync>>;
}

/// Evaluates extension nodes ([Op::Ext]) registered under their name.
pub trait ExtensionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        extension: &Arc<dyn OpExtension>,
        input: BoxedQueryIter,
        context: &Arc<ExecutionContext>,
    ) -> QueryResult<BoxedQueryIter>;
}

/// A shared flag that aborts a running query.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns [QueryEvaluationError::Cancelled] if the query has been cancelled.
    pub fn check(&self) -> QueryResult<()> {
        if self.is_cancelled() {
            return Err(QueryEvaluationError::Cancelled);
        }
        Ok(())
    }
}

/// Everything the compiled iterators need to evaluate a query.
///
/// The context is constructed once before compilation and shared through an [Arc]. Operators
/// that change the active graph (`GRAPH`) derive a new context with
/// [ExecutionContext::with_active_graph].
#[derive(Clone)]
pub struct ExecutionContext {
    storage: Arc<dyn QuadStorage>,
    active_graph: ActiveGraph,
    named_graphs: Option<Vec<NamedOrBlankNode>>,
    options: QueryOptions,
    stage_generator: Arc<dyn StageGenerator>,
    service_handler: Option<Arc<dyn ServiceHandler>>,
    extensions: FxHashMap<String, Arc<dyn ExtensionEvaluator>>,
    seed: Binding,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Creates a context that evaluates against the default graph of `storage`.
    pub fn new(storage: Arc<dyn QuadStorage>) -> Self {
        Self {
            storage,
            active_graph: ActiveGraph::default(),
            named_graphs: None,
            options: QueryOptions::default(),
            stage_generator: Arc::new(GenericStageGenerator),
            service_handler: None,
            extensions: FxHashMap::default(),
            seed: Binding::root(),
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_active_graph(mut self, active_graph: ActiveGraph) -> Self {
        self.active_graph = active_graph;
        self
    }

    /// Restricts the graphs visible to `GRAPH ?g` patterns.
    #[must_use]
    pub fn with_named_graphs(mut self, named_graphs: Vec<NamedOrBlankNode>) -> Self {
        self.named_graphs = Some(named_graphs);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_stage_generator(mut self, stage_generator: Arc<dyn StageGenerator>) -> Self {
        self.stage_generator = stage_generator;
        self
    }

    #[must_use]
    pub fn with_service_handler(mut self, service_handler: Arc<dyn ServiceHandler>) -> Self {
        self.service_handler = Some(service_handler);
        self
    }

    #[must_use]
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        evaluator: Arc<dyn ExtensionEvaluator>,
    ) -> Self {
        self.extensions.insert(name.into(), evaluator);
        self
    }

    /// Sets the initial binding that is fed into the root of the query.
    #[must_use]
    pub fn with_seed(mut self, seed: Binding) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_cancellation_token(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn storage(&self) -> &Arc<dyn QuadStorage> {
        &self.storage
    }

    pub fn active_graph(&self) -> &ActiveGraph {
        &self.active_graph
    }

    /// Returns the named graphs that `GRAPH ?g` iterates over.
    pub fn named_graphs(&self) -> QueryResult<Vec<NamedOrBlankNode>> {
        match &self.named_graphs {
            Some(named_graphs) => Ok(named_graphs.clone()),
            None => Ok(self.storage.named_graphs()?),
        }
    }

    /// Returns whether `graph` is visible to `GRAPH` patterns.
    pub fn is_visible_named_graph(&self, graph: &NamedOrBlankNode) -> QueryResult<bool> {
        match &self.named_graphs {
            Some(named_graphs) => Ok(named_graphs.contains(graph)),
            None => Ok(self.storage.contains_named_graph(graph.as_ref())?),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn stage_generator(&self) -> &Arc<dyn StageGenerator> {
        &self.stage_generator
    }

    pub fn service_handler(&self) -> Option<&Arc<dyn ServiceHandler>> {
        self.service_handler.as_ref()
    }

    pub fn extension(&self, name: &str) -> Option<&Arc<dyn ExtensionEvaluator>> {
        self.extensions.get(name)
    }

    pub fn seed(&self) -> &Binding {
        &self.seed
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Debug for ExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("active_graph", &self.active_graph)
            .field("named_graphs", &self.named_graphs)
            .field("options", &self.options)
            .field("has_service_handler", &self.service_handler.is_some())
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .field("seed", &self.seed)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
