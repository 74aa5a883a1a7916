use crate::context::ExecutionContext;
use crate::error::{QueryEvaluationError, QueryResult};
use crate::expr::{compile_order, AggregateSpec, Expr};
use crate::filter_placement::{FilterPlacement, Placement};
use crate::iter::{
    AssignIter, BoxedQueryIter, ConcatIter, DiffIter, DistinctIter, FilterIter, GroupIter,
    GroupSpec, JoinIter, LeftJoinIter, MinusIter, NullIter, OptionalIndexIter, PlainIter,
    ProjectIter, ProjectMergeIter, ReducedIter, RepeatApplyIter, RootIter, SingletonIter,
    SliceIter, SortCondition, SortIter,
};
use crate::path::evaluate_path;
use rdf_cursor_algebra::{JoinClassifier, LeftJoinClassifier, Op, Optimizer, VarFinder};
use rdf_cursor_common::ActiveGraph;
use rdf_cursor_model::{
    Binding, Expression, GraphName, NamedNode, NamedNodePattern, NamedOrBlankNode, Term,
    Variable,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Compiles `op` into an iterator of solutions. This is the entry point of query evaluation.
///
/// Unsupported operators and functions are reported before any solution is produced. If
/// enabled, the algebra is optimized first, and the variables introduced for blank nodes are
/// removed from the results.
pub fn compile(op: &Op, context: Arc<ExecutionContext>) -> QueryResult<BoxedQueryIter> {
    validate(op, &context)?;

    let options = context.options();
    let op = if options.optimize {
        Optimizer::new(options.index_join_strategy).optimize(op)
    } else {
        op.clone()
    };
    debug!(%op, "Compiling query");

    let input: BoxedQueryIter = if context.seed().is_empty() {
        Box::new(RootIter::new())
    } else {
        Box::new(SingletonIter::new(context.seed().clone()))
    };
    let hide_non_distinguished = options.hide_non_distinguished_variables;
    let iter = OpCompiler::new(context).compile_op(&Arc::new(op), input)?;

    if hide_non_distinguished {
        Ok(Box::new(ProjectIter::hide_non_distinguished(iter)))
    } else {
        Ok(iter)
    }
}

/// Builds the iterator pipeline of an algebra tree.
///
/// Every operator is compiled against the iterator that produces its input bindings. The
/// resulting iterator produces the bindings of the operator, each extending an input binding.
#[derive(Debug, Clone)]
pub struct OpCompiler {
    context: Arc<ExecutionContext>,
}

impl OpCompiler {
    pub fn new(context: Arc<ExecutionContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    pub fn compile_op(&self, op: &Arc<Op>, input: BoxedQueryIter) -> QueryResult<BoxedQueryIter> {
        trace!(op = op.name(), "Compiling operator");
        match op.as_ref() {
            Op::Bgp(pattern) => {
                if pattern.is_empty() {
                    return Ok(input);
                }
                self.context
                    .stage_generator()
                    .execute(pattern, input, &self.context)
            }
            Op::Join { left, right } => self.compile_join(left, right, input),
            Op::LeftJoin {
                left,
                right,
                expressions,
            } => self.compile_left_join(left, right, expressions, input),
            Op::Conditional { left, right } => {
                let left = self.compile_op(left, input)?;
                Ok(self.optional_index(left, right, Vec::new()))
            }
            Op::Sequence(elements) => elements
                .iter()
                .try_fold(input, |input, element| self.compile_op(element, input)),
            Op::Union { .. } | Op::Disjunction(_) => {
                let mut branches = Vec::new();
                flatten_union(op, &mut branches);
                self.compile_union(branches, input)
            }
            Op::Diff { left, right } => {
                let left = self.compile_op(left, input)?;
                let right = self.compile_op(right, root())?;
                Ok(Box::new(DiffIter::new(left, right, Arc::clone(&self.context))))
            }
            Op::Minus { left, right } => {
                let left_vars = VarFinder::classify(left).visible();
                let right_vars = VarFinder::classify(right).visible();
                let mut shared = left_vars
                    .intersection(&right_vars)
                    .cloned()
                    .collect::<Vec<_>>();
                shared.sort_unstable_by(|lhs, rhs| lhs.as_str().cmp(rhs.as_str()));

                let left = self.compile_op(left, input)?;
                let right = self.compile_op(right, root())?;
                Ok(Box::new(MinusIter::new(
                    left,
                    right,
                    shared,
                    Arc::clone(&self.context),
                )))
            }
            Op::Filter { expressions, inner } => self.compile_filter(expressions, inner, input),
            Op::Graph { name, inner } => self.compile_graph(name, inner, input),
            Op::Service {
                name,
                inner,
                silent,
            } => Ok(self.compile_service(name, inner, *silent, input)),
            Op::DatasetNames(_) => {
                QueryEvaluationError::not_implemented("Evaluation of dataset names")
            }
            Op::Table(table) => {
                if table.is_unit() {
                    return Ok(input);
                }
                let rows = Box::new(PlainIter::new(Arc::clone(table.rows())));
                if input.is_root() {
                    close(input);
                    return Ok(rows);
                }
                Ok(Box::new(JoinIter::new(
                    input,
                    rows,
                    Arc::clone(&self.context),
                )))
            }
            Op::Null => {
                close(input);
                Ok(Box::new(NullIter))
            }
            Op::List(inner) | Op::Label { inner, .. } => self.compile_op(inner, input),
            Op::Order { inner, conditions } => {
                let conditions = conditions
                    .iter()
                    .map(|condition| {
                        let (expression, ascending) = compile_order(condition)?;
                        Ok(SortCondition {
                            expression,
                            ascending,
                        })
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(SortIter::new(
                    inner,
                    conditions,
                    Arc::clone(&self.context),
                )))
            }
            Op::Project { inner, variables } => self.compile_project(inner, variables, input),
            Op::Distinct(inner) => {
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(DistinctIter::new(inner, Arc::clone(&self.context))))
            }
            Op::Reduced(inner) => {
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(ReducedIter::new(inner)))
            }
            Op::Slice {
                inner,
                start,
                length,
            } => {
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(SliceIter::new(inner, *start, *length)))
            }
            Op::Group {
                inner,
                variables,
                aggregates,
            } => {
                let aggregates = aggregates
                    .iter()
                    .map(|(variable, aggregate)| AggregateSpec::compile(variable, aggregate))
                    .collect::<QueryResult<Vec<_>>>()?;
                let spec = GroupSpec {
                    variables: variables.clone(),
                    aggregates,
                };
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(GroupIter::new(
                    inner,
                    spec,
                    Arc::clone(&self.context),
                )))
            }
            Op::Assign { inner, assignments } | Op::Extend { inner, assignments } => {
                let assignments = assignments
                    .iter()
                    .map(|(variable, expression)| Ok((variable.clone(), Expr::compile(expression)?)))
                    .collect::<QueryResult<Vec<_>>>()?;
                let inner = self.compile_op(inner, input)?;
                Ok(Box::new(AssignIter::new(
                    inner,
                    assignments,
                    Arc::clone(&self.context),
                )))
            }
            Op::Path {
                subject,
                path,
                object,
            } => {
                let (subject, path, object) = (subject.clone(), path.clone(), object.clone());
                let context = Arc::clone(&self.context);
                Ok(Box::new(RepeatApplyIter::new(input, move |binding| {
                    evaluate_path(&subject, &path, &object, &binding, &context)
                })))
            }
            Op::Ext(extension) => {
                if let Some(evaluator) = self.context.extension(extension.name()) {
                    return evaluator.evaluate(extension, input, &self.context);
                }
                match extension.effective_op() {
                    Some(effective) => self.compile_op(&Arc::new(effective.clone()), input),
                    None => QueryEvaluationError::not_implemented(format!(
                        "Extension {}",
                        extension.name()
                    )),
                }
            }
        }
    }

    fn compile_join(
        &self,
        left: &Arc<Op>,
        right: &Arc<Op>,
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        if self.context.options().index_join_strategy && JoinClassifier::is_linear(left, right) {
            let left = self.compile_op(left, input)?;
            return self.compile_op(right, left);
        }

        let left = self.compile_op(left, input)?;
        let right = self.compile_op(right, root())?;
        Ok(Box::new(JoinIter::new(
            left,
            right,
            Arc::clone(&self.context),
        )))
    }

    fn compile_left_join(
        &self,
        left: &Arc<Op>,
        right: &Arc<Op>,
        expressions: &[Expression],
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        let guards = compile_expressions(expressions)?;
        if self.context.options().index_join_strategy && LeftJoinClassifier::is_linear(left, right)
        {
            let left = self.compile_op(left, input)?;
            return Ok(self.optional_index(left, right, guards));
        }

        let left = self.compile_op(left, input)?;
        let right = self.compile_op(right, root())?;
        Ok(Box::new(LeftJoinIter::new(
            left,
            right,
            guards,
            Arc::clone(&self.context),
        )))
    }

    /// Evaluates `right` once per left binding, with the left binding as input.
    fn optional_index(
        &self,
        left: BoxedQueryIter,
        right: &Arc<Op>,
        guards: Vec<Expr>,
    ) -> BoxedQueryIter {
        let compiler = self.clone();
        let right = Arc::clone(right);
        Box::new(OptionalIndexIter::new(
            left,
            move |binding: &Binding| {
                compiler.compile_op(&right, Box::new(SingletonIter::new(binding.clone())))
            },
            guards,
            Arc::clone(&self.context),
        ))
    }

    /// Every branch is evaluated with the same input binding. The results of a binding are
    /// produced branch by branch.
    fn compile_union(
        &self,
        branches: Vec<Arc<Op>>,
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        if input.is_root() {
            close(input);
            let iterators = branches
                .iter()
                .map(|branch| self.compile_op(branch, root()))
                .collect::<QueryResult<Vec<_>>>()?;
            return Ok(Box::new(ConcatIter::new(iterators)));
        }

        let compiler = self.clone();
        Ok(Box::new(RepeatApplyIter::new(input, move |binding| {
            let iterators = branches
                .iter()
                .map(|branch| {
                    compiler.compile_op(branch, Box::new(SingletonIter::new(binding.clone())))
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(Box::new(ConcatIter::new(iterators)) as BoxedQueryIter)
        })))
    }

    fn compile_filter(
        &self,
        expressions: &[Expression],
        inner: &Arc<Op>,
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        let placement = FilterPlacement::new(self.context.options().safe_filter_placement);
        let placement = match inner.as_ref() {
            Op::Bgp(pattern) => placement.place_bgp(expressions, pattern),
            Op::Sequence(elements) => placement.place_sequence(expressions, elements),
            _ => FilterPlacement::build_filter(expressions, Arc::clone(inner)),
        };
        self.compile_placement(&placement, input)
    }

    fn compile_placement(
        &self,
        placement: &Placement,
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        let mut iter = input;
        for step in placement.steps() {
            iter = self.compile_op(&step.op, iter)?;
            iter = self.wrap_filters(iter, &step.filters)?;
        }
        self.wrap_filters(iter, placement.unplaced())
    }

    fn wrap_filters(
        &self,
        input: BoxedQueryIter,
        expressions: &[Expression],
    ) -> QueryResult<BoxedQueryIter> {
        let mut iter = input;
        for expression in expressions {
            let expression = Expr::compile(expression)?;
            iter = Box::new(FilterIter::new(
                iter,
                expression,
                Arc::clone(&self.context),
            ));
        }
        Ok(iter)
    }

    fn compile_graph(
        &self,
        name: &NamedNodePattern,
        inner: &Arc<Op>,
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        match name {
            NamedNodePattern::NamedNode(graph) => {
                let graph = NamedOrBlankNode::from(graph.clone());
                if !self.context.is_visible_named_graph(&graph)? {
                    close(input);
                    return Ok(Box::new(NullIter));
                }
                self.in_graph(graph).compile_op(inner, input)
            }
            NamedNodePattern::Variable(variable) => {
                let compiler = self.clone();
                let variable = variable.clone();
                let inner = Arc::clone(inner);
                Ok(Box::new(RepeatApplyIter::new(input, move |binding| {
                    compiler.graph_variable(&variable, &inner, &binding)
                })))
            }
        }
    }

    /// Evaluates `inner` in every visible named graph that `variable` may be bound to.
    fn graph_variable(
        &self,
        variable: &Variable,
        inner: &Arc<Op>,
        binding: &Binding,
    ) -> QueryResult<BoxedQueryIter> {
        let graphs = match binding.get(variable) {
            Some(Term::NamedNode(node)) => vec![NamedOrBlankNode::from(node.clone())],
            Some(Term::BlankNode(node)) => vec![NamedOrBlankNode::from(node.clone())],
            Some(_) => return Ok(Box::new(NullIter)),
            None => self.context.named_graphs()?,
        };

        let mut iterators = Vec::with_capacity(graphs.len());
        for graph in graphs {
            if binding.contains(variable) && !self.context.is_visible_named_graph(&graph)? {
                continue;
            }
            let Ok(graph_binding) = binding.with(variable.clone(), Term::from(graph.clone()))
            else {
                continue;
            };
            let input = Box::new(SingletonIter::new(graph_binding));
            iterators.push(self.in_graph(graph).compile_op(inner, input)?);
        }
        Ok(Box::new(ConcatIter::new(iterators)))
    }

    fn in_graph(&self, graph: NamedOrBlankNode) -> OpCompiler {
        let context = self
            .context
            .as_ref()
            .clone()
            .with_active_graph(ActiveGraph::single(GraphName::from(graph)));
        OpCompiler::new(Arc::new(context))
    }

    fn compile_project(
        &self,
        inner: &Arc<Op>,
        variables: &[Variable],
        input: BoxedQueryIter,
    ) -> QueryResult<BoxedQueryIter> {
        if input.is_root() {
            let inner = self.compile_op(inner, input)?;
            return Ok(Box::new(ProjectIter::new(inner, variables.to_vec())));
        }

        // Nested projections keep the outer variables.
        let compiler = self.clone();
        let inner = Arc::clone(inner);
        Ok(Box::new(ProjectMergeIter::new(
            input,
            variables.to_vec(),
            move |seed| compiler.compile_op(&inner, Box::new(SingletonIter::new(seed))),
        )))
    }

    fn compile_service(
        &self,
        name: &NamedNodePattern,
        inner: &Arc<Op>,
        silent: bool,
        input: BoxedQueryIter,
    ) -> BoxedQueryIter {
        let context = Arc::clone(&self.context);
        let name = name.clone();
        let inner = Arc::clone(inner);
        Box::new(RepeatApplyIter::new(input, move |binding| {
            let service = resolve_service_name(&name, &binding)?;
            let Some(handler) = context.service_handler() else {
                if silent {
                    warn!(%service, "No service handler, ignoring silent service");
                    return Ok(Box::new(SingletonIter::new(binding)) as BoxedQueryIter);
                }
                return Err(QueryEvaluationError::UnsupportedService(service));
            };

            match handler.handle(&service, &inner, &binding) {
                Ok(rows) => {
                    let rows = rows
                        .iter()
                        .filter_map(|row| binding.merge(row))
                        .collect::<Vec<_>>();
                    Ok(Box::new(PlainIter::from_vec(rows)) as BoxedQueryIter)
                }
                Err(error) if silent => {
                    warn!(%service, %error, "Ignoring failure of silent service");
                    Ok(Box::new(SingletonIter::new(binding)) as BoxedQueryIter)
                }
                Err(error) => Err(QueryEvaluationError::Service(error)),
            }
        }))
    }
}

fn resolve_service_name(name: &NamedNodePattern, binding: &Binding) -> QueryResult<NamedNode> {
    match name {
        NamedNodePattern::NamedNode(node) => Ok(node.clone()),
        NamedNodePattern::Variable(variable) => match binding.get(variable) {
            Some(Term::NamedNode(node)) => Ok(node.clone()),
            Some(term) => Err(QueryEvaluationError::InvalidServiceName(term.clone())),
            None => Err(QueryEvaluationError::UnboundService),
        },
    }
}

/// Collects the branches of nested unions and disjunctions in order.
fn flatten_union(op: &Arc<Op>, branches: &mut Vec<Arc<Op>>) {
    match op.as_ref() {
        Op::Union { left, right } => {
            flatten_union(left, branches);
            flatten_union(right, branches);
        }
        Op::Disjunction(elements) => {
            for element in elements {
                flatten_union(element, branches);
            }
        }
        _ => branches.push(Arc::clone(op)),
    }
}

fn compile_expressions(expressions: &[Expression]) -> QueryResult<Vec<Expr>> {
    expressions.iter().map(Expr::compile).collect()
}

fn root() -> BoxedQueryIter {
    Box::new(RootIter::new())
}

fn close(mut iter: BoxedQueryIter) {
    iter.close();
}

/// Checks that every operator and expression of `op` can be evaluated.
fn validate(op: &Op, context: &ExecutionContext) -> QueryResult<()> {
    match op {
        Op::DatasetNames(_) => {
            return QueryEvaluationError::not_implemented("Evaluation of dataset names")
        }
        Op::Ext(extension) => {
            if context.extension(extension.name()).is_some() {
                return Ok(());
            }
            return match extension.effective_op() {
                Some(effective) => validate(effective, context),
                None => QueryEvaluationError::not_implemented(format!(
                    "Extension {}",
                    extension.name()
                )),
            };
        }
        Op::LeftJoin { expressions, .. } | Op::Filter { expressions, .. } => {
            compile_expressions(expressions)?;
        }
        Op::Order { conditions, .. } => {
            for condition in conditions {
                compile_order(condition)?;
            }
        }
        Op::Group { aggregates, .. } => {
            for (variable, aggregate) in aggregates {
                AggregateSpec::compile(variable, aggregate)?;
            }
        }
        Op::Assign { assignments, .. } | Op::Extend { assignments, .. } => {
            for (_, expression) in assignments {
                Expr::compile(expression)?;
            }
        }
        _ => {}
    }

    op.children()
        .into_iter()
        .try_for_each(|child| validate(child, context))
}
