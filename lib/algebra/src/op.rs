use rdf_cursor_model::{
    AggregateExpression, Binding, Expression, NamedNodePattern, OrderExpression,
    PropertyPathExpression, TermPattern, TriplePattern, Variable,
};
use std::fmt::Debug;
use std::sync::Arc;

/// A node of the algebra tree.
///
/// The tree is immutable. Children are shared via [Arc] such that rewriting a tree only allocates
/// the nodes that actually change.
#[derive(Debug, Clone)]
pub enum Op {
    /// A block of triple patterns that are matched together against the active graph.
    Bgp(BasicPattern),
    /// Inner join of two sub-trees.
    Join { left: Arc<Op>, right: Arc<Op> },
    /// Left join (OPTIONAL). The `expressions` are the conjuncts of the join condition.
    LeftJoin {
        left: Arc<Op>,
        right: Arc<Op>,
        expressions: Vec<Expression>,
    },
    /// Concatenation of the solutions of both sub-trees.
    Union { left: Arc<Op>, right: Arc<Op> },
    /// Removes all solutions of `left` that are compatible with a solution of `right`.
    Diff { left: Arc<Op>, right: Arc<Op> },
    /// SPARQL MINUS.
    Minus { left: Arc<Op>, right: Arc<Op> },
    /// Keeps the solutions for which all `expressions` evaluate to `true`.
    Filter {
        expressions: Vec<Expression>,
        inner: Arc<Op>,
    },
    /// Evaluates `inner` with the given graph as active graph.
    Graph {
        name: NamedNodePattern,
        inner: Arc<Op>,
    },
    /// Evaluates `inner` at a remote endpoint.
    Service {
        name: NamedNodePattern,
        inner: Arc<Op>,
        silent: bool,
    },
    /// Binds the names of the graphs in the dataset.
    DatasetNames(NamedNodePattern),
    /// A fixed set of solutions.
    Table(Table),
    /// Produces no solution.
    Null,
    /// Turns the solutions of `inner` into a list. A no-op at evaluation time.
    List(Arc<Op>),
    Order {
        inner: Arc<Op>,
        conditions: Vec<OrderExpression>,
    },
    Project {
        inner: Arc<Op>,
        variables: Vec<Variable>,
    },
    Distinct(Arc<Op>),
    Reduced(Arc<Op>),
    Slice {
        inner: Arc<Op>,
        start: usize,
        length: Option<usize>,
    },
    Group {
        inner: Arc<Op>,
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpression)>,
    },
    /// Binds variables to the results of expressions. Used for `LET`-style assignments.
    Assign {
        inner: Arc<Op>,
        assignments: Vec<(Variable, Expression)>,
    },
    /// Binds variables to the results of expressions (SPARQL `BIND`).
    Extend {
        inner: Arc<Op>,
        assignments: Vec<(Variable, Expression)>,
    },
    /// A property path between two terms.
    Path {
        subject: TermPattern,
        path: PropertyPathExpression,
        object: TermPattern,
    },
    /// Evaluates the elements one after the other, each one using the output of its predecessor
    /// as input.
    Sequence(Vec<Arc<Op>>),
    /// Concatenation of the solutions of all elements, each one evaluated with the same input.
    Disjunction(Vec<Arc<Op>>),
    /// A left join that is evaluated by substituting each left solution into `right`.
    Conditional { left: Arc<Op>, right: Arc<Op> },
    /// Attaches a label to `inner`. Labels do not change the semantics.
    Label { label: String, inner: Arc<Op> },
    /// An operator provided by an extension.
    Ext(Arc<dyn OpExtension>),
}

/// An operator that is not part of the core algebra.
///
/// An extension is either evaluated by an evaluator that has been registered for its
/// [OpExtension::name] or by compiling its [OpExtension::effective_op].
pub trait OpExtension: Debug + Send + Sync {
    /// The name under which an evaluator can be registered.
    fn name(&self) -> &str;

    /// The operator that has the same semantics as this extension, if there is one.
    fn effective_op(&self) -> Option<&Op> {
        None
    }
}

impl Op {
    pub fn bgp(triples: impl IntoIterator<Item = TriplePattern>) -> Self {
        Op::Bgp(BasicPattern::new(triples))
    }

    pub fn join(left: impl Into<Arc<Op>>, right: impl Into<Arc<Op>>) -> Self {
        Op::Join {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn left_join(
        left: impl Into<Arc<Op>>,
        right: impl Into<Arc<Op>>,
        expressions: Vec<Expression>,
    ) -> Self {
        Op::LeftJoin {
            left: left.into(),
            right: right.into(),
            expressions,
        }
    }

    pub fn union(left: impl Into<Arc<Op>>, right: impl Into<Arc<Op>>) -> Self {
        Op::Union {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn minus(left: impl Into<Arc<Op>>, right: impl Into<Arc<Op>>) -> Self {
        Op::Minus {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn diff(left: impl Into<Arc<Op>>, right: impl Into<Arc<Op>>) -> Self {
        Op::Diff {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Wraps `inner` in a filter. Filters directly on top of a filter are merged.
    pub fn filter(expressions: Vec<Expression>, inner: impl Into<Arc<Op>>) -> Self {
        let inner = inner.into();
        match inner.as_ref() {
            Op::Filter {
                expressions: existing,
                inner,
            } => Op::Filter {
                expressions: existing.iter().cloned().chain(expressions).collect(),
                inner: Arc::clone(inner),
            },
            _ => Op::Filter { expressions, inner },
        }
    }

    pub fn project(inner: impl Into<Arc<Op>>, variables: Vec<Variable>) -> Self {
        Op::Project {
            inner: inner.into(),
            variables,
        }
    }

    pub fn order(inner: impl Into<Arc<Op>>, conditions: Vec<OrderExpression>) -> Self {
        Op::Order {
            inner: inner.into(),
            conditions,
        }
    }

    pub fn extend(inner: impl Into<Arc<Op>>, variable: Variable, expression: Expression) -> Self {
        Op::Extend {
            inner: inner.into(),
            assignments: vec![(variable, expression)],
        }
    }

    /// Returns the operator that determines the semantics of this node. Labels and extensions
    /// that have an effective operator are transparent.
    pub fn effective(&self) -> &Op {
        let mut current = self;
        loop {
            current = match current {
                Op::Label { inner, .. } => inner.as_ref(),
                Op::Ext(ext) => match ext.effective_op() {
                    Some(op) => op,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// Returns whether this operator transforms the whole solution sequence of its input.
    pub fn is_solution_modifier(&self) -> bool {
        matches!(
            self,
            Op::Order { .. }
                | Op::Project { .. }
                | Op::Distinct(_)
                | Op::Reduced(_)
                | Op::Slice { .. }
                | Op::Group { .. }
                | Op::List(_)
        )
    }

    /// Returns whether this is the join identity, a table with a single empty solution.
    pub fn is_unit_table(&self) -> bool {
        matches!(self, Op::Table(table) if table.is_unit())
    }

    /// Creates a copy of this node whose children are replaced by the result of `f`. Extensions
    /// are opaque and returned unchanged.
    pub fn map_children(&self, mut f: impl FnMut(&Arc<Op>) -> Arc<Op>) -> Op {
        match self {
            Op::Join { left, right } => Op::Join {
                left: f(left),
                right: f(right),
            },
            Op::LeftJoin {
                left,
                right,
                expressions,
            } => Op::LeftJoin {
                left: f(left),
                right: f(right),
                expressions: expressions.clone(),
            },
            Op::Union { left, right } => Op::Union {
                left: f(left),
                right: f(right),
            },
            Op::Diff { left, right } => Op::Diff {
                left: f(left),
                right: f(right),
            },
            Op::Minus { left, right } => Op::Minus {
                left: f(left),
                right: f(right),
            },
            Op::Conditional { left, right } => Op::Conditional {
                left: f(left),
                right: f(right),
            },
            Op::Filter { expressions, inner } => Op::Filter {
                expressions: expressions.clone(),
                inner: f(inner),
            },
            Op::Graph { name, inner } => Op::Graph {
                name: name.clone(),
                inner: f(inner),
            },
            Op::Service {
                name,
                inner,
                silent,
            } => Op::Service {
                name: name.clone(),
                inner: f(inner),
                silent: *silent,
            },
            Op::List(inner) => Op::List(f(inner)),
            Op::Order { inner, conditions } => Op::Order {
                inner: f(inner),
                conditions: conditions.clone(),
            },
            Op::Project { inner, variables } => Op::Project {
                inner: f(inner),
                variables: variables.clone(),
            },
            Op::Distinct(inner) => Op::Distinct(f(inner)),
            Op::Reduced(inner) => Op::Reduced(f(inner)),
            Op::Slice {
                inner,
                start,
                length,
            } => Op::Slice {
                inner: f(inner),
                start: *start,
                length: *length,
            },
            Op::Group {
                inner,
                variables,
                aggregates,
            } => Op::Group {
                inner: f(inner),
                variables: variables.clone(),
                aggregates: aggregates.clone(),
            },
            Op::Assign { inner, assignments } => Op::Assign {
                inner: f(inner),
                assignments: assignments.clone(),
            },
            Op::Extend { inner, assignments } => Op::Extend {
                inner: f(inner),
                assignments: assignments.clone(),
            },
            Op::Sequence(elements) => Op::Sequence(elements.iter().map(&mut f).collect()),
            Op::Disjunction(elements) => Op::Disjunction(elements.iter().map(&mut f).collect()),
            Op::Label { label, inner } => Op::Label {
                label: label.clone(),
                inner: f(inner),
            },
            Op::Bgp(_)
            | Op::DatasetNames(_)
            | Op::Table(_)
            | Op::Null
            | Op::Path { .. }
            | Op::Ext(_) => self.clone(),
        }
    }

    /// Returns the direct children of this node in evaluation order.
    pub fn children(&self) -> Vec<&Arc<Op>> {
        match self {
            Op::Join { left, right }
            | Op::LeftJoin { left, right, .. }
            | Op::Union { left, right }
            | Op::Diff { left, right }
            | Op::Minus { left, right }
            | Op::Conditional { left, right } => vec![left, right],
            Op::Filter { inner, .. }
            | Op::Graph { inner, .. }
            | Op::Service { inner, .. }
            | Op::List(inner)
            | Op::Order { inner, .. }
            | Op::Project { inner, .. }
            | Op::Distinct(inner)
            | Op::Reduced(inner)
            | Op::Slice { inner, .. }
            | Op::Group { inner, .. }
            | Op::Assign { inner, .. }
            | Op::Extend { inner, .. }
            | Op::Label { inner, .. } => vec![inner],
            Op::Sequence(elements) | Op::Disjunction(elements) => elements.iter().collect(),
            Op::Bgp(_)
            | Op::DatasetNames(_)
            | Op::Table(_)
            | Op::Null
            | Op::Path { .. }
            | Op::Ext(_) => Vec::new(),
        }
    }

    /// Returns the name of the operator as used in the textual representation.
    pub fn name(&self) -> &str {
        match self {
            Op::Bgp(_) => "bgp",
            Op::Join { .. } => "join",
            Op::LeftJoin { .. } => "leftjoin",
            Op::Union { .. } => "union",
            Op::Diff { .. } => "diff",
            Op::Minus { .. } => "minus",
            Op::Filter { .. } => "filter",
            Op::Graph { .. } => "graph",
            Op::Service { .. } => "service",
            Op::DatasetNames(_) => "datasetnames",
            Op::Table(_) => "table",
            Op::Null => "null",
            Op::List(_) => "tolist",
            Op::Order { .. } => "order",
            Op::Project { .. } => "project",
            Op::Distinct(_) => "distinct",
            Op::Reduced(_) => "reduced",
            Op::Slice { .. } => "slice",
            Op::Group { .. } => "group",
            Op::Assign { .. } => "assign",
            Op::Extend { .. } => "extend",
            Op::Path { .. } => "path",
            Op::Sequence(_) => "sequence",
            Op::Disjunction(_) => "disjunction",
            Op::Conditional { .. } => "conditional",
            Op::Label { .. } => "label",
            Op::Ext(ext) => ext.name(),
        }
    }
}

/// An ordered block of triple patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BasicPattern {
    triples: Vec<TriplePattern>,
}

impl BasicPattern {
    pub fn new(triples: impl IntoIterator<Item = TriplePattern>) -> Self {
        Self {
            triples: triples.into_iter().collect(),
        }
    }

    pub fn triples(&self) -> &[TriplePattern] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn push(&mut self, triple: TriplePattern) {
        self.triples.push(triple);
    }

    /// Creates a new pattern that contains the triples of `self` followed by the triples of
    /// `other`.
    pub fn concat(&self, other: &BasicPattern) -> BasicPattern {
        BasicPattern::new(self.triples.iter().chain(other.triples.iter()).cloned())
    }
}

impl<'a> IntoIterator for &'a BasicPattern {
    type Item = &'a TriplePattern;
    type IntoIter = std::slice::Iter<'a, TriplePattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

/// A fixed sequence of solutions, for example from a `VALUES` clause.
#[derive(Debug, Clone)]
pub struct Table {
    variables: Vec<Variable>,
    rows: Arc<[Binding]>,
}

impl Table {
    pub fn new(variables: Vec<Variable>, rows: Vec<Binding>) -> Self {
        Self {
            variables,
            rows: rows.into(),
        }
    }

    /// The join identity: no variables and a single empty solution.
    pub fn unit() -> Self {
        Self::new(Vec::new(), vec![Binding::root()])
    }

    /// A table without any solution.
    pub fn empty(variables: Vec<Variable>) -> Self {
        Self::new(variables, Vec::new())
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The rows of the table. The returned [Arc] can be used by iterators that outlive the
    /// algebra tree.
    pub fn rows(&self) -> &Arc<[Binding]> {
        &self.rows
    }

    pub fn is_unit(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
