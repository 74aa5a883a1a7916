//! Pushes filter expressions as far down into basic patterns and sequences as possible.
//!
//! A filter is placed directly after the first triple pattern (or sequence element) after which
//! all of its variables are bound. Filters that become ready at the same point keep their
//! original order. Filters that never become ready are applied to the final result.

use rdf_cursor_algebra::{
    expression_vars, triple_pattern_vars, BasicPattern, Op, VarFinder, VarSet,
};
use rdf_cursor_model::Expression;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

/// The result of placing filters: a sequence of steps, each evaluated with the output of the
/// previous step as input, followed by the filters that could not be placed.
#[derive(Debug, Clone)]
pub struct Placement {
    steps: Vec<PlacedStep>,
    unplaced: Vec<Expression>,
}

/// An operator and the filters that are applied directly to its output.
#[derive(Debug, Clone)]
pub struct PlacedStep {
    pub op: Arc<Op>,
    pub filters: Vec<Expression>,
}

impl Placement {
    pub fn steps(&self) -> &[PlacedStep] {
        &self.steps
    }

    pub fn unplaced(&self) -> &[Expression] {
        &self.unplaced
    }

    /// Returns an equivalent algebra tree.
    pub fn to_op(&self) -> Op {
        let mut elements = self
            .steps
            .iter()
            .map(|step| {
                if step.filters.is_empty() {
                    Arc::clone(&step.op)
                } else {
                    Arc::new(Op::filter(step.filters.clone(), Arc::clone(&step.op)))
                }
            })
            .collect::<Vec<_>>();
        let op = match elements.len() {
            1 => elements.remove(0),
            _ => Arc::new(Op::Sequence(elements)),
        };
        if self.unplaced.is_empty() {
            op.as_ref().clone()
        } else {
            Op::filter(self.unplaced.clone(), op)
        }
    }
}

impl Display for Placement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_op())
    }
}

/// Decides where the filters of a `FILTER` operator are evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPlacement {
    safe: bool,
}

struct PendingFilter {
    expression: Expression,
    vars: VarSet,
}

/// The state of one placement pass.
struct Placer {
    scope: VarSet,
    pending: Vec<PendingFilter>,
    steps: Vec<PlacedStep>,
}

impl FilterPlacement {
    /// Creates a new placement. In safe mode, basic patterns are never split and filters are only
    /// placed around whole sequence elements.
    pub fn new(safe: bool) -> Self {
        Self { safe }
    }

    /// Places `expressions` into `pattern`.
    pub fn place_bgp(&self, expressions: &[Expression], pattern: &BasicPattern) -> Placement {
        let mut placer = Placer::new(expressions);
        if self.safe {
            placer.push_element(Arc::new(Op::Bgp(pattern.clone())), pattern_vars(pattern));
        } else {
            placer.push_pattern(pattern);
        }
        placer.finish()
    }

    /// Places `expressions` into a sequence of operators. Basic patterns among the elements are
    /// split like in [FilterPlacement::place_bgp].
    pub fn place_sequence(&self, expressions: &[Expression], elements: &[Arc<Op>]) -> Placement {
        let mut placer = Placer::new(expressions);
        for element in elements {
            match element.as_ref() {
                Op::Bgp(pattern) if !self.safe => placer.push_pattern(pattern),
                _ => {
                    let fixed = VarFinder::classify(element).fixed;
                    placer.push_element(Arc::clone(element), fixed);
                }
            }
        }
        placer.finish()
    }

    /// Applies all `expressions` to the output of `op`.
    pub fn build_filter(expressions: &[Expression], op: Arc<Op>) -> Placement {
        Placement {
            steps: vec![PlacedStep {
                op,
                filters: expressions.to_vec(),
            }],
            unplaced: Vec::new(),
        }
    }
}

impl Placer {
    fn new(expressions: &[Expression]) -> Self {
        let pending = expressions
            .iter()
            .map(|expression| {
                let mut vars = VarSet::default();
                expression_vars(expression, &mut vars);
                PendingFilter {
                    expression: expression.clone(),
                    vars,
                }
            })
            .collect();
        Self {
            scope: VarSet::default(),
            pending,
            steps: Vec::new(),
        }
    }

    fn push_pattern(&mut self, pattern: &BasicPattern) {
        let mut current = BasicPattern::default();
        for triple in pattern {
            current.push(triple.clone());
            triple_pattern_vars(triple, &mut self.scope);

            let ready = self.take_ready();
            if !ready.is_empty() {
                debug!(
                    triples = current.len(),
                    filters = ready.len(),
                    "Placed filters inside basic pattern"
                );
                let op = Op::Bgp(std::mem::take(&mut current));
                self.steps.push(PlacedStep {
                    op: Arc::new(op),
                    filters: ready,
                });
            }
        }

        if !current.is_empty() {
            self.steps.push(PlacedStep {
                op: Arc::new(Op::Bgp(current)),
                filters: Vec::new(),
            });
        }
    }

    fn push_element(&mut self, op: Arc<Op>, vars: VarSet) {
        self.scope.extend(vars);
        let filters = self.take_ready();
        self.steps.push(PlacedStep { op, filters });
    }

    /// Removes the pending filters whose variables are in scope, keeping their order.
    fn take_ready(&mut self) -> Vec<Expression> {
        let (ready, pending) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition::<Vec<_>, _>(|filter| filter.vars.is_subset(&self.scope));
        self.pending = pending;
        ready.into_iter().map(|filter| filter.expression).collect()
    }

    fn finish(self) -> Placement {
        let mut steps = self.steps;
        if steps.is_empty() {
            steps.push(PlacedStep {
                op: Arc::new(Op::Bgp(BasicPattern::default())),
                filters: Vec::new(),
            });
        }
        Placement {
            steps,
            unplaced: self
                .pending
                .into_iter()
                .map(|filter| filter.expression)
                .collect(),
        }
    }
}

fn pattern_vars(pattern: &BasicPattern) -> VarSet {
    let mut vars = VarSet::default();
    for triple in pattern {
        triple_pattern_vars(triple, &mut vars);
    }
    vars
}
