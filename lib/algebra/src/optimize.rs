use crate::{JoinClassifier, LeftJoinClassifier, Op};
use std::sync::Arc;
use tracing::trace;

/// A rewrite of a single node of the algebra tree. The children of the node have already been
/// rewritten when the rule is applied.
pub trait AlgebraRule: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the rewritten node or [None] if the rule does not apply.
    fn rewrite(&self, op: &Op) -> Option<Op>;
}

/// Rewrites an algebra tree bottom-up with a list of [AlgebraRule]s.
pub struct Optimizer {
    rules: Vec<Arc<dyn AlgebraRule>>,
}

impl Optimizer {
    /// Creates an optimizer with the default rules. If `linearize` is set, joins and left joins
    /// that can be evaluated by substitution are rewritten into sequences and conditionals.
    pub fn new(linearize: bool) -> Self {
        let mut rules: Vec<Arc<dyn AlgebraRule>> = vec![
            Arc::new(MergeFiltersRule),
            Arc::new(MergeBasicPatternsRule),
            Arc::new(RemoveUnitTableRule),
        ];
        if linearize {
            rules.push(Arc::new(JoinStrategyRule));
        }
        Self { rules }
    }

    pub fn with_rules(rules: Vec<Arc<dyn AlgebraRule>>) -> Self {
        Self { rules }
    }

    pub fn optimize(&self, op: &Op) -> Op {
        let op = op.map_children(|child| Arc::new(self.optimize(child)));
        self.rules.iter().fold(op, |op, rule| match rule.rewrite(&op) {
            Some(rewritten) => {
                trace!(rule = rule.name(), "Applied rule");
                rewritten
            }
            None => op,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Merges directly nested filters and removes filters without expressions.
struct MergeFiltersRule;

impl AlgebraRule for MergeFiltersRule {
    fn name(&self) -> &str {
        "merge_filters"
    }

    fn rewrite(&self, op: &Op) -> Option<Op> {
        let Op::Filter { expressions, inner } = op else {
            return None;
        };

        if expressions.is_empty() {
            return Some(inner.as_ref().clone());
        }

        match inner.as_ref() {
            Op::Filter { .. } => Some(Op::filter(expressions.clone(), Arc::clone(inner))),
            _ => None,
        }
    }
}

/// Joins of two basic patterns are evaluated as a single basic pattern.
struct MergeBasicPatternsRule;

impl AlgebraRule for MergeBasicPatternsRule {
    fn name(&self) -> &str {
        "merge_basic_patterns"
    }

    fn rewrite(&self, op: &Op) -> Option<Op> {
        let Op::Join { left, right } = op else {
            return None;
        };
        match (left.as_ref(), right.as_ref()) {
            (Op::Bgp(left), Op::Bgp(right)) => Some(Op::Bgp(left.concat(right))),
            _ => None,
        }
    }
}

/// The unit table is the identity of the join.
struct RemoveUnitTableRule;

impl AlgebraRule for RemoveUnitTableRule {
    fn name(&self) -> &str {
        "remove_unit_table"
    }

    fn rewrite(&self, op: &Op) -> Option<Op> {
        let Op::Join { left, right } = op else {
            return None;
        };
        if left.is_unit_table() {
            Some(right.as_ref().clone())
        } else if right.is_unit_table() {
            Some(left.as_ref().clone())
        } else {
            None
        }
    }
}

/// Rewrites joins and left joins that can be evaluated by substitution into [Op::Sequence] and
/// [Op::Conditional].
struct JoinStrategyRule;

impl AlgebraRule for JoinStrategyRule {
    fn name(&self) -> &str {
        "join_strategy"
    }

    fn rewrite(&self, op: &Op) -> Option<Op> {
        match op {
            Op::Join { left, right } if JoinClassifier::is_linear(left, right) => {
                let mut elements = Vec::new();
                push_sequence_element(&mut elements, left);
                push_sequence_element(&mut elements, right);
                Some(Op::Sequence(elements))
            }
            Op::LeftJoin {
                left,
                right,
                expressions,
            } if LeftJoinClassifier::is_linear(left, right) => {
                let right = if expressions.is_empty() {
                    Arc::clone(right)
                } else {
                    Arc::new(Op::filter(expressions.clone(), Arc::clone(right)))
                };
                Some(Op::Conditional {
                    left: Arc::clone(left),
                    right,
                })
            }
            _ => None,
        }
    }
}

fn push_sequence_element(elements: &mut Vec<Arc<Op>>, op: &Arc<Op>) {
    match op.as_ref() {
        Op::Sequence(inner) => elements.extend(inner.iter().cloned()),
        _ => elements.push(Arc::clone(op)),
    }
}
