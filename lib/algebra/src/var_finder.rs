use crate::vars::{expression_vars, term_pattern_vars, triple_pattern_vars, VarSet};
use crate::Op;
use rdf_cursor_model::{Expression, NamedNodePattern, Variable};

/// How the variables of an operator tree are used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarUsage {
    /// Variables that are bound by every solution.
    pub fixed: VarSet,
    /// Variables that may be bound, depending on which branch produced a solution.
    pub optional: VarSet,
    /// Variables referenced by a filter expression within the tree.
    pub filter: VarSet,
    /// Variables referenced by the expressions of assignments within the tree.
    pub assign: VarSet,
}

impl VarUsage {
    /// All variables that can appear bound in a solution.
    pub fn visible(&self) -> VarSet {
        self.fixed.union(&self.optional).cloned().collect()
    }

    fn merge(mut self, other: VarUsage) -> Self {
        self.fixed.extend(other.fixed);
        self.optional.extend(other.optional);
        self.filter.extend(other.filter);
        self.assign.extend(other.assign);
        self
    }

    fn restrict(self, variables: &[Variable]) -> Self {
        let keep = |set: VarSet| -> VarSet {
            set.into_iter().filter(|v| variables.contains(v)).collect()
        };
        VarUsage {
            fixed: keep(self.fixed),
            optional: keep(self.optional),
            filter: keep(self.filter),
            assign: keep(self.assign),
        }
    }
}

/// Computes the [VarUsage] of an operator tree bottom-up.
pub struct VarFinder;

impl VarFinder {
    pub fn classify(op: &Op) -> VarUsage {
        match op {
            Op::Bgp(pattern) => {
                let mut usage = VarUsage::default();
                for triple in pattern {
                    triple_pattern_vars(triple, &mut usage.fixed);
                }
                usage
            }
            Op::Join { left, right } => Self::classify(left).merge(Self::classify(right)),
            Op::Sequence(elements) => elements
                .iter()
                .map(|e| Self::classify(e))
                .fold(VarUsage::default(), VarUsage::merge),
            Op::LeftJoin {
                left,
                right,
                expressions,
            } => Self::classify_left_join(left, right, expressions),
            Op::Conditional { left, right } => Self::classify_left_join(left, right, &[]),
            Op::Union { left, right } => {
                // A variable that is fixed in one branch is treated as fixed for the whole union
                // even though the other branch may not bind it.
                Self::classify(left).merge(Self::classify(right))
            }
            Op::Disjunction(elements) => elements
                .iter()
                .map(|e| Self::classify(e))
                .fold(VarUsage::default(), VarUsage::merge),
            Op::Diff { left, .. } | Op::Minus { left, .. } => Self::classify(left),
            Op::Filter { expressions, inner } => {
                let mut usage = Self::classify(inner);
                for expression in expressions {
                    expression_vars(expression, &mut usage.filter);
                }
                usage
            }
            Op::Project { inner, variables } => Self::classify(inner).restrict(variables),
            Op::Assign { inner, assignments } | Op::Extend { inner, assignments } => {
                let mut usage = Self::classify(inner);
                for (variable, expression) in assignments {
                    usage.fixed.insert(variable.clone());
                    expression_vars(expression, &mut usage.assign);
                }
                usage
            }
            Op::Graph { name, inner } => {
                let mut usage = Self::classify(inner);
                if let NamedNodePattern::Variable(variable) = name {
                    usage.fixed.insert(variable.clone());
                }
                usage
            }
            Op::DatasetNames(name) => {
                let mut usage = VarUsage::default();
                if let NamedNodePattern::Variable(variable) = name {
                    usage.fixed.insert(variable.clone());
                }
                usage
            }
            Op::Group {
                variables,
                aggregates,
                ..
            } => VarUsage {
                fixed: variables
                    .iter()
                    .chain(aggregates.iter().map(|(v, _)| v))
                    .cloned()
                    .collect(),
                ..VarUsage::default()
            },
            Op::Path {
                subject, object, ..
            } => {
                let mut usage = VarUsage::default();
                term_pattern_vars(subject, &mut usage.fixed);
                term_pattern_vars(object, &mut usage.fixed);
                usage
            }
            Op::Order { inner, .. }
            | Op::Distinct(inner)
            | Op::Reduced(inner)
            | Op::Slice { inner, .. }
            | Op::List(inner)
            | Op::Label { inner, .. }
            | Op::Service { inner, .. } => Self::classify(inner),
            Op::Ext(ext) => ext
                .effective_op()
                .map(Self::classify)
                .unwrap_or_default(),
            Op::Table(_) | Op::Null => VarUsage::default(),
        }
    }

    fn classify_left_join(left: &Op, right: &Op, expressions: &[Expression]) -> VarUsage {
        let left = Self::classify(left);
        let right = Self::classify(right);

        let mut optional = left.optional;
        optional.extend(right.fixed);
        optional.extend(right.optional);
        optional.retain(|v| !left.fixed.contains(v));

        let mut filter = left.filter;
        filter.extend(right.filter);
        for expression in expressions {
            expression_vars(expression, &mut filter);
        }

        let mut assign = left.assign;
        assign.extend(right.assign);

        VarUsage {
            fixed: left.fixed,
            optional,
            filter,
            assign,
        }
    }
}
