use crate::var_finder::VarFinder;
use crate::vars::VarSet;
use crate::Op;
use tracing::debug;

/// Decides whether a join can be evaluated by substituting each solution of the left side into
/// the right side.
pub struct JoinClassifier;

impl JoinClassifier {
    pub fn is_linear(left: &Op, right: &Op) -> bool {
        let left = left.effective();
        let right = right.effective();

        if let Some(modifier) = streamed_modifier(right) {
            debug!(
                right = right.name(),
                modifier = modifier.name(),
                "Join is not linear: right side modifies its input sequence"
            );
            return false;
        }

        let left_usage = VarFinder::classify(left);
        let right_usage = VarFinder::classify(right);

        let left_optional = difference(&left_usage.optional, &left_usage.fixed);
        let right_optional = difference(&right_usage.optional, &right_usage.fixed);
        let right_filter = difference(&right_usage.filter, &right_usage.fixed);
        let right_assign = difference(&right_usage.assign, &right_usage.fixed);

        // An optional variable on the right would be bound by the left before the right side had
        // the chance to leave it unbound.
        let bad_optional_fixed = intersects(&right_optional, &left_usage.fixed);
        let bad_optional_optional = intersects(&right_optional, &left_optional);
        let bad_filter = intersects(&right_filter, &left_usage.fixed);
        let bad_assign = intersects(&right_assign, &left_usage.fixed);

        let linear = !(bad_optional_fixed || bad_optional_optional || bad_filter || bad_assign);
        debug!(
            linear,
            bad_optional_fixed, bad_optional_optional, bad_filter, bad_assign, "Classified join"
        );
        linear
    }
}

/// Decides whether a left join can be evaluated by substituting each solution of the left side
/// into the right side.
pub struct LeftJoinClassifier;

impl LeftJoinClassifier {
    pub fn is_linear(left: &Op, right: &Op) -> bool {
        let right = right.effective();
        if let Some(modifier) = streamed_modifier(right) {
            debug!(
                right = right.name(),
                modifier = modifier.name(),
                "Left join is not linear: right side modifies its input sequence"
            );
            return false;
        }

        let non_linear_vars = Self::non_linear_vars(left, right);
        debug!(linear = non_linear_vars.is_empty(), "Classified left join");
        non_linear_vars.is_empty()
    }

    /// Returns the variables of the left side that prevent a linear evaluation: variables that
    /// the right side binds optionally or that are mentioned by its filters or assignments.
    pub fn non_linear_vars(left: &Op, right: &Op) -> VarSet {
        let left_usage = VarFinder::classify(left.effective());
        let right_usage = VarFinder::classify(right.effective());
        let left_vars = left_usage.visible();

        left_vars
            .into_iter()
            .filter(|v| {
                right_usage.optional.contains(v)
                    || right_usage.filter.contains(v)
                    || right_usage.assign.contains(v)
            })
            .collect()
    }
}

/// Returns the first operator that would be applied to the whole sequence of input solutions if
/// `op` was evaluated with the solutions of a left side as input.
///
/// Filters, assignments and graphs pass their input on to their inner operator. Joins and left
/// joins pass it on to their left side, sequences to every element.
fn streamed_modifier(op: &Op) -> Option<&Op> {
    let op = op.effective();
    if op.is_solution_modifier() || matches!(op, Op::Diff { .. } | Op::Minus { .. }) {
        return Some(op);
    }
    match op {
        Op::Filter { inner, .. }
        | Op::Assign { inner, .. }
        | Op::Extend { inner, .. }
        | Op::Graph { inner, .. } => streamed_modifier(inner),
        Op::Join { left, .. } | Op::LeftJoin { left, .. } | Op::Conditional { left, .. } => {
            streamed_modifier(left)
        }
        Op::Sequence(elements) => elements.iter().find_map(|element| streamed_modifier(element)),
        _ => None,
    }
}

fn difference(lhs: &VarSet, rhs: &VarSet) -> VarSet {
    lhs.difference(rhs).cloned().collect()
}

fn intersects(lhs: &VarSet, rhs: &VarSet) -> bool {
    !lhs.is_disjoint(rhs)
}
