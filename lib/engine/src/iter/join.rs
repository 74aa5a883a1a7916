use crate::context::ExecutionContext;
use crate::error::{ExpressionError, QueryEvaluationError, QueryResult};
use crate::expr::Expr;
use crate::iter::{materialize, BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;
use std::collections::VecDeque;
use std::sync::Arc;

/// The right side of a join that is materialized on the first pull.
pub(crate) enum RightSide {
    Pending(BoxedQueryIter),
    Materialized(Arc<[Binding]>),
    Closed,
}

impl RightSide {
    pub(crate) fn new(iter: BoxedQueryIter) -> Self {
        RightSide::Pending(iter)
    }

    pub(crate) fn rows(&mut self, context: &ExecutionContext) -> QueryResult<Arc<[Binding]>> {
        match std::mem::replace(self, RightSide::Closed) {
            RightSide::Materialized(rows) => {
                *self = RightSide::Materialized(Arc::clone(&rows));
                Ok(rows)
            }
            RightSide::Closed => Ok(Arc::from(Vec::new())),
            RightSide::Pending(mut iter) => {
                if let Err(error) = context.cancellation().check() {
                    iter.close();
                    return Err(error);
                }
                let rows: Arc<[Binding]> = materialize(iter)?.into();
                *self = RightSide::Materialized(Arc::clone(&rows));
                Ok(rows)
            }
        }
    }

    pub(crate) fn close(&mut self) {
        if let RightSide::Pending(mut iter) = std::mem::replace(self, RightSide::Closed) {
            iter.close();
        }
    }
}

/// State shared by [JoinIter] and [LeftJoinIter].
struct JoinState {
    left: BoxedQueryIter,
    right: RightSide,
    pending: VecDeque<Binding>,
    context: Arc<ExecutionContext>,
    done: bool,
}

impl JoinState {
    fn new(left: BoxedQueryIter, right: BoxedQueryIter, context: Arc<ExecutionContext>) -> Self {
        Self {
            left,
            right: RightSide::new(right),
            pending: VecDeque::new(),
            context,
            done: false,
        }
    }

    /// Produces the next binding. `expand` computes the output bindings of one left binding.
    fn next(
        &mut self,
        mut expand: impl FnMut(&Binding, &[Binding], &Arc<ExecutionContext>) -> QueryResult<Vec<Binding>>,
    ) -> Option<QueryResult<Binding>> {
        loop {
            if let Some(binding) = self.pending.pop_front() {
                return Some(Ok(binding));
            }
            if self.done {
                return None;
            }

            let rows = match self.right.rows(&self.context) {
                Ok(rows) => rows,
                Err(error) => return Some(self.fail(error)),
            };
            match self.left.next() {
                Some(Ok(left)) => match expand(&left, &rows[..], &self.context) {
                    Ok(results) => self.pending.extend(results),
                    Err(error) => return Some(self.fail(error)),
                },
                Some(Err(error)) => return Some(self.fail(error)),
                None => {
                    self.close();
                    return None;
                }
            }
        }
    }

    fn fail(&mut self, error: QueryEvaluationError) -> QueryResult<Binding> {
        self.close();
        Err(error)
    }

    fn close(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.left.close();
        self.right.close();
    }
}

/// A join of two independently evaluated inputs.
///
/// The right input is materialized, the left one is streamed. For every left binding, the
/// compatible right bindings are produced in their original order.
pub struct JoinIter {
    state: JoinState,
}

impl JoinIter {
    pub fn new(left: BoxedQueryIter, right: BoxedQueryIter, context: Arc<ExecutionContext>) -> Self {
        Self {
            state: JoinState::new(left, right, context),
        }
    }
}

impl Iterator for JoinIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next(|left, rows, _| {
            Ok(rows.iter().filter_map(|right| left.merge(right)).collect())
        })
    }
}

impl QueryIterator for JoinIter {
    fn close(&mut self) {
        self.state.close();
    }
}

/// A left join of two independently evaluated inputs.
///
/// Every left binding is produced once per compatible right binding that satisfies all `guards`.
/// If there is no such right binding, the left binding is produced unchanged.
pub struct LeftJoinIter {
    state: JoinState,
    guards: Vec<Expr>,
}

impl LeftJoinIter {
    pub fn new(
        left: BoxedQueryIter,
        right: BoxedQueryIter,
        guards: Vec<Expr>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            state: JoinState::new(left, right, context),
            guards,
        }
    }
}

impl Iterator for LeftJoinIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let guards = &self.guards;
        self.state.next(|left, rows, context| {
            let mut results = Vec::new();
            for right in rows {
                let Some(merged) = left.merge(right) else {
                    continue;
                };
                if satisfies_guards(guards, &merged, context)? {
                    results.push(merged);
                }
            }
            if results.is_empty() {
                results.push(left.clone());
            }
            Ok(results)
        })
    }
}

impl QueryIterator for LeftJoinIter {
    fn close(&mut self) {
        self.state.close();
    }
}

/// Evaluates the guard expressions of an optional pattern. An expression that cannot be
/// evaluated counts as `false`.
pub(crate) fn satisfies_guards(
    guards: &[Expr],
    binding: &Binding,
    context: &Arc<ExecutionContext>,
) -> QueryResult<bool> {
    for guard in guards {
        match guard.effective_boolean_value(binding, context) {
            Ok(true) => {}
            Ok(false) | Err(ExpressionError::Thin(_)) => return Ok(false),
            Err(ExpressionError::Evaluation(error)) => return Err(error),
        }
    }
    Ok(true)
}
