use crate::context::ExecutionContext;
use crate::error::{ExpressionError, QueryResult};
use crate::expr::Expr;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::{Binding, Variable};
use std::sync::Arc;

/// Extends every binding with the values of the given expressions (`BIND`, `Assign`).
///
/// The assignments are evaluated in order and may refer to variables bound by earlier ones. An
/// expression that cannot be evaluated leaves its variable unbound. If the variable is already
/// bound, the binding is kept if the values agree and dropped otherwise.
pub struct AssignIter {
    input: BoxedQueryIter,
    assignments: Vec<(Variable, Expr)>,
    context: Arc<ExecutionContext>,
}

impl AssignIter {
    pub fn new(
        input: BoxedQueryIter,
        assignments: Vec<(Variable, Expr)>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            input,
            assignments,
            context,
        }
    }

    /// Returns [None] if an assignment contradicts an existing value.
    fn assign(&self, mut binding: Binding) -> QueryResult<Option<Binding>> {
        for (variable, expression) in &self.assignments {
            let value = match expression.evaluate(&binding, &self.context) {
                Ok(value) => value,
                Err(ExpressionError::Thin(_)) => continue,
                Err(ExpressionError::Evaluation(error)) => return Err(error),
            };
            match binding.with(variable.clone(), value) {
                Ok(extended) => binding = extended,
                Err(_) => return Ok(None),
            }
        }
        Ok(Some(binding))
    }
}

impl Iterator for AssignIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let binding = match self.input.next()? {
                Ok(binding) => binding,
                Err(error) => return Some(Err(error)),
            };
            match self.assign(binding) {
                Ok(Some(binding)) => return Some(Ok(binding)),
                Ok(None) => {}
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

impl QueryIterator for AssignIter {
    fn close(&mut self) {
        self.input.close();
    }
}
