use crate::context::ExecutionContext;
use crate::error::{ExpressionError, QueryResult};
use crate::expr::Expr;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;
use std::sync::Arc;

/// Keeps the bindings for which the expression evaluates to `true`.
///
/// An expression that cannot be evaluated for a binding (e.g., a type error or an unbound
/// variable) removes the binding. Fatal errors are propagated.
pub struct FilterIter {
    input: BoxedQueryIter,
    expression: Expr,
    context: Arc<ExecutionContext>,
}

impl FilterIter {
    pub fn new(input: BoxedQueryIter, expression: Expr, context: Arc<ExecutionContext>) -> Self {
        Self {
            input,
            expression,
            context,
        }
    }
}

impl Iterator for FilterIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let binding = match self.input.next()? {
                Ok(binding) => binding,
                Err(error) => return Some(Err(error)),
            };
            match self
                .expression
                .effective_boolean_value(&binding, &self.context)
            {
                Ok(true) => return Some(Ok(binding)),
                Ok(false) | Err(ExpressionError::Thin(_)) => {}
                Err(ExpressionError::Evaluation(error)) => return Some(Err(error)),
            }
        }
    }
}

impl QueryIterator for FilterIter {
    fn close(&mut self) {
        self.input.close();
    }
}
