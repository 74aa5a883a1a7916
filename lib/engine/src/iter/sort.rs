use crate::context::ExecutionContext;
use crate::error::{ExpressionError, QueryResult};
use crate::expr::{order_cmp, Expr};
use crate::iter::{materialize, BoxedQueryIter, QueryIterator};
use rdf_cursor_model::{Binding, Term};
use std::cmp::Ordering;
use std::sync::Arc;

/// An `ORDER BY` condition.
#[derive(Debug, Clone)]
pub struct SortCondition {
    pub expression: Expr,
    pub ascending: bool,
}

/// Materializes its input and produces it sorted by the conditions.
///
/// The sort is stable: bindings with equal keys keep their input order. A key that cannot be
/// evaluated sorts like an unbound value.
pub struct SortIter {
    input: Option<BoxedQueryIter>,
    conditions: Vec<SortCondition>,
    context: Arc<ExecutionContext>,
    sorted: std::vec::IntoIter<Binding>,
}

impl SortIter {
    pub fn new(
        input: BoxedQueryIter,
        conditions: Vec<SortCondition>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            input: Some(input),
            conditions,
            context,
            sorted: Vec::new().into_iter(),
        }
    }

    fn sort(&self, mut input: BoxedQueryIter) -> QueryResult<Vec<Binding>> {
        if let Err(error) = self.context.cancellation().check() {
            input.close();
            return Err(error);
        }
        let bindings = materialize(input)?;
        self.context.cancellation().check()?;

        let mut keyed = bindings
            .into_iter()
            .map(|binding| Ok((self.keys(&binding)?, binding)))
            .collect::<QueryResult<Vec<_>>>()?;
        keyed.sort_by(|(lhs, _), (rhs, _)| self.compare(lhs, rhs));
        Ok(keyed.into_iter().map(|(_, binding)| binding).collect())
    }

    fn keys(&self, binding: &Binding) -> QueryResult<Vec<Option<Term>>> {
        self.conditions
            .iter()
            .map(
                |condition| match condition.expression.evaluate(binding, &self.context) {
                    Ok(term) => Ok(Some(term)),
                    Err(ExpressionError::Thin(_)) => Ok(None),
                    Err(ExpressionError::Evaluation(error)) => Err(error),
                },
            )
            .collect()
    }

    fn compare(&self, lhs: &[Option<Term>], rhs: &[Option<Term>]) -> Ordering {
        for ((condition, lhs), rhs) in self.conditions.iter().zip(lhs).zip(rhs) {
            let ordering = order_cmp(lhs.as_ref(), rhs.as_ref());
            let ordering = if condition.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl Iterator for SortIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(input) = self.input.take() {
            match self.sort(input) {
                Ok(sorted) => self.sorted = sorted.into_iter(),
                Err(error) => return Some(Err(error)),
            }
        }
        self.sorted.next().map(Ok)
    }
}

impl QueryIterator for SortIter {
    fn close(&mut self) {
        if let Some(mut input) = self.input.take() {
            input.close();
        }
        self.sorted = Vec::new().into_iter();
    }
}
