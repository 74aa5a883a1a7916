use crate::context::ExecutionContext;
use crate::error::QueryResult;
use crate::iter::join::RightSide;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::{Binding, Variable};
use std::sync::Arc;

/// Removes the left bindings for which `excluded` holds against some right binding.
struct Subtraction {
    left: BoxedQueryIter,
    right: RightSide,
    context: Arc<ExecutionContext>,
    done: bool,
}

impl Subtraction {
    fn new(left: BoxedQueryIter, right: BoxedQueryIter, context: Arc<ExecutionContext>) -> Self {
        Self {
            left,
            right: RightSide::new(right),
            context,
            done: false,
        }
    }

    fn next(
        &mut self,
        excluded: impl Fn(&Binding, &Binding) -> bool,
    ) -> Option<QueryResult<Binding>> {
        if self.done {
            return None;
        }
        let rows = match self.right.rows(&self.context) {
            Ok(rows) => rows,
            Err(error) => {
                self.close();
                return Some(Err(error));
            }
        };
        loop {
            match self.left.next() {
                Some(Ok(left)) => {
                    if !rows.iter().any(|right| excluded(&left, right)) {
                        return Some(Ok(left));
                    }
                }
                Some(Err(error)) => {
                    self.close();
                    return Some(Err(error));
                }
                None => {
                    self.close();
                    return None;
                }
            }
        }
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

/// SPARQL `MINUS`.
///
/// A left binding is removed if some right binding agrees with it on every variable of
/// `shared` that both bind. `shared` holds the variables that can be bound on both sides. If it
/// is empty, every left binding is removed as soon as the right side has a solution.
pub struct MinusIter {
    inner: Subtraction,
    shared: Vec<Variable>,
}

impl MinusIter {
    pub fn new(
        left: BoxedQueryIter,
        right: BoxedQueryIter,
        shared: Vec<Variable>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            inner: Subtraction::new(left, right, context),
            shared,
        }
    }
}

impl Iterator for MinusIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let shared = &self.shared;
        self.inner.next(|left, right| {
            shared
                .iter()
                .all(|variable| match (left.get(variable), right.get(variable)) {
                    (Some(lhs), Some(rhs)) => lhs == rhs,
                    _ => true,
                })
        })
    }
}

impl QueryIterator for MinusIter {
    fn close(&mut self) {
        self.inner.close();
    }
}

/// Removes every left binding that is compatible with some right binding.
pub struct DiffIter {
    inner: Subtraction,
}

impl DiffIter {
    pub fn new(left: BoxedQueryIter, right: BoxedQueryIter, context: Arc<ExecutionContext>) -> Self {
        Self {
            inner: Subtraction::new(left, right, context),
        }
    }
}

impl Iterator for DiffIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next(Binding::is_compatible)
    }
}

impl QueryIterator for DiffIter {
    fn close(&mut self) {
        self.inner.close();
    }
}
