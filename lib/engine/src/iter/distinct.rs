use crate::context::ExecutionContext;
use crate::error::QueryResult;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Removes all duplicates. The first occurrence of a binding is kept.
pub struct DistinctIter {
    input: BoxedQueryIter,
    seen: FxHashSet<Binding>,
    context: Arc<ExecutionContext>,
}

impl DistinctIter {
    pub fn new(input: BoxedQueryIter, context: Arc<ExecutionContext>) -> Self {
        Self {
            input,
            seen: FxHashSet::default(),
            context,
        }
    }
}

impl Iterator for DistinctIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(error) = self.context.cancellation().check() {
            self.close();
            return Some(Err(error));
        }
        loop {
            let binding = match self.input.next()? {
                Ok(binding) => binding,
                Err(error) => return Some(Err(error)),
            };
            if self.seen.insert(binding.clone()) {
                return Some(Ok(binding));
            }
        }
    }
}

impl QueryIterator for DistinctIter {
    fn close(&mut self) {
        self.seen.clear();
        self.input.close();
    }
}

/// Removes duplicates that directly follow each other.
pub struct ReducedIter {
    input: BoxedQueryIter,
    last: Option<Binding>,
}

impl ReducedIter {
    pub fn new(input: BoxedQueryIter) -> Self {
        Self { input, last: None }
    }
}

impl Iterator for ReducedIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let binding = match self.input.next()? {
                Ok(binding) => binding,
                Err(error) => return Some(Err(error)),
            };
            if self.last.as_ref() != Some(&binding) {
                self.last = Some(binding.clone());
                return Some(Ok(binding));
            }
        }
    }
}

impl QueryIterator for ReducedIter {
    fn close(&mut self) {
        self.last = None;
        self.input.close();
    }
}
