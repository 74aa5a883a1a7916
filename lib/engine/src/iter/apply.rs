use crate::error::{QueryEvaluationError, QueryResult};
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;
use std::collections::VecDeque;

/// For every binding of the input, creates a new iterator with `apply` and produces its
/// bindings. The bindings of one input binding are produced contiguously.
pub struct RepeatApplyIter<F> {
    input: BoxedQueryIter,
    apply: F,
    current: Option<BoxedQueryIter>,
    done: bool,
}

impl<F> RepeatApplyIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    pub fn new(input: BoxedQueryIter, apply: F) -> Self {
        Self {
            input,
            apply,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, error: QueryEvaluationError) -> Option<QueryResult<Binding>> {
        self.close();
        Some(Err(error))
    }
}

impl<F> Iterator for RepeatApplyIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some(current) = &mut self.current {
                match current.next() {
                    Some(Ok(binding)) => return Some(Ok(binding)),
                    Some(Err(error)) => return self.fail(error),
                    None => {
                        current.close();
                        self.current = None;
                    }
                }
            }

            match self.input.next() {
                Some(Ok(binding)) => match (self.apply)(binding) {
                    Ok(iter) => self.current = Some(iter),
                    Err(error) => return self.fail(error),
                },
                Some(Err(error)) => return self.fail(error),
                None => {
                    self.close();
                    return None;
                }
            }
        }
    }
}

impl<F> QueryIterator for RepeatApplyIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    fn close(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Some(mut current) = self.current.take() {
            current.close();
        }
        self.input.close();
    }
}

/// Produces the bindings of several iterators, one after the other.
pub struct ConcatIter {
    iterators: VecDeque<BoxedQueryIter>,
}

impl ConcatIter {
    pub fn new(iterators: impl IntoIterator<Item = BoxedQueryIter>) -> Self {
        Self {
            iterators: iterators.into_iter().collect(),
        }
    }
}

impl Iterator for ConcatIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.iterators.front_mut()?;
            match current.next() {
                Some(Ok(binding)) => return Some(Ok(binding)),
                Some(Err(error)) => {
                    self.close();
                    return Some(Err(error));
                }
                None => {
                    if let Some(mut exhausted) = self.iterators.pop_front() {
                        exhausted.close();
                    }
                }
            }
        }
    }
}

impl QueryIterator for ConcatIter {
    fn close(&mut self) {
        for mut iter in self.iterators.drain(..) {
            iter.close();
        }
    }
}
