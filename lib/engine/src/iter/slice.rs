use crate::error::QueryResult;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;

/// Skips `start` bindings and produces at most `length` bindings afterward.
pub struct SliceIter {
    input: BoxedQueryIter,
    to_skip: usize,
    remaining: Option<usize>,
}

impl SliceIter {
    pub fn new(input: BoxedQueryIter, start: usize, length: Option<usize>) -> Self {
        Self {
            input,
            to_skip: start,
            remaining: length,
        }
    }
}

impl Iterator for SliceIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            self.close();
            return None;
        }

        while self.to_skip > 0 {
            match self.input.next()? {
                Ok(_) => self.to_skip -= 1,
                Err(error) => return Some(Err(error)),
            }
        }

        let result = self.input.next()?;
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        Some(result)
    }
}

impl QueryIterator for SliceIter {
    fn close(&mut self) {
        self.remaining = Some(0);
        self.input.close();
    }
}
